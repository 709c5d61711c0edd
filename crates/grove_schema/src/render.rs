//! Deterministic rendering of schema fragments to definition text.
//!
//! Rendering is a pure function of the fragment value: no ambient ordering,
//! no caching, so calling it twice on the same fragment yields byte-identical
//! text. The output is handed to the outer execution engine and reused in
//! conflict diagnostics.

use crate::fragment::{
    EnumType, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType, ObjectType,
    ScalarType, SchemaFragment, SchemaType, UnionType,
};

const INDENT: &str = "  ";

/// Renders a whole fragment, types separated by blank lines.
pub fn render_fragment(fragment: &SchemaFragment) -> String {
    let rendered: Vec<String> = fragment.types().iter().map(render_type).collect();
    rendered.join("\n")
}

/// Renders a single type definition.
pub fn render_type(ty: &SchemaType) -> String {
    match ty {
        SchemaType::Object(t) => render_object(t),
        SchemaType::Interface(t) => render_interface(t),
        SchemaType::Scalar(t) => render_scalar(t),
        SchemaType::Enum(t) => render_enum(t),
        SchemaType::Union(t) => render_union(t),
        SchemaType::InputObject(t) => render_input_object(t),
    }
}

fn render_object(ty: &ObjectType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");

    if ty.is_extension {
        out.push_str("extend ");
    }
    out.push_str("type ");
    out.push_str(&ty.name);
    push_implements(&mut out, &ty.interfaces);
    push_field_block(&mut out, &ty.fields);
    out
}

fn render_interface(ty: &InterfaceType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");

    out.push_str("interface ");
    out.push_str(&ty.name);
    push_implements(&mut out, &ty.interfaces);
    push_field_block(&mut out, &ty.fields);
    out
}

fn render_scalar(ty: &ScalarType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");
    out.push_str("scalar ");
    out.push_str(&ty.name);
    out.push('\n');
    out
}

fn render_enum(ty: &EnumType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");
    out.push_str("enum ");
    out.push_str(&ty.name);

    if ty.values.is_empty() {
        out.push('\n');
        return out;
    }

    out.push_str(" {\n");
    for value in &ty.values {
        push_description(&mut out, value.description.as_deref(), INDENT);
        out.push_str(INDENT);
        out.push_str(&value.name);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn render_union(ty: &UnionType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");
    out.push_str("union ");
    out.push_str(&ty.name);
    if !ty.members.is_empty() {
        out.push_str(" = ");
        out.push_str(&ty.members.join(" | "));
    }
    out.push('\n');
    out
}

fn render_input_object(ty: &InputObjectType) -> String {
    let mut out = String::new();
    push_description(&mut out, ty.description.as_deref(), "");
    out.push_str("input ");
    out.push_str(&ty.name);

    if ty.fields.is_empty() {
        out.push('\n');
        return out;
    }

    out.push_str(" {\n");
    for field in &ty.fields {
        push_description(&mut out, field.description.as_deref(), INDENT);
        out.push_str(INDENT);
        out.push_str(&render_input_value(field));
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn push_implements(out: &mut String, interfaces: &[String]) {
    if !interfaces.is_empty() {
        out.push_str(" implements ");
        out.push_str(&interfaces.join(" & "));
    }
}

fn push_field_block(out: &mut String, fields: &[FieldDefinition]) {
    if fields.is_empty() {
        out.push('\n');
        return;
    }

    out.push_str(" {\n");
    for field in fields {
        push_description(out, field.description.as_deref(), INDENT);
        out.push_str(INDENT);
        out.push_str(&field.name);
        push_arguments(out, &field.arguments);
        out.push_str(": ");
        out.push_str(&field.ty.to_string());
        out.push('\n');
    }
    out.push_str("}\n");
}

fn push_arguments(out: &mut String, arguments: &[InputValueDefinition]) {
    if arguments.is_empty() {
        return;
    }

    let rendered: Vec<String> = arguments.iter().map(render_input_value).collect();
    out.push('(');
    out.push_str(&rendered.join(", "));
    out.push(')');
}

fn render_input_value(value: &InputValueDefinition) -> String {
    let mut out = format!("{}: {}", value.name, value.ty);
    if let Some(default) = &value.default_value {
        out.push_str(" = ");
        out.push_str(default);
    }
    out
}

/// Appends a description, quoted single-line or triple-quoted block.
///
/// Block lines are stripped of their incoming indentation and re-indented
/// at the target level.
fn push_description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };

    if description.contains('\n') {
        out.push_str(indent);
        out.push_str("\"\"\"\n");
        for line in description.lines() {
            out.push_str(indent);
            out.push_str(line.trim());
            out.push('\n');
        }
        out.push_str(indent);
        out.push_str("\"\"\"\n");
    } else {
        out.push_str(indent);
        out.push('"');
        out.push_str(&escape_string(description));
        out.push_str("\"\n");
    }
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{EnumValue, TypeRef};

    fn widget_type() -> SchemaType {
        SchemaType::Object(ObjectType {
            name: "Widget".into(),
            description: Some("A widget".into()),
            interfaces: vec!["Node".into()],
            fields: vec![
                FieldDefinition::new("id", TypeRef::named("ID").non_null())
                    .with_description("The id"),
                FieldDefinition::new("name", TypeRef::named("String")),
            ],
            is_extension: false,
        })
    }

    #[test]
    fn test_object_rendering() {
        let rendered = render_type(&widget_type());
        assert_eq!(
            rendered,
            "\"A widget\"\ntype Widget implements Node {\n  \"The id\"\n  id: ID!\n  name: String\n}\n"
        );
    }

    #[test]
    fn test_extend_prefix() {
        let rendered = render_type(&SchemaType::Object(ObjectType {
            name: "Query".into(),
            description: None,
            interfaces: Vec::new(),
            fields: vec![FieldDefinition::new(
                "widgetCount",
                TypeRef::named("Int").non_null(),
            )],
            is_extension: true,
        }));
        assert_eq!(rendered, "extend type Query {\n  widgetCount: Int!\n}\n");
    }

    #[test]
    fn test_field_arguments_with_default() {
        let field = FieldDefinition::new("widgets", TypeRef::named("Widget").non_null().list())
            .with_argument(InputValueDefinition::new(
                "after",
                TypeRef::named("String"),
            ))
            .with_argument(
                InputValueDefinition::new("limit", TypeRef::named("Int")).with_default("10"),
            );

        let rendered = render_type(&SchemaType::Object(ObjectType {
            name: "Query".into(),
            description: None,
            interfaces: Vec::new(),
            fields: vec![field],
            is_extension: true,
        }));
        assert!(rendered.contains("widgets(after: String, limit: Int = 10): [Widget!]"));
    }

    #[test]
    fn test_single_line_description_escaping() {
        let rendered = render_type(&SchemaType::Scalar(ScalarType {
            name: "Sha".into(),
            description: Some("A \"raw\" object id".into()),
        }));
        assert_eq!(rendered, "\"A \\\"raw\\\" object id\"\nscalar Sha\n");
    }

    #[test]
    fn test_multi_line_description_block() {
        let rendered = render_type(&SchemaType::Scalar(ScalarType {
            name: "Sha".into(),
            description: Some("A git object id.\n  Always 40 hex chars.".into()),
        }));
        assert_eq!(
            rendered,
            "\"\"\"\nA git object id.\nAlways 40 hex chars.\n\"\"\"\nscalar Sha\n"
        );
    }

    #[test]
    fn test_enum_union_input_rendering() {
        let fragment = SchemaFragment::new(vec![
            SchemaType::Enum(EnumType {
                name: "IssueState".into(),
                description: None,
                values: vec![
                    EnumValue::new("OPEN").with_description("Still active"),
                    EnumValue::new("CLOSED"),
                ],
            }),
            SchemaType::Union(UnionType {
                name: "Item".into(),
                description: None,
                members: vec!["Issue".into(), "PullRequest".into()],
            }),
            SchemaType::InputObject(InputObjectType {
                name: "IssueFilter".into(),
                description: None,
                fields: vec![InputValueDefinition::new("state", TypeRef::named("IssueState"))],
            }),
        ]);

        let rendered = fragment.render();
        assert!(rendered.contains("enum IssueState {\n  \"Still active\"\n  OPEN\n  CLOSED\n}\n"));
        assert!(rendered.contains("union Item = Issue | PullRequest\n"));
        assert!(rendered.contains("input IssueFilter {\n  state: IssueState\n}\n"));
    }

    #[test]
    fn test_interface_rendering() {
        let rendered = render_type(&SchemaType::Interface(InterfaceType {
            name: "Node".into(),
            description: None,
            interfaces: Vec::new(),
            fields: vec![FieldDefinition::new("id", TypeRef::named("ID").non_null())],
        }));
        assert_eq!(rendered, "interface Node {\n  id: ID!\n}\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let fragment = SchemaFragment::new(vec![widget_type()]);
        let first = fragment.render();
        let second = fragment.render();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_fragment_renders_empty() {
        assert_eq!(SchemaFragment::default().render(), "");
    }
}
