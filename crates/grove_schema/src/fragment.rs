//! Schema fragment definition for grove extensions.

use serde::{Deserialize, Serialize};

/// A wrapping modifier on a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeModifier {
    /// Wraps the preceding rendering in a list (`[T]`).
    List,
    /// Marks the preceding rendering non-nullable (`T!`).
    NonNull,
}

/// A reference to a named type plus wrapping modifiers.
///
/// Modifiers apply in list order, each wrapping the previous rendering,
/// base type first: `root="String", modifiers=[NonNull, List]` is
/// `[String!]`, while `modifiers=[List, NonNull]` is `[String]!`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// The root type name.
    pub root: String,
    /// Modifiers applied left-to-right.
    pub modifiers: Vec<TypeModifier>,
}

impl TypeRef {
    /// Creates a bare reference to a named type.
    pub fn named(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            modifiers: Vec::new(),
        }
    }

    /// Marks the current rendering non-nullable.
    pub fn non_null(mut self) -> Self {
        self.modifiers.push(TypeModifier::NonNull);
        self
    }

    /// Wraps the current rendering in a list.
    pub fn list(mut self) -> Self {
        self.modifiers.push(TypeModifier::List);
        self
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rendered = self.root.clone();
        for modifier in &self.modifiers {
            rendered = match modifier {
                TypeModifier::List => format!("[{rendered}]"),
                TypeModifier::NonNull => format!("{rendered}!"),
            };
        }
        write!(f, "{rendered}")
    }
}

/// An input value: a field argument or an input object field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValueDefinition {
    /// The input value name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// The value type.
    pub ty: TypeRef,
    /// Optional default value, as a schema-language literal.
    pub default_value: Option<String>,
}

impl InputValueDefinition {
    /// Creates a new input value.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value literal.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// A field on an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// The field name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// The field's return type.
    pub ty: TypeRef,
    /// Ordered argument list.
    pub arguments: Vec<InputValueDefinition>,
}

impl FieldDefinition {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends an argument.
    pub fn with_argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// An enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// The value name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

impl EnumValue {
    /// Creates a new enum value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Object type definition.
///
/// `is_extension` marks an `extend type` contribution; it is required on
/// the root types (`Query`, `Mutation`, `Subscription`) and forbidden
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDefinition>,
    pub is_extension: bool,
}

/// Interface type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDefinition>,
}

/// Scalar type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

/// Enum type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

/// Union type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

/// Input object type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<InputValueDefinition>,
}

/// A schema type contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaType {
    Object(ObjectType),
    Interface(InterfaceType),
    Scalar(ScalarType),
    Enum(EnumType),
    Union(UnionType),
    InputObject(InputObjectType),
}

impl SchemaType {
    /// Returns the declared type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Object(t) => &t.name,
            Self::Interface(t) => &t.name,
            Self::Scalar(t) => &t.name,
            Self::Enum(t) => &t.name,
            Self::Union(t) => &t.name,
            Self::InputObject(t) => &t.name,
        }
    }

    /// Returns true for an object type marked `extend`.
    pub fn is_extension(&self) -> bool {
        matches!(self, Self::Object(t) if t.is_extension)
    }
}

/// The ordered sequence of types one extension contributes.
///
/// Produced exactly once per extension from its `get-schema` export and
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaFragment {
    types: Vec<SchemaType>,
}

impl SchemaFragment {
    /// Creates a fragment from an ordered type list.
    pub fn new(types: Vec<SchemaType>) -> Self {
        Self { types }
    }

    /// Returns the contributed types in declaration order.
    pub fn types(&self) -> &[SchemaType] {
        &self.types
    }

    /// Returns true if the fragment contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the number of contributed types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Renders the fragment as schema definition text.
    pub fn render(&self) -> String {
        crate::render::render_fragment(self)
    }
}

impl FromIterator<SchemaType> for SchemaFragment {
    fn from_iter<I: IntoIterator<Item = SchemaType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SchemaFragment {
    type Item = &'a SchemaType;
    type IntoIter = std::slice::Iter<'a, SchemaType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_modifier_ordering() {
        let non_null_list = TypeRef::named("String").non_null().list();
        assert_eq!(non_null_list.to_string(), "[String!]");

        let list_non_null = TypeRef::named("String").list().non_null();
        assert_eq!(list_non_null.to_string(), "[String]!");
    }

    #[test]
    fn test_type_ref_bare_and_nested() {
        assert_eq!(TypeRef::named("ID").to_string(), "ID");
        assert_eq!(TypeRef::named("ID").non_null().to_string(), "ID!");

        let nested = TypeRef::named("Int").non_null().list().non_null();
        assert_eq!(nested.to_string(), "[Int!]!");
    }

    #[test]
    fn test_schema_type_name() {
        let ty = SchemaType::Enum(EnumType {
            name: "Color".into(),
            description: None,
            values: vec![EnumValue::new("RED")],
        });
        assert_eq!(ty.name(), "Color");
        assert!(!ty.is_extension());
    }

    #[test]
    fn test_fragment_preserves_order() {
        let fragment: SchemaFragment = vec![
            SchemaType::Scalar(ScalarType {
                name: "DateTime".into(),
                description: None,
            }),
            SchemaType::Scalar(ScalarType {
                name: "Sha".into(),
                description: None,
            }),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = fragment.into_iter().map(SchemaType::name).collect();
        assert_eq!(names, vec!["DateTime", "Sha"]);
    }

    #[test]
    fn test_fragment_serde_round_trip() {
        let fragment = SchemaFragment::new(vec![SchemaType::Object(ObjectType {
            name: "Widget".into(),
            description: Some("A widget".into()),
            interfaces: vec!["Node".into()],
            fields: vec![FieldDefinition::new("id", TypeRef::named("ID").non_null())],
            is_extension: false,
        })]);

        let json = serde_json::to_string(&fragment).unwrap();
        let parsed: SchemaFragment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fragment);
    }
}
