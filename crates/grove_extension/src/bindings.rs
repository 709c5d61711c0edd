//! Generated component bindings and conversions to the host schema model.
//!
//! Everything crossing the sandbox boundary is copied: fragments arrive as
//! generated WIT values and are converted here into owned `grove_schema`
//! values before any host logic touches them. Guest memory is never exposed.

use crate::descriptor::ApiInfo;
use grove_schema::{
    EnumType, EnumValue, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    ObjectType, ScalarType, SchemaFragment, SchemaType, TypeModifier, TypeRef, UnionType,
};

mod generated {
    wasmtime::component::bindgen!({
        path: "wit",
        world: "extension-world",
    });
}

pub(crate) use generated::exports::grove::extension::guest as wit_guest;
pub(crate) use generated::grove::extension::{database as wit_database, log as wit_log};
pub(crate) use generated::ExtensionWorld;

/// Converts a handshake result into the host representation.
pub(crate) fn api_info_from_wit(info: wit_guest::ApiInfo) -> ApiInfo {
    ApiInfo {
        api_version: info.api_version,
        capabilities: info.capabilities,
    }
}

/// Converts a `get-schema` result into an owned fragment, preserving
/// declaration order.
pub(crate) fn fragment_from_wit(types: Vec<wit_guest::SchemaType>) -> SchemaFragment {
    types.into_iter().map(type_from_wit).collect()
}

fn type_from_wit(ty: wit_guest::SchemaType) -> SchemaType {
    match ty {
        wit_guest::SchemaType::Object(t) => SchemaType::Object(ObjectType {
            name: t.name,
            description: t.description,
            interfaces: t.interfaces,
            fields: t.fields.into_iter().map(field_from_wit).collect(),
            is_extension: t.is_extension,
        }),
        wit_guest::SchemaType::Iface(t) => SchemaType::Interface(InterfaceType {
            name: t.name,
            description: t.description,
            interfaces: t.interfaces,
            fields: t.fields.into_iter().map(field_from_wit).collect(),
        }),
        wit_guest::SchemaType::Scalar(t) => SchemaType::Scalar(ScalarType {
            name: t.name,
            description: t.description,
        }),
        wit_guest::SchemaType::Enumeration(t) => SchemaType::Enum(EnumType {
            name: t.name,
            description: t.description,
            values: t
                .values
                .into_iter()
                .map(|v| EnumValue {
                    name: v.name,
                    description: v.description,
                })
                .collect(),
        }),
        wit_guest::SchemaType::UnionDef(t) => SchemaType::Union(UnionType {
            name: t.name,
            description: t.description,
            members: t.members,
        }),
        wit_guest::SchemaType::InputObject(t) => SchemaType::InputObject(InputObjectType {
            name: t.name,
            description: t.description,
            fields: t.fields.into_iter().map(input_value_from_wit).collect(),
        }),
    }
}

fn field_from_wit(field: wit_guest::FieldDef) -> FieldDefinition {
    FieldDefinition {
        name: field.name,
        description: field.description,
        ty: type_ref_from_wit(field.ty),
        arguments: field.arguments.into_iter().map(input_value_from_wit).collect(),
    }
}

fn input_value_from_wit(value: wit_guest::InputValue) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name,
        description: value.description,
        ty: type_ref_from_wit(value.ty),
        default_value: value.default_value,
    }
}

fn type_ref_from_wit(ty: wit_guest::TypeRef) -> TypeRef {
    TypeRef {
        root: ty.root,
        modifiers: ty
            .modifiers
            .into_iter()
            .map(|modifier| match modifier {
                wit_guest::TypeModifier::ListType => TypeModifier::List,
                wit_guest::TypeModifier::NonNull => TypeModifier::NonNull,
            })
            .collect(),
    }
}
