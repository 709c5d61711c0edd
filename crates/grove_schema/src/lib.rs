//! Structural schema model for grove extensions.
//!
//! This crate provides the language-neutral representation of a GraphQL
//! schema contribution:
//! - `fragment`: the type/field/argument model one extension contributes
//! - `render`: deterministic rendering to schema definition text

pub mod fragment;
pub mod render;

pub use fragment::{
    EnumType, EnumValue, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    ObjectType, ScalarType, SchemaFragment, SchemaType, TypeModifier, TypeRef, UnionType,
};
pub use render::{render_fragment, render_type};
