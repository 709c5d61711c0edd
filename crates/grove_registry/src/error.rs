//! Error types for schema registration.

use thiserror::Error;

/// A defect inside a single fragment, detected before any merging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A root object type (`Query`/`Mutation`/`Subscription`) must be an
    /// `extend type` contribution.
    #[error("root type '{type_name}' must be declared as an extension")]
    RootTypeNotMarkedExtension { type_name: String },

    /// Only root types may be `extend type` contributions.
    #[error("type '{type_name}' is not a root type and cannot be declared as an extension")]
    NonRootTypeMarkedExtension { type_name: String },

    /// Field names are unique within one object or interface type.
    #[error("duplicate field '{field}' on type '{type_name}'")]
    DuplicateFieldName { type_name: String, field: String },

    /// Enum values are unique within one enum.
    #[error("duplicate value '{value}' on enum '{type_name}'")]
    DuplicateEnumValue { type_name: String, value: String },

    /// Input fields are unique within one input object.
    #[error("duplicate input field '{field}' on input type '{type_name}'")]
    DuplicateInputField { type_name: String, field: String },
}

/// A collision with a previously merged extension.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// Two extensions contributed the same field name on a root type.
    #[error(
        "field '{field}' on root type '{root}' is already owned by extension \
         '{owner}' and cannot be claimed by extension '{claimant}'"
    )]
    RootFieldOwnershipConflict {
        root: String,
        field: String,
        owner: String,
        claimant: String,
    },

    /// Two extensions contributed a type with the same name.
    #[error(
        "type '{type_name}' is already owned by extension '{owner}' and cannot \
         be claimed by extension '{claimant}'"
    )]
    TypeNameOwnershipConflict {
        type_name: String,
        owner: String,
        claimant: String,
    },
}

/// Any failure to register a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("extension '{extension}' contributed an invalid fragment: {source}")]
    Validation {
        extension: String,
        #[source]
        source: ValidationError,
    },

    #[error("extension '{extension}' conflicts with a loaded extension: {source}")]
    Conflict {
        extension: String,
        #[source]
        source: ConflictError,
    },
}

impl RegistryError {
    /// Returns the name of the extension whose registration failed.
    pub fn extension(&self) -> &str {
        match self {
            Self::Validation { extension, .. } | Self::Conflict { extension, .. } => extension,
        }
    }
}
