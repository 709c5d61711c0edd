//! Resolution error taxonomy.
//!
//! Every variant names the taxonomy kind and the extension involved and
//! nothing else; raw internal state such as stack traces or SQL text never
//! reaches the outer engine's GraphQL errors.

use grove_extension::RuntimeError;
use thiserror::Error;

/// Why a single field failed to resolve.
///
/// Scoped to one query; sibling fields still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No registered owner for the field. A registration bug, fatal to
    /// this query only.
    #[error("no extension owns field '{field}' on type '{type_name}'")]
    UnknownField { type_name: String, field: String },

    /// The owning extension was previously marked unhealthy. No retry.
    #[error("extension '{extension}' is unavailable")]
    ExtensionUnavailable { extension: String },

    /// The guest returned an error string; `message` is surfaced verbatim
    /// as the field's GraphQL error.
    #[error("extension '{extension}' reported: {message}")]
    GuestReportedFailure { extension: String, message: String },

    /// The call faulted at the bridge boundary (trap, timeout, host I/O).
    #[error("field resolution failed in extension '{extension}': {source}")]
    ResolutionFailed {
        extension: String,
        #[source]
        source: RuntimeError,
    },
}

impl ResolutionError {
    /// Returns the extension involved, if the field had an owner.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::UnknownField { .. } => None,
            Self::ExtensionUnavailable { extension }
            | Self::GuestReportedFailure { extension, .. }
            | Self::ResolutionFailed { extension, .. } => Some(extension),
        }
    }
}
