//! Error types for extension loading and the runtime bridge.

use thiserror::Error;

/// A failure to turn a discovered bundle into a running extension.
///
/// Every variant carries the extension name so startup diagnostics can be
/// surfaced without re-reading the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(
        "extension '{extension}' declares API version {declared}, but the host \
         supports version {supported}"
    )]
    IncompatibleApiVersion {
        extension: String,
        declared: u32,
        supported: u32,
    },

    #[error("extension '{extension}' requires capability '{capability}' the host does not provide")]
    MissingCapability {
        extension: String,
        capability: String,
    },

    #[error("failed to instantiate extension '{extension}': {reason}")]
    InstantiationFailed { extension: String, reason: String },

    #[error("extension '{extension}' failed to initialize: {reason}")]
    InitializationFailed { extension: String, reason: String },

    #[error("extension '{extension}' failed to migrate its database: {reason}")]
    MigrationFailed { extension: String, reason: String },
}

impl LoadError {
    /// Returns the name of the extension that failed to load.
    pub fn extension(&self) -> &str {
        match self {
            Self::IncompatibleApiVersion { extension, .. }
            | Self::MissingCapability { extension, .. }
            | Self::InstantiationFailed { extension, .. }
            | Self::InitializationFailed { extension, .. }
            | Self::MigrationFailed { extension, .. } => extension,
        }
    }
}

/// A fault during a call into a running extension.
///
/// Runtime errors are caught at the bridge boundary and never unwind into
/// the host process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The sandbox trapped mid-call. The instance is unhealthy afterwards.
    #[error("extension '{extension}' trapped: {reason}")]
    Trap { extension: String, reason: String },

    /// The call exceeded its deadline and was interrupted. The instance is
    /// unhealthy afterwards, like a trap: its guest stack was torn mid-call.
    #[error("extension '{extension}' exceeded its {timeout_ms}ms call deadline")]
    Timeout { extension: String, timeout_ms: u64 },

    /// Host-side I/O performed on the guest's behalf failed.
    #[error("host I/O failed for extension '{extension}': {reason}")]
    HostIo { extension: String, reason: String },

    /// Fixed short-circuit error for calls into an unhealthy instance.
    #[error("extension '{extension}' is unavailable after an earlier fault")]
    Unavailable { extension: String },
}

impl RuntimeError {
    /// Returns the name of the extension the call targeted.
    pub fn extension(&self) -> &str {
        match self {
            Self::Trap { extension, .. }
            | Self::Timeout { extension, .. }
            | Self::HostIo { extension, .. }
            | Self::Unavailable { extension } => extension,
        }
    }

    /// Returns true if the fault leaves the instance unhealthy.
    pub fn poisons_instance(&self) -> bool {
        matches!(self, Self::Trap { .. } | Self::Timeout { .. })
    }
}
