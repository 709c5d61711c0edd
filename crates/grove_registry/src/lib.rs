//! Schema registry and conflict detection for grove extensions.
//!
//! This crate keeps independently authored extensions from colliding:
//! - `error`: validation and conflict error types
//! - `registry`: the build-then-freeze ownership registry
//! - `report`: ownership diagnostics

pub mod error;
pub mod registry;
pub mod report;

pub use error::{ConflictError, RegistryError, ValidationError};
pub use registry::{is_root_type, FrozenRegistry, SchemaRegistry, ROOT_TYPES};
pub use report::OwnershipReport;
