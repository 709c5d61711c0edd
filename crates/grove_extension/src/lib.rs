//! Extension loading and the sandboxed runtime bridge for grove.
//!
//! This crate owns both directions of the host/guest boundary:
//! - `descriptor`: extension identity and the capability handshake
//! - `loader`: sequential, deterministic bundle loading
//! - `sandbox`: wasmtime-backed instances with resource limits
//! - `bridge`: the health-tracked call surface used at query time
//! - `db`: the per-extension SQLite capability
//! - `error`: load-time and runtime error taxonomies
//!
//! The extension ABI itself is defined structurally in `wit/extension.wit`;
//! `bindings` holds the generated types and their conversions into the
//! `grove_schema` model.

mod bindings;
pub mod bridge;
pub mod db;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod sandbox;

mod host;

pub use bridge::{ExtensionHandle, ExtensionInvoker};
pub use db::ScopedDb;
pub use descriptor::{
    check_api_info, database_path, ApiInfo, ExtensionDescriptor, HOST_CAPABILITIES,
    SUPPORTED_API_VERSION,
};
pub use error::{LoadError, RuntimeError};
pub use loader::{DiscoveredBundle, ExtensionLoader, LoadPolicy, LoadReport, LoadedExtension};
pub use sandbox::{ExtensionSandbox, ResourceLimits, SandboxEngine};
