//! Extension descriptors and the capability handshake.

use crate::error::LoadError;
use std::path::{Path, PathBuf};

/// The extension API version this host implements.
pub const SUPPORTED_API_VERSION: u32 = 1;

/// Capabilities this host can provide to a guest.
pub const HOST_CAPABILITIES: [&str; 2] = ["log", "database"];

/// What an extension reports during the capability handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    /// The API version the extension was built against.
    pub api_version: u32,
    /// Capabilities the extension requires from the host.
    pub capabilities: Vec<String>,
}

/// Immutable identity of a loaded extension.
///
/// Created at discovery time, completed by the handshake, owned exclusively
/// by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    /// Unique extension name.
    pub name: String,
    /// The extension's exclusively owned database file.
    pub db_path: PathBuf,
    /// Opaque configuration blob handed to `init`, if any.
    pub config: Option<String>,
    /// Declared API version.
    pub api_version: u32,
    /// Declared capability set.
    pub capabilities: Vec<String>,
}

/// Rejects an extension whose handshake is incompatible with this host.
///
/// Runs before `init`, so an incompatible extension is never initialized.
pub fn check_api_info(extension: &str, info: &ApiInfo) -> Result<(), LoadError> {
    if info.api_version != SUPPORTED_API_VERSION {
        return Err(LoadError::IncompatibleApiVersion {
            extension: extension.to_string(),
            declared: info.api_version,
            supported: SUPPORTED_API_VERSION,
        });
    }

    for capability in &info.capabilities {
        if !HOST_CAPABILITIES.contains(&capability.as_str()) {
            return Err(LoadError::MissingCapability {
                extension: extension.to_string(),
                capability: capability.clone(),
            });
        }
    }

    Ok(())
}

/// Derives the extension's database path from its name.
///
/// The mapping is deterministic, and names are sanitized so the file always
/// lands directly inside the data directory.
pub fn database_path(data_dir: &Path, extension: &str) -> PathBuf {
    let sanitized: String = extension
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    data_dir.join(format!("{sanitized}.db"))
}
