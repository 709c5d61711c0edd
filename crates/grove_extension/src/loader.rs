//! Turning discovered bundles into running, schema-bearing extensions.
//!
//! Discovery itself lives outside the core: the loader consumes an ordered
//! bundle list and drives each extension's lifecycle sequentially, in a
//! fixed name-sorted order so conflict diagnostics are reproducible
//! run-to-run.

use crate::bridge::ExtensionHandle;
use crate::descriptor::{check_api_info, database_path, ExtensionDescriptor};
use crate::error::LoadError;
use crate::sandbox::{ExtensionSandbox, ResourceLimits, SandboxEngine};
use grove_schema::SchemaFragment;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A bundle produced by the discovery mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBundle {
    /// Unique extension name.
    pub name: String,
    /// Path to the component binary.
    pub wasm_path: PathBuf,
    /// Opaque configuration blob, if the deployment provides one.
    pub config: Option<String>,
}

/// What to do when one extension fails to load.
///
/// This is deployment policy, not a core invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Abort the whole startup on the first failure.
    AbortOnFailure,
    /// Log the failure, exclude the extension, keep loading.
    SkipFailed,
}

/// A fully loaded extension: identity, schema contribution, runtime handle.
pub struct LoadedExtension {
    pub descriptor: ExtensionDescriptor,
    pub fragment: SchemaFragment,
    pub handle: Arc<ExtensionHandle>,
}

/// The outcome of loading a bundle list under `LoadPolicy::SkipFailed`.
pub struct LoadReport {
    pub loaded: Vec<LoadedExtension>,
    pub failed: Vec<LoadError>,
}

/// Loads extensions sequentially against a shared sandbox engine.
pub struct ExtensionLoader {
    engine: Arc<SandboxEngine>,
    data_dir: PathBuf,
    limits: ResourceLimits,
}

impl ExtensionLoader {
    /// Creates a loader writing extension databases under `data_dir`.
    pub fn new(
        engine: Arc<SandboxEngine>,
        data_dir: impl Into<PathBuf>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            engine,
            data_dir: data_dir.into(),
            limits,
        }
    }

    /// Loads a single bundle, or rejects it with a precise reason.
    pub fn load(&self, bundle: &DiscoveredBundle) -> Result<LoadedExtension, LoadError> {
        let name = bundle.name.as_str();

        let mut sandbox = ExtensionSandbox::instantiate(
            &self.engine,
            name,
            &bundle.wasm_path,
            self.limits.clone(),
        )?;

        // Handshake precedes everything else: an incompatible extension is
        // rejected before `init` ever runs.
        let api_info = sandbox
            .get_api_info()
            .map_err(|e| LoadError::InstantiationFailed {
                extension: name.to_string(),
                reason: format!("get-api-info failed: {e}"),
            })?;
        check_api_info(name, &api_info)?;

        let descriptor = ExtensionDescriptor {
            name: name.to_string(),
            db_path: database_path(&self.data_dir, name),
            config: bundle.config.clone(),
            api_version: api_info.api_version,
            capabilities: api_info.capabilities,
        };

        std::fs::create_dir_all(&self.data_dir).map_err(|e| LoadError::InstantiationFailed {
            extension: name.to_string(),
            reason: format!("failed to create data directory: {e}"),
        })?;
        sandbox
            .attach_database(&descriptor.db_path)
            .map_err(|e| LoadError::InstantiationFailed {
                extension: name.to_string(),
                reason: format!("failed to open extension database: {e}"),
            })?;

        match sandbox.init(&descriptor) {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                return Err(LoadError::InitializationFailed {
                    extension: name.to_string(),
                    reason: message,
                })
            }
            Err(e) => {
                return Err(LoadError::InitializationFailed {
                    extension: name.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        let db_path = descriptor.db_path.display().to_string();
        match sandbox.migrate(&db_path) {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                return Err(LoadError::MigrationFailed {
                    extension: name.to_string(),
                    reason: message,
                })
            }
            Err(e) => {
                return Err(LoadError::MigrationFailed {
                    extension: name.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        let fragment = sandbox
            .get_schema()
            .map_err(|e| LoadError::InstantiationFailed {
                extension: name.to_string(),
                reason: format!("get-schema failed: {e}"),
            })?;

        let handle = ExtensionHandle::new(
            name.to_string(),
            self.limits.call_timeout_ms,
            sandbox,
        );

        info!(
            extension = name,
            api_version = descriptor.api_version,
            types = fragment.len(),
            "extension loaded"
        );

        Ok(LoadedExtension {
            descriptor,
            fragment,
            handle,
        })
    }

    /// Loads every bundle in deterministic order under the given policy.
    ///
    /// With `AbortOnFailure` the first failure is returned and nothing
    /// after it is loaded; with `SkipFailed` failures are logged, collected
    /// in the report, and excluded from the live set.
    pub fn load_all(
        &self,
        mut bundles: Vec<DiscoveredBundle>,
        policy: LoadPolicy,
    ) -> Result<LoadReport, LoadError> {
        sort_bundles(&mut bundles);
        check_unique_names(&bundles)?;

        let mut report = LoadReport {
            loaded: Vec::new(),
            failed: Vec::new(),
        };

        for bundle in &bundles {
            match self.load(bundle) {
                Ok(extension) => report.loaded.push(extension),
                Err(error) => {
                    warn!(extension = %error.extension(), %error, "extension failed to load");
                    match policy {
                        LoadPolicy::AbortOnFailure => return Err(error),
                        LoadPolicy::SkipFailed => report.failed.push(error),
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Fixes the load order: lexicographic by extension name.
fn sort_bundles(bundles: &mut [DiscoveredBundle]) {
    bundles.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Two bundles with one name would share identity and storage.
fn check_unique_names(bundles: &[DiscoveredBundle]) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for bundle in bundles {
        if !seen.insert(bundle.name.as_str()) {
            return Err(LoadError::InstantiationFailed {
                extension: bundle.name.clone(),
                reason: "another bundle already uses this extension name".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str) -> DiscoveredBundle {
        DiscoveredBundle {
            name: name.into(),
            wasm_path: PathBuf::from(format!("/ext/{name}.wasm")),
            config: None,
        }
    }

    #[test]
    fn test_load_order_is_name_sorted() {
        let mut bundles = vec![bundle("wiki"), bundle("ci"), bundle("issues")];
        sort_bundles(&mut bundles);

        let names: Vec<&str> = bundles.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["ci", "issues", "wiki"]);
    }

    #[test]
    fn test_duplicate_bundle_names_rejected() {
        let bundles = vec![bundle("issues"), bundle("issues")];
        let err = check_unique_names(&bundles).unwrap_err();
        assert_eq!(err.extension(), "issues");
    }

    #[test]
    fn test_unique_names_accepted() {
        let bundles = vec![bundle("issues"), bundle("wiki")];
        assert!(check_unique_names(&bundles).is_ok());
    }
}
