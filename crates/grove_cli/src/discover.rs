//! Filesystem bundle discovery.
//!
//! Discovery is deliberately outside the runtime core: this is the host
//! edge that turns a directory into the ordered bundle list the loader
//! consumes. An extension bundle is a `<name>.wasm` component; an optional
//! sibling `<name>.json` is passed through as the opaque configuration
//! blob.

use grove_extension::DiscoveredBundle;
use std::io;
use std::path::Path;
use tracing::debug;

/// Scans a directory for extension bundles.
///
/// The result is sorted by name so downstream diagnostics are stable even
/// before the loader re-sorts.
pub fn discover_bundles(dir: &Path) -> io::Result<Vec<DiscoveredBundle>> {
    let mut bundles = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("wasm") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let config_path = path.with_extension("json");
        let config = if config_path.is_file() {
            Some(std::fs::read_to_string(&config_path)?)
        } else {
            None
        };

        debug!(extension = name, path = %path.display(), "discovered bundle");
        bundles.push(DiscoveredBundle {
            name: name.to_string(),
            wasm_path: path,
            config,
        });
    }

    bundles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_finds_wasm_bundles_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wiki.wasm"), b"\0asm").unwrap();
        std::fs::write(dir.path().join("issues.wasm"), b"\0asm").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a bundle").unwrap();

        let bundles = discover_bundles(dir.path()).unwrap();
        let names: Vec<&str> = bundles.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["issues", "wiki"]);
        assert!(bundles.iter().all(|b| b.config.is_none()));
    }

    #[test]
    fn test_discovery_picks_up_sibling_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("issues.wasm"), b"\0asm").unwrap();
        std::fs::write(dir.path().join("issues.json"), b"{\"labels\":true}").unwrap();

        let bundles = discover_bundles(dir.path()).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].config.as_deref(), Some("{\"labels\":true}"));
    }
}
