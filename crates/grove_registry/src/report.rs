//! Ownership diagnostics.

use serde::Serialize;
use std::fmt;

/// A non-root type claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeOwnership {
    pub type_name: String,
    pub extension: String,
}

/// A root-type field claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootFieldOwnership {
    pub root: String,
    pub field: String,
    pub extension: String,
}

/// Everything needed to debug a naming conflict without re-reading
/// extension source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OwnershipReport {
    pub types: Vec<TypeOwnership>,
    pub root_fields: Vec<RootFieldOwnership>,
}

impl OwnershipReport {
    /// Returns true if no ownership has been recorded.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.root_fields.is_empty()
    }
}

impl fmt::Display for OwnershipReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ty in &self.types {
            writeln!(f, "type {} -> {}", ty.type_name, ty.extension)?;
        }
        for field in &self.root_fields {
            writeln!(f, "{}.{} -> {}", field.root, field.field, field.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = OwnershipReport {
            types: vec![TypeOwnership {
                type_name: "Widget".into(),
                extension: "widgets".into(),
            }],
            root_fields: vec![RootFieldOwnership {
                root: "Query".into(),
                field: "widgetCount".into(),
                extension: "widgets".into(),
            }],
        };

        let text = report.to_string();
        assert!(text.contains("type Widget -> widgets"));
        assert!(text.contains("Query.widgetCount -> widgets"));
    }

    #[test]
    fn test_report_serializes() {
        let report = OwnershipReport::default();
        assert!(report.is_empty());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("types"));
    }
}
