//! The build-then-freeze schema registry.
//!
//! One registry instance is built during the sequential load phase, one
//! fragment at a time, then frozen and shared read-only with the router and
//! the outer execution engine for the server's lifetime.

use crate::error::{ConflictError, RegistryError, ValidationError};
use crate::report::{OwnershipReport, RootFieldOwnership, TypeOwnership};
use grove_schema::{SchemaFragment, SchemaType};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, info};

/// The extensible API entry-point types.
pub const ROOT_TYPES: [&str; 3] = ["Query", "Mutation", "Subscription"];

/// Returns true for `Query`, `Mutation`, or `Subscription`.
pub fn is_root_type(name: &str) -> bool {
    ROOT_TYPES.contains(&name)
}

/// Accumulates extension fragments during the load phase.
///
/// Mutated only by the single loading path; `freeze` ends the build phase.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Non-root type name to owning extension.
    type_ownership: IndexMap<String, String>,
    /// Root type name to field name to owning extension.
    root_field_ownership: IndexMap<String, IndexMap<String, String>>,
    /// Accepted fragments in registration order.
    fragments: Vec<(String, SchemaFragment)>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a fragment and merges it under the given extension name.
    ///
    /// The fragment is validated in isolation first, then checked against
    /// all previously merged extensions; nothing is recorded unless every
    /// check passes, so a failing extension is never partially merged.
    /// Re-registering an identical fragment under the same name is a no-op.
    pub fn register(
        &mut self,
        extension: &str,
        fragment: &SchemaFragment,
    ) -> Result<(), RegistryError> {
        if self
            .fragments
            .iter()
            .any(|(name, existing)| name == extension && existing == fragment)
        {
            debug!(extension, "identical fragment already registered");
            return Ok(());
        }

        validate_fragment(fragment).map_err(|source| RegistryError::Validation {
            extension: extension.to_string(),
            source,
        })?;

        self.check_conflicts(extension, fragment)
            .map_err(|source| RegistryError::Conflict {
                extension: extension.to_string(),
                source,
            })?;

        self.commit(extension, fragment);
        info!(
            extension,
            types = fragment.len(),
            "registered schema fragment"
        );
        Ok(())
    }

    /// Checks every claim in the fragment against accumulated ownership.
    fn check_conflicts(&self, extension: &str, fragment: &SchemaFragment) -> Result<(), ConflictError> {
        for ty in fragment.types() {
            if ty.is_extension() {
                let root = ty.name();
                let SchemaType::Object(object) = ty else {
                    continue;
                };
                for field in &object.fields {
                    let owner = self
                        .root_field_ownership
                        .get(root)
                        .and_then(|fields| fields.get(&field.name));
                    if let Some(owner) = owner {
                        if owner != extension {
                            return Err(ConflictError::RootFieldOwnershipConflict {
                                root: root.to_string(),
                                field: field.name.clone(),
                                owner: owner.clone(),
                                claimant: extension.to_string(),
                            });
                        }
                    }
                }
            } else if let Some(owner) = self.type_ownership.get(ty.name()) {
                if owner != extension {
                    return Err(ConflictError::TypeNameOwnershipConflict {
                        type_name: ty.name().to_string(),
                        owner: owner.clone(),
                        claimant: extension.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Records ownership for every claim; only called after all checks pass.
    fn commit(&mut self, extension: &str, fragment: &SchemaFragment) {
        for ty in fragment.types() {
            if ty.is_extension() {
                let SchemaType::Object(object) = ty else {
                    continue;
                };
                let fields = self
                    .root_field_ownership
                    .entry(object.name.clone())
                    .or_default();
                for field in &object.fields {
                    fields.insert(field.name.clone(), extension.to_string());
                }
            } else {
                self.type_ownership
                    .insert(ty.name().to_string(), extension.to_string());
            }
        }
        self.fragments
            .push((extension.to_string(), fragment.clone()));
    }

    /// Ends the load phase.
    ///
    /// The frozen registry is immutable and safe for unsynchronized
    /// concurrent reads.
    pub fn freeze(self) -> FrozenRegistry {
        FrozenRegistry {
            type_ownership: self.type_ownership,
            root_field_ownership: self.root_field_ownership,
            fragments: self.fragments,
        }
    }
}

/// Validates a fragment in isolation, independent of registry state.
fn validate_fragment(fragment: &SchemaFragment) -> Result<(), ValidationError> {
    for ty in fragment.types() {
        match ty {
            SchemaType::Object(object) => {
                if is_root_type(&object.name) && !object.is_extension {
                    return Err(ValidationError::RootTypeNotMarkedExtension {
                        type_name: object.name.clone(),
                    });
                }
                if !is_root_type(&object.name) && object.is_extension {
                    return Err(ValidationError::NonRootTypeMarkedExtension {
                        type_name: object.name.clone(),
                    });
                }
                check_unique(object.fields.iter().map(|f| f.name.as_str()), |field| {
                    ValidationError::DuplicateFieldName {
                        type_name: object.name.clone(),
                        field,
                    }
                })?;
            }
            SchemaType::Interface(interface) => {
                check_unique(interface.fields.iter().map(|f| f.name.as_str()), |field| {
                    ValidationError::DuplicateFieldName {
                        type_name: interface.name.clone(),
                        field,
                    }
                })?;
            }
            SchemaType::Enum(enum_type) => {
                check_unique(enum_type.values.iter().map(|v| v.name.as_str()), |value| {
                    ValidationError::DuplicateEnumValue {
                        type_name: enum_type.name.clone(),
                        value,
                    }
                })?;
            }
            SchemaType::InputObject(input) => {
                check_unique(input.fields.iter().map(|f| f.name.as_str()), |field| {
                    ValidationError::DuplicateInputField {
                        type_name: input.name.clone(),
                        field,
                    }
                })?;
            }
            SchemaType::Scalar(_) | SchemaType::Union(_) => {}
        }
    }
    Ok(())
}

fn check_unique<'a>(
    names: impl Iterator<Item = &'a str>,
    on_duplicate: impl Fn(String) -> ValidationError,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(on_duplicate(name.to_string()));
        }
    }
    Ok(())
}

/// The read-only registry consumed by the router and the execution engine.
#[derive(Debug)]
pub struct FrozenRegistry {
    type_ownership: IndexMap<String, String>,
    root_field_ownership: IndexMap<String, IndexMap<String, String>>,
    fragments: Vec<(String, SchemaFragment)>,
}

impl FrozenRegistry {
    /// Returns the extension owning a non-root type.
    pub fn type_owner(&self, type_name: &str) -> Option<&str> {
        self.type_ownership.get(type_name).map(String::as_str)
    }

    /// Returns the extension owning a field on a root type.
    pub fn root_field_owner(&self, root: &str, field: &str) -> Option<&str> {
        self.root_field_ownership
            .get(root)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    /// Returns the extension names in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|(name, _)| name.as_str())
    }

    /// Builds the full ownership report for diagnostics.
    pub fn ownership_report(&self) -> OwnershipReport {
        let types = self
            .type_ownership
            .iter()
            .map(|(type_name, extension)| TypeOwnership {
                type_name: type_name.clone(),
                extension: extension.clone(),
            })
            .collect();

        let root_fields = self
            .root_field_ownership
            .iter()
            .flat_map(|(root, fields)| {
                fields.iter().map(|(field, extension)| RootFieldOwnership {
                    root: root.clone(),
                    field: field.clone(),
                    extension: extension.clone(),
                })
            })
            .collect();

        OwnershipReport { types, root_fields }
    }

    /// Renders the merged schema text handed to the outer execution engine.
    ///
    /// Fragments render in registration order, so the output is stable
    /// across runs for the same load order.
    pub fn render_sdl(&self) -> String {
        let rendered: Vec<String> = self
            .fragments
            .iter()
            .map(|(_, fragment)| fragment.render())
            .filter(|text| !text.is_empty())
            .collect();
        rendered.join("\n")
    }
}
