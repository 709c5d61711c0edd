//! Dispatching field resolutions to their owning extensions.

use crate::error::ResolutionError;
use grove_extension::{ExtensionInvoker, RuntimeError};
use grove_registry::{is_root_type, FrozenRegistry};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Routes (type, field) pairs to the owning extension's resolver.
///
/// Built once after the registry freezes, then shared read-only with the
/// outer execution engine as its field-resolution callback. Dispatched
/// calls are independent; concurrent identical calls are never cached or
/// deduplicated here.
pub struct FieldRouter {
    registry: Arc<FrozenRegistry>,
    invokers: FxHashMap<String, Arc<dyn ExtensionInvoker>>,
}

impl FieldRouter {
    /// Creates a router over a frozen registry.
    pub fn new(registry: Arc<FrozenRegistry>) -> Self {
        Self {
            registry,
            invokers: FxHashMap::default(),
        }
    }

    /// Adds a loaded extension's bridge handle.
    ///
    /// Only extensions whose fragments merged successfully belong here; a
    /// rejected extension is excluded from the live schema.
    pub fn with_extension(mut self, invoker: Arc<dyn ExtensionInvoker>) -> Self {
        self.register(invoker);
        self
    }

    /// Adds a bridge handle in place.
    pub fn register(&mut self, invoker: Arc<dyn ExtensionInvoker>) {
        self.invokers
            .insert(invoker.extension_name().to_string(), invoker);
    }

    /// Returns the frozen registry this router consults.
    pub fn registry(&self) -> &Arc<FrozenRegistry> {
        &self.registry
    }

    /// Returns the owning extension for a field, if any.
    fn owner_of(&self, type_name: &str, field: &str) -> Option<&str> {
        if is_root_type(type_name) {
            self.registry.root_field_owner(type_name, field)
        } else {
            self.registry.type_owner(type_name)
        }
    }

    /// Resolves one field through the owning extension's sandbox.
    ///
    /// `args_json` carries already-validated argument values; the returned
    /// JSON text matches the field's declared type and is handed back
    /// verbatim for the outer engine to deserialize and coerce.
    pub async fn resolve(
        &self,
        type_name: &str,
        field: &str,
        args_json: &str,
    ) -> Result<String, ResolutionError> {
        let owner = self
            .owner_of(type_name, field)
            .ok_or_else(|| ResolutionError::UnknownField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })?
            .to_string();

        let invoker = self
            .invokers
            .get(&owner)
            .ok_or_else(|| ResolutionError::ExtensionUnavailable {
                extension: owner.clone(),
            })?;

        if !invoker.is_healthy() {
            return Err(ResolutionError::ExtensionUnavailable { extension: owner });
        }

        debug!(extension = %owner, type_name, field, "dispatching field resolution");

        // The bridge call blocks until the guest returns or its deadline
        // interrupts it, so it runs on a blocking thread.
        let invoker = Arc::clone(invoker);
        let field_name = field.to_string();
        let args = args_json.to_string();
        let outcome =
            tokio::task::spawn_blocking(move || invoker.resolve_field(&field_name, &args))
                .await
                .map_err(|e| ResolutionError::ResolutionFailed {
                    extension: owner.clone(),
                    source: RuntimeError::HostIo {
                        extension: owner.clone(),
                        reason: e.to_string(),
                    },
                })?;

        match outcome {
            Ok(Ok(json)) => Ok(json),
            Ok(Err(message)) => Err(ResolutionError::GuestReportedFailure {
                extension: owner,
                message,
            }),
            Err(RuntimeError::Unavailable { .. }) => {
                Err(ResolutionError::ExtensionUnavailable { extension: owner })
            }
            Err(fault) => Err(ResolutionError::ResolutionFailed {
                extension: owner,
                source: fault,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_schema::{FieldDefinition, ObjectType, SchemaFragment, SchemaType, TypeRef};
    use std::sync::atomic::{AtomicBool, Ordering};

    enum Behavior {
        Payload(&'static str),
        GuestError(&'static str),
        Timeout,
    }

    struct StubExtension {
        name: &'static str,
        healthy: AtomicBool,
        behavior: Behavior,
    }

    impl StubExtension {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                healthy: AtomicBool::new(true),
                behavior,
            })
        }
    }

    impl ExtensionInvoker for StubExtension {
        fn extension_name(&self) -> &str {
            self.name
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::Acquire)
        }

        fn resolve_field(
            &self,
            field: &str,
            args_json: &str,
        ) -> Result<Result<String, String>, RuntimeError> {
            match &self.behavior {
                Behavior::Payload(json) => {
                    assert!(!field.is_empty());
                    assert!(!args_json.is_empty());
                    Ok(Ok((*json).to_string()))
                }
                Behavior::GuestError(message) => Ok(Err((*message).to_string())),
                Behavior::Timeout => {
                    self.healthy.store(false, Ordering::Release);
                    Err(RuntimeError::Timeout {
                        extension: self.name.to_string(),
                        timeout_ms: 5_000,
                    })
                }
            }
        }
    }

    fn issues_fragment() -> SchemaFragment {
        SchemaFragment::new(vec![
            SchemaType::Object(ObjectType {
                name: "Query".into(),
                description: None,
                interfaces: Vec::new(),
                fields: vec![FieldDefinition::new("getIssue", TypeRef::named("Issue"))],
                is_extension: true,
            }),
            SchemaType::Object(ObjectType {
                name: "Issue".into(),
                description: None,
                interfaces: Vec::new(),
                fields: vec![FieldDefinition::new("title", TypeRef::named("String"))],
                is_extension: false,
            }),
        ])
    }

    fn wiki_fragment() -> SchemaFragment {
        SchemaFragment::new(vec![SchemaType::Object(ObjectType {
            name: "Query".into(),
            description: None,
            interfaces: Vec::new(),
            fields: vec![FieldDefinition::new("getPage", TypeRef::named("String"))],
            is_extension: true,
        })])
    }

    fn frozen_registry() -> Arc<FrozenRegistry> {
        let mut registry = grove_registry::SchemaRegistry::new();
        registry.register("issues", &issues_fragment()).unwrap();
        registry.register("wiki", &wiki_fragment()).unwrap();
        Arc::new(registry.freeze())
    }

    #[tokio::test]
    async fn test_dispatch_returns_payload_verbatim() {
        let router = FieldRouter::new(frozen_registry()).with_extension(StubExtension::new(
            "issues",
            Behavior::Payload(r#"{"id":"5","title":"broken build"}"#),
        ));

        let json = router
            .resolve("Query", "getIssue", r#"{"id":"5"}"#)
            .await
            .unwrap();
        assert_eq!(json, r#"{"id":"5","title":"broken build"}"#);
    }

    #[tokio::test]
    async fn test_non_root_type_routes_to_type_owner() {
        let router = FieldRouter::new(frozen_registry()).with_extension(StubExtension::new(
            "issues",
            Behavior::Payload(r#""broken build""#),
        ));

        let json = router.resolve("Issue", "title", "{}").await.unwrap();
        assert_eq!(json, r#""broken build""#);
    }

    #[tokio::test]
    async fn test_unknown_field_is_fatal_to_query_only() {
        let router = FieldRouter::new(frozen_registry());

        let err = router.resolve("Query", "nope", "{}").await.unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownField { .. }));
        assert_eq!(err.extension(), None);
    }

    #[tokio::test]
    async fn test_unhealthy_extension_short_circuits() {
        let stub = StubExtension::new("issues", Behavior::Payload("{}"));
        stub.healthy.store(false, Ordering::Release);
        let router = FieldRouter::new(frozen_registry()).with_extension(stub);

        let err = router
            .resolve("Query", "getIssue", "{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ExtensionUnavailable { extension } if extension == "issues"
        ));
    }

    #[tokio::test]
    async fn test_guest_error_surfaces_verbatim() {
        let router = FieldRouter::new(frozen_registry()).with_extension(StubExtension::new(
            "issues",
            Behavior::GuestError("issue 5 not found"),
        ));

        let err = router
            .resolve("Query", "getIssue", r#"{"id":"5"}"#)
            .await
            .unwrap_err();
        match err {
            ResolutionError::GuestReportedFailure { extension, message } => {
                assert_eq!(extension, "issues");
                assert_eq!(message, "issue 5 not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_does_not_poison_other_extensions() {
        let slow = StubExtension::new("issues", Behavior::Timeout);
        let fast = StubExtension::new("wiki", Behavior::Payload(r#""home""#));
        let router = FieldRouter::new(frozen_registry())
            .with_extension(Arc::clone(&slow) as Arc<dyn ExtensionInvoker>)
            .with_extension(Arc::clone(&fast) as Arc<dyn ExtensionInvoker>);

        let err = router
            .resolve("Query", "getIssue", "{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ResolutionFailed {
                source: RuntimeError::Timeout { .. },
                ..
            }
        ));

        // The faulted instance is gone until manual reload...
        let err = router.resolve("Query", "getIssue", "{}").await.unwrap_err();
        assert!(matches!(err, ResolutionError::ExtensionUnavailable { .. }));

        // ...while the other extension keeps resolving.
        assert!(fast.is_healthy());
        let json = router.resolve("Query", "getPage", "{}").await.unwrap();
        assert_eq!(json, r#""home""#);
    }
}
