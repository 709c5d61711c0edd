//! The host side of the extension runtime bridge.
//!
//! `ExtensionHandle` is the only path through which query execution reaches
//! sandboxed code. Calls are blocking: the guest cannot yield mid-call, and
//! the calling execution context is held until the call returns or its
//! deadline interrupts it. Async callers wrap the call in a blocking task.
//!
//! A fault terminates only the in-flight call, but it leaves the instance
//! permanently unhealthy: there is no automatic respawn, and every later
//! call short-circuits with a fixed error until a manual reload.

use crate::error::RuntimeError;
use crate::sandbox::ExtensionSandbox;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::warn;
use wasmtime::Trap;

/// The bridge surface the router dispatches through.
///
/// Implemented by `ExtensionHandle`; test doubles stand in for it where no
/// sandbox is wanted.
pub trait ExtensionInvoker: Send + Sync {
    /// The owning extension's name.
    fn extension_name(&self) -> &str;

    /// Returns false once the instance has faulted.
    fn is_healthy(&self) -> bool;

    /// Resolves one field, blocking until the guest returns.
    ///
    /// The outer error is a bridge fault; the inner result is the guest's
    /// own ok(json)/error(message) outcome.
    fn resolve_field(
        &self,
        field: &str,
        args_json: &str,
    ) -> Result<Result<String, String>, RuntimeError>;
}

/// A live, health-tracked extension instance.
pub struct ExtensionHandle {
    name: String,
    healthy: AtomicBool,
    /// Serializes calls: one logical call in flight per instance.
    sandbox: Mutex<ExtensionSandbox>,
    timeout_ms: u64,
}

impl ExtensionHandle {
    pub(crate) fn new(name: String, timeout_ms: u64, sandbox: ExtensionSandbox) -> Arc<Self> {
        Arc::new(Self {
            name,
            healthy: AtomicBool::new(true),
            sandbox: Mutex::new(sandbox),
            timeout_ms,
        })
    }

    /// Returns the extension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classifies a sandbox fault and marks the instance unhealthy.
    fn fault(&self, error: wasmtime::Error) -> RuntimeError {
        let fault = match error.downcast_ref::<Trap>() {
            Some(Trap::Interrupt) => RuntimeError::Timeout {
                extension: self.name.clone(),
                timeout_ms: self.timeout_ms,
            },
            Some(trap) => RuntimeError::Trap {
                extension: self.name.clone(),
                reason: trap.to_string(),
            },
            None => RuntimeError::Trap {
                extension: self.name.clone(),
                reason: error.root_cause().to_string(),
            },
        };

        self.healthy.store(false, Ordering::Release);
        warn!(extension = %self.name, %fault, "extension marked unhealthy");
        fault
    }
}

impl ExtensionInvoker for ExtensionHandle {
    fn extension_name(&self) -> &str {
        &self.name
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    fn resolve_field(
        &self,
        field: &str,
        args_json: &str,
    ) -> Result<Result<String, String>, RuntimeError> {
        if !self.is_healthy() {
            return Err(RuntimeError::Unavailable {
                extension: self.name.clone(),
            });
        }

        let mut sandbox = match self.sandbox.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // A fault may have landed while we waited for the lock.
        if !self.is_healthy() {
            return Err(RuntimeError::Unavailable {
                extension: self.name.clone(),
            });
        }

        let started = Instant::now();
        match sandbox.resolve_field(field, args_json) {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                let fault = self.fault(error);
                tracing::debug!(
                    extension = %self.name,
                    field,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "resolve-field call faulted"
                );
                Err(fault)
            }
        }
    }
}
