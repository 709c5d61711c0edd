//! Wasmtime-backed extension sandboxes.
//!
//! One shared engine drives every extension instance. Each instance owns a
//! `Store` with a memory ceiling, a fuel budget per call, and an epoch
//! deadline per call; exceeding the deadline interrupts the guest.

use crate::bindings::{
    api_info_from_wit, fragment_from_wit, wit_guest, ExtensionWorld,
};
use crate::descriptor::{ApiInfo, ExtensionDescriptor};
use crate::db::ScopedDb;
use crate::error::LoadError;
use crate::host::HostState;
use grove_schema::SchemaFragment;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wasmtime::component::{Component, Linker};
use wasmtime::{Config, Engine, ResourceLimiter, Store};

/// How often the shared ticker advances the engine epoch.
const EPOCH_TICK: Duration = Duration::from_millis(10);

const MAX_TABLE_ELEMENTS: usize = 20_000;

/// Resource limits applied to one extension instance.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Memory ceiling in bytes.
    pub max_memory_bytes: usize,
    /// Fuel budget per guest call.
    pub fuel_per_call: u64,
    /// Deadline per guest call in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: 64 * 1024 * 1024,
            fuel_per_call: 1_000_000_000,
            call_timeout_ms: 5_000,
        }
    }
}

/// Enforces the memory ceiling on a store, tracking current usage.
pub(crate) struct MemoryLimiter {
    max_memory: usize,
    current_memory: usize,
}

impl MemoryLimiter {
    pub(crate) fn new(max_memory: usize) -> Self {
        Self {
            max_memory,
            current_memory: 0,
        }
    }
}

impl ResourceLimiter for MemoryLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        self.current_memory = desired;
        Ok(desired <= self.max_memory)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(desired <= MAX_TABLE_ELEMENTS)
    }
}

/// The shared wasmtime engine plus the epoch ticker driving call deadlines.
pub struct SandboxEngine {
    engine: Engine,
}

impl SandboxEngine {
    /// Creates the engine and starts the ticker thread.
    pub fn new() -> wasmtime::Result<Arc<Self>> {
        let mut config = Config::new();
        config.wasm_component_model(true);
        config.consume_fuel(true);
        config.epoch_interruption(true);

        let engine = Engine::new(&config)?;

        let ticker_engine = engine.clone();
        std::thread::Builder::new()
            .name("grove-epoch-ticker".into())
            .spawn(move || loop {
                std::thread::sleep(EPOCH_TICK);
                ticker_engine.increment_epoch();
            })?;

        Ok(Arc::new(Self { engine }))
    }

    /// Converts a call timeout into epoch ticks.
    pub(crate) fn deadline_ticks(timeout_ms: u64) -> u64 {
        (timeout_ms / EPOCH_TICK.as_millis() as u64).max(1)
    }
}

/// One instantiated extension: a store plus its component bindings.
///
/// The sandbox handle is an opaque, exclusively owned capability. Guest
/// calls are synchronous from the guest's point of view; the guest cannot
/// suspend mid-call.
pub struct ExtensionSandbox {
    name: String,
    limits: ResourceLimits,
    store: Store<HostState>,
    bindings: ExtensionWorld,
}

impl ExtensionSandbox {
    /// Compiles and instantiates an extension component.
    pub fn instantiate(
        engine: &SandboxEngine,
        name: &str,
        wasm_path: &Path,
        limits: ResourceLimits,
    ) -> Result<Self, LoadError> {
        let fail = |reason: String| LoadError::InstantiationFailed {
            extension: name.to_string(),
            reason,
        };

        let wasm_bytes = std::fs::read(wasm_path)
            .map_err(|e| fail(format!("failed to read {}: {e}", wasm_path.display())))?;

        let component =
            Component::new(&engine.engine, &wasm_bytes).map_err(|e| fail(e.to_string()))?;

        let mut linker = Linker::new(&engine.engine);
        ExtensionWorld::add_to_linker(&mut linker, |state: &mut HostState| state)
            .map_err(|e| fail(e.to_string()))?;
        wasmtime_wasi::add_to_linker_sync(&mut linker).map_err(|e| fail(e.to_string()))?;

        let state = HostState::new(name, &limits);
        let mut store = Store::new(&engine.engine, state);
        store.limiter(|state| &mut state.limiter);

        let bindings = ExtensionWorld::instantiate(&mut store, &component, &linker)
            .map_err(|e| fail(e.to_string()))?;

        info!(extension = name, path = %wasm_path.display(), "extension instantiated");

        Ok(Self {
            name: name.to_string(),
            limits,
            store,
            bindings,
        })
    }

    /// Returns the extension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens the extension's database and attaches it to the capability
    /// surface. Must happen before `init` so the guest can use storage from
    /// its first call.
    pub fn attach_database(&mut self, path: &Path) -> Result<(), rusqlite::Error> {
        let db = ScopedDb::open(&self.name, path)?;
        self.store.data_mut().db = Some(db);
        Ok(())
    }

    /// Arms the fuel budget and epoch deadline for the next guest call.
    fn prepare_call(&mut self) -> wasmtime::Result<()> {
        self.store.set_fuel(self.limits.fuel_per_call)?;
        self.store
            .set_epoch_deadline(SandboxEngine::deadline_ticks(self.limits.call_timeout_ms));
        Ok(())
    }

    /// Calls the guest's capability handshake.
    pub fn get_api_info(&mut self) -> wasmtime::Result<ApiInfo> {
        self.prepare_call()?;
        let info = self
            .bindings
            .grove_extension_guest()
            .call_get_api_info(&mut self.store)?;
        Ok(api_info_from_wit(info))
    }

    /// Calls the guest's `init` with its descriptor.
    pub fn init(&mut self, descriptor: &ExtensionDescriptor) -> wasmtime::Result<Result<(), String>> {
        self.prepare_call()?;
        let config = wit_guest::InitConfig {
            name: descriptor.name.clone(),
            db_path: descriptor.db_path.display().to_string(),
            config: descriptor.config.clone(),
            api_version: descriptor.api_version,
            capabilities: descriptor.capabilities.clone(),
        };
        self.bindings
            .grove_extension_guest()
            .call_init(&mut self.store, &config)
    }

    /// Calls the guest's `migrate`.
    pub fn migrate(&mut self, db_path: &str) -> wasmtime::Result<Result<(), String>> {
        self.prepare_call()?;
        self.bindings
            .grove_extension_guest()
            .call_migrate(&mut self.store, db_path)
    }

    /// Calls the guest's `get-schema` and converts the structured result.
    pub fn get_schema(&mut self) -> wasmtime::Result<SchemaFragment> {
        self.prepare_call()?;
        let types = self
            .bindings
            .grove_extension_guest()
            .call_get_schema(&mut self.store)?;
        Ok(fragment_from_wit(types))
    }

    /// Calls the guest's `resolve-field`.
    ///
    /// The outer result is a sandbox fault; the inner result is the guest's
    /// own ok/error outcome.
    pub fn resolve_field(
        &mut self,
        field: &str,
        args_json: &str,
    ) -> wasmtime::Result<Result<String, String>> {
        self.prepare_call()?;
        self.bindings
            .grove_extension_guest()
            .call_resolve_field(&mut self.store, field, args_json)
    }
}
