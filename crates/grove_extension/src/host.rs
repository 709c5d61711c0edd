//! Host-side capability implementations.
//!
//! `HostState` lives inside each sandbox's store and is the only surface
//! sandboxed code can touch: scoped logging and the extension's own
//! database. Capability calls run on the host but block the guest until
//! they complete; the guest cannot yield mid-call.

use crate::bindings::{wit_database, wit_log};
use crate::db::ScopedDb;
use crate::sandbox::{MemoryLimiter, ResourceLimits};
use rusqlite::types::Value as SqlValue;
use tracing::{debug, error, info, trace, warn};
use wasmtime::component::ResourceTable;
use wasmtime_wasi::{IoView, WasiCtx, WasiCtxBuilder, WasiView};

/// State stored in each extension's `wasmtime::Store`.
pub(crate) struct HostState {
    pub(crate) extension: String,
    /// The extension's exclusively owned database; opened by the loader
    /// before `init` runs.
    pub(crate) db: Option<ScopedDb>,
    pub(crate) limiter: MemoryLimiter,
    wasi_ctx: WasiCtx,
    resource_table: ResourceTable,
}

impl HostState {
    pub(crate) fn new(extension: &str, limits: &ResourceLimits) -> Self {
        Self {
            extension: extension.to_string(),
            db: None,
            limiter: MemoryLimiter::new(limits.max_memory_bytes),
            // No filesystem or network access and an empty environment.
            wasi_ctx: WasiCtxBuilder::new().build(),
            resource_table: ResourceTable::new(),
        }
    }
}

impl IoView for HostState {
    fn table(&mut self) -> &mut ResourceTable {
        &mut self.resource_table
    }
}

impl WasiView for HostState {
    fn ctx(&mut self) -> &mut WasiCtx {
        &mut self.wasi_ctx
    }
}

impl wit_log::Host for HostState {
    fn log(&mut self, level: wit_log::Level, message: String) {
        match level {
            wit_log::Level::Trace => trace!(extension = %self.extension, "{message}"),
            wit_log::Level::Debug => debug!(extension = %self.extension, "{message}"),
            wit_log::Level::Info => info!(extension = %self.extension, "{message}"),
            wit_log::Level::Warn => warn!(extension = %self.extension, "{message}"),
            wit_log::Level::Error => error!(extension = %self.extension, "{message}"),
        }
    }
}

impl wit_database::Host for HostState {
    fn query(
        &mut self,
        sql: String,
        params: Vec<wit_database::Value>,
    ) -> Result<Vec<wit_database::Row>, String> {
        let db = self.db.as_ref().ok_or_else(database_not_attached)?;
        let params = params.into_iter().map(sql_value_from_wit).collect();
        let rows = db.query(&sql, params).map_err(|e| e.to_string())?;

        Ok(rows
            .into_iter()
            .map(|columns| wit_database::Row {
                columns: columns.into_iter().map(wit_value_from_sql).collect(),
            })
            .collect())
    }

    fn execute(&mut self, sql: String, params: Vec<wit_database::Value>) -> Result<u64, String> {
        let db = self.db.as_ref().ok_or_else(database_not_attached)?;
        let params = params.into_iter().map(sql_value_from_wit).collect();
        db.execute(&sql, params).map_err(|e| e.to_string())
    }

    fn migrate(&mut self, script: String) -> Result<(), String> {
        let db = self.db.as_mut().ok_or_else(database_not_attached)?;
        db.migrate(&script).map_err(|e| e.to_string())
    }
}

fn database_not_attached() -> String {
    "database capability is not available".to_string()
}

fn sql_value_from_wit(value: wit_database::Value) -> SqlValue {
    match value {
        wit_database::Value::Null => SqlValue::Null,
        wit_database::Value::Integer(v) => SqlValue::Integer(v),
        wit_database::Value::Real(v) => SqlValue::Real(v),
        wit_database::Value::Text(v) => SqlValue::Text(v),
        wit_database::Value::Blob(v) => SqlValue::Blob(v),
    }
}

fn wit_value_from_sql(value: SqlValue) -> wit_database::Value {
    match value {
        SqlValue::Null => wit_database::Value::Null,
        SqlValue::Integer(v) => wit_database::Value::Integer(v),
        SqlValue::Real(v) => wit_database::Value::Real(v),
        SqlValue::Text(v) => wit_database::Value::Text(v),
        SqlValue::Blob(v) => wit_database::Value::Blob(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::wit_database::Host;

    fn state_with_db() -> HostState {
        let mut state = HostState::new("issues", &ResourceLimits::default());
        state.db = Some(ScopedDb::open_in_memory("issues").unwrap());
        state
    }

    #[test]
    fn test_query_without_database_fails_with_fixed_error() {
        let mut state = HostState::new("issues", &ResourceLimits::default());
        let err = state.query("SELECT 1".into(), Vec::new()).unwrap_err();
        assert_eq!(err, "database capability is not available");
    }

    #[test]
    fn test_capability_round_trip_preserves_rows() {
        let mut state = state_with_db();
        state
            .migrate("CREATE TABLE t (a INTEGER, b TEXT);".into())
            .unwrap();

        let affected = state
            .execute(
                "INSERT INTO t (a, b) VALUES (?1, ?2), (?3, ?4)".into(),
                vec![
                    wit_database::Value::Integer(1),
                    wit_database::Value::Text("x".into()),
                    wit_database::Value::Integer(2),
                    wit_database::Value::Text("y".into()),
                ],
            )
            .unwrap();
        assert_eq!(affected, 2);

        let rows = state
            .query("SELECT a, b FROM t ORDER BY a".into(), Vec::new())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns.len(), 2);
        assert!(matches!(rows[1].columns[0], wit_database::Value::Integer(2)));
    }
}
