//! Per-extension SQLite storage.
//!
//! Each extension owns exactly one connection to its own database file;
//! there are no cross-extension transactions and no shared storage. The
//! guest reaches this surface only through the bridge's `database`
//! capability.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// An open, exclusively owned extension database.
#[derive(Debug)]
pub struct ScopedDb {
    conn: Connection,
    extension: String,
}

impl ScopedDb {
    /// Opens the extension's database file.
    pub fn open(extension: &str, path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        Self::bootstrap(extension, conn)
    }

    /// Opens an in-memory database, for tests.
    pub fn open_in_memory(extension: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(extension, conn)
    }

    fn bootstrap(extension: &str, conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!(extension, "opened extension database");
        Ok(Self {
            conn,
            extension: extension.to_string(),
        })
    }

    /// Returns the owning extension's name.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Runs a query and returns the result rows.
    ///
    /// Row boundaries are preserved: each row is its own ordered column
    /// list, never flattened.
    pub fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Vec<Value>>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(column_count);
            for index in 0..column_count {
                columns.push(row.get::<_, Value>(index)?);
            }
            out.push(columns);
        }
        Ok(out)
    }

    /// Runs a statement and returns the affected-row count.
    pub fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, rusqlite::Error> {
        let affected = self.conn.execute(sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    /// Applies a migration script atomically.
    pub fn migrate(&mut self, script: &str) -> Result<(), rusqlite::Error> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(script)?;
        tx.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> ScopedDb {
        let mut db = ScopedDb::open_in_memory("issues").unwrap();
        db.migrate(
            "CREATE TABLE issues (id INTEGER PRIMARY KEY, title TEXT NOT NULL, open INTEGER NOT NULL);",
        )
        .unwrap();
        db.execute(
            "INSERT INTO issues (id, title, open) VALUES (?1, ?2, ?3)",
            vec![Value::Integer(1), Value::Text("first".into()), Value::Integer(1)],
        )
        .unwrap();
        db.execute(
            "INSERT INTO issues (id, title, open) VALUES (?1, ?2, ?3)",
            vec![Value::Integer(2), Value::Text("second".into()), Value::Integer(0)],
        )
        .unwrap();
        db
    }

    #[test]
    fn test_query_preserves_row_boundaries() {
        let db = seeded_db();
        let rows = db
            .query("SELECT id, title FROM issues ORDER BY id", Vec::new())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Value::Integer(1), Value::Text("first".into())]);
        assert_eq!(rows[1], vec![Value::Integer(2), Value::Text("second".into())]);
    }

    #[test]
    fn test_execute_returns_affected_count() {
        let db = seeded_db();
        let affected = db
            .execute("UPDATE issues SET open = 0", Vec::new())
            .unwrap();
        assert_eq!(affected, 2);
    }

    #[test]
    fn test_migrate_is_atomic() {
        let mut db = ScopedDb::open_in_memory("wiki").unwrap();
        let err = db.migrate("CREATE TABLE pages (id INTEGER); NOT VALID SQL;");
        assert!(err.is_err());

        // The failed script must not leave partial schema behind.
        let rows = db.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'pages'",
            Vec::new(),
        );
        assert!(rows.unwrap().is_empty());
    }

    #[test]
    fn test_typed_parameters_round_trip() {
        let mut db = ScopedDb::open_in_memory("files").unwrap();
        db.migrate("CREATE TABLE blobs (data BLOB, score REAL, note TEXT);")
            .unwrap();
        db.execute(
            "INSERT INTO blobs (data, score, note) VALUES (?1, ?2, ?3)",
            vec![Value::Blob(vec![1, 2, 3]), Value::Real(0.5), Value::Null],
        )
        .unwrap();

        let rows = db
            .query("SELECT data, score, note FROM blobs", Vec::new())
            .unwrap();
        assert_eq!(
            rows[0],
            vec![Value::Blob(vec![1, 2, 3]), Value::Real(0.5), Value::Null]
        );
    }
}
