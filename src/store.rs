//! The relational store backing the managed table.
//!
//! A single SQLite connection guarded by a mutex. Every operation takes the
//! lock for its own duration only and runs its statements in its own
//! transaction; nothing is held across operations.

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension};

pub struct Store {
    conn: Mutex<Connection>,
    location: String,
}

impl Store {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                // Let rusqlite report the failure if this did not work.
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(path)?;
        tracing::info!("Opened database {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            location: ":memory:".to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Locks the connection for one operation.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Whether a table named `table` exists.
    pub fn has_table(&self, table: &str) -> rusqlite::Result<bool> {
        let conn = self.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Name and declared type of every column of `table`, in table order.
    /// Empty when the table does not exist.
    pub fn table_columns(&self, table: &str) -> rusqlite::Result<Vec<(String, String)>> {
        let conn = self.lock();
        read_table_columns(&conn, table)
    }
}

/// Reads the column list of `table` through an already locked connection
/// (or a transaction, which derefs to one).
pub fn read_table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
    Ok(columns)
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Store({})", self.location)
    }
}

/// Quotes an identifier for use in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("agent_table"), "\"agent_table\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_has_table() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.has_table("t").unwrap());

        store.lock().execute_batch("CREATE TABLE t (a TEXT)").unwrap();
        assert!(store.has_table("t").unwrap());
    }

    #[test]
    fn test_table_columns() {
        let store = Store::open_in_memory().unwrap();
        store
            .lock()
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .unwrap();

        let columns = store.table_columns("t").unwrap();
        assert_eq!(
            columns,
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("name".to_string(), "TEXT".to_string()),
                ("score".to_string(), "REAL".to_string()),
            ]
        );
        assert!(store.table_columns("missing").unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db").join("agentDB.db");
        let store = Store::open(&path).unwrap();
        store.lock().execute_batch("CREATE TABLE t (a TEXT)").unwrap();
        assert!(path.exists());
    }
}
