use rusqlite::{Connection, OptionalExtension};

use super::KeyValueStore;
use crate::error::AppError;

/// `KeyValueStore` over the `kv_entries` table of a migrated workspace database.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        let mut conn = crate::db::open_in_memory()?;
        crate::db::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| {
                AppError::new("KV_READ_FAILED", "Failed to read key-value entry")
                    .with_details(format!("key={key}; err={e}"))
            })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.conn
            .execute(
                r#"
        INSERT INTO kv_entries(key, value, updated_at)
        VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
                [key, value],
            )
            .map_err(|e| {
                AppError::new("KV_WRITE_FAILED", "Failed to write key-value entry")
                    .with_details(format!("key={key}; err={e}"))
                    .with_retryable(true)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_kv_upserts() {
        let mut kv = SqliteKv::open_in_memory().expect("open");
        assert_eq!(kv.get("reports").unwrap(), None);
        kv.set("reports", "[]").unwrap();
        kv.set("reports", "[1]").unwrap();
        assert_eq!(kv.get("reports").unwrap().as_deref(), Some("[1]"));

        let rows: i64 = kv
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
