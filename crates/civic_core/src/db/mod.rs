//! SQLite file backing the report key-value store, and its schema migrations.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::Connection;

use crate::error::AppError;

/// Named schema step. Names are recorded in `_migrations` and never re-run.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_init.sql",
    sql: include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../migrations/0001_init.sql"
    )),
}];

fn store_err(code: &str, message: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> AppError {
    let code = code.to_string();
    let message = message.into();
    move |e| AppError::new(code, message).with_details(e.to_string())
}

pub fn open(path: &Path) -> Result<Connection, AppError> {
    Connection::open(path).map_err(store_err(
        "KV_STORE_OPEN_FAILED",
        format!("Could not open report store file {}", path.display()),
    ))
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    Connection::open_in_memory().map_err(store_err(
        "KV_STORE_OPEN_FAILED",
        "Could not open an in-memory report store",
    ))
}

/// Names of the schema steps already recorded in this report store.
pub fn applied_migrations(conn: &Connection) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn
        .prepare("SELECT name FROM _migrations")
        .map_err(store_err(
            "KV_SCHEMA_READ_FAILED",
            "Could not read the report store schema history",
        ))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<Result<HashSet<_>, _>>())
        .map_err(store_err(
            "KV_SCHEMA_READ_FAILED",
            "Could not list applied report store schema steps",
        ))?;
    Ok(names)
}

/// Brings the report store schema up to date. Each pending step runs in its own
/// transaction together with its `_migrations` row.
pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
           name TEXT PRIMARY KEY NOT NULL,
           applied_at TEXT NOT NULL
         );",
    )
    .map_err(store_err(
        "KV_SCHEMA_INIT_FAILED",
        "Could not create the report store schema history table",
    ))?;

    let applied = applied_migrations(conn)?;
    for step in MIGRATIONS.iter().filter(|m| !applied.contains(m.name)) {
        let failed = format!("Report store schema step {} failed", step.name);

        let tx = conn
            .transaction()
            .map_err(store_err("KV_SCHEMA_STEP_FAILED", failed.clone()))?;
        tx.execute_batch(step.sql)
            .map_err(store_err("KV_SCHEMA_STEP_FAILED", failed.clone()))?;
        tx.execute(
            "INSERT INTO _migrations(name, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
            [step.name],
        )
        .map_err(store_err("KV_SCHEMA_STEP_FAILED", failed.clone()))?;
        tx.commit()
            .map_err(store_err("KV_SCHEMA_STEP_FAILED", failed))?;

        tracing::debug!(step = step.name, "report store schema step applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;

    #[test]
    fn migrations_create_kv_table() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("migrate");

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='kv_entries'")
            .unwrap();
        let name: Option<String> = stmt.query_row([], |row| row.get(0)).optional().unwrap();
        assert_eq!(name.as_deref(), Some("kv_entries"));
    }

    #[test]
    fn migrate_twice_is_a_no_op() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("first");
        migrate(&mut conn).expect("second");
        let applied = applied_migrations(&conn).expect("applied");
        assert_eq!(applied.len(), 1);
        assert!(applied.contains("0001_init.sql"));
    }

    #[test]
    fn open_failure_names_the_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("reports.sqlite");
        let err = open(&path).unwrap_err();
        assert_eq!(err.code, "KV_STORE_OPEN_FAILED");
        assert!(err.message.contains("reports.sqlite"), "{}", err.message);
    }
}
