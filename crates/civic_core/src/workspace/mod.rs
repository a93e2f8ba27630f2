use std::path::Path;

use rusqlite::Connection;

use crate::codec::{decode_collection, REPORTS_KEY};
use crate::error::AppError;
use crate::kv::{KeyValueStore, SqliteKv};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct WorkspaceMetadata {
    pub db_path: String,
    pub is_empty: bool,
    pub report_count: i64,
}

fn validate_db_path(path: &Path) -> Result<(), AppError> {
    if path.as_os_str().is_empty() {
        return Err(AppError::new(
            "WORKSPACE_INVALID_PATH",
            "Workspace DB path is empty",
        ));
    }
    if path.exists() && path.is_dir() {
        return Err(AppError::new(
            "WORKSPACE_INVALID_PATH",
            "Workspace DB path must be a file (not a directory)",
        )
        .with_details(path.display().to_string()));
    }
    Ok(())
}

fn report_count(kv: &SqliteKv) -> Result<i64, AppError> {
    let raw = kv.get(REPORTS_KEY)?;
    Ok(decode_collection(raw.as_deref()).reports.len() as i64)
}

fn remap(code: &str, message: &str, e: AppError) -> AppError {
    let details = e.details.clone().unwrap_or_else(|| e.to_string());
    AppError::new(code, message).with_details(details)
}

pub fn open_workspace_connection(db_path: &Path) -> Result<Connection, AppError> {
    validate_db_path(db_path)?;

    if !db_path.exists() {
        return Err(AppError::new(
            "WORKSPACE_DB_NOT_FOUND",
            "Workspace database file not found",
        )
        .with_details(db_path.display().to_string()));
    }

    let mut conn = crate::db::open(db_path)
        .map_err(|e| remap("WORKSPACE_OPEN_FAILED", "Failed to open workspace database", e))?;

    crate::db::migrate(&mut conn).map_err(|e| {
        remap(
            "WORKSPACE_MIGRATION_FAILED",
            "Failed to migrate workspace database",
            e,
        )
    })?;

    Ok(conn)
}

pub fn create_workspace_connection(db_path: &Path) -> Result<Connection, AppError> {
    validate_db_path(db_path)?;

    if db_path.exists() {
        return Err(AppError::new(
            "WORKSPACE_CREATE_FAILED",
            "Workspace DB file already exists",
        )
        .with_details(db_path.display().to_string()));
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                "WORKSPACE_CREATE_FAILED",
                "Failed to create workspace directory",
            )
            .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }

    // Opening a non-existent SQLite path creates the file.
    let mut conn = crate::db::open(db_path).map_err(|e| {
        remap(
            "WORKSPACE_CREATE_FAILED",
            "Failed to create workspace database",
            e,
        )
    })?;

    crate::db::migrate(&mut conn).map_err(|e| {
        remap(
            "WORKSPACE_MIGRATION_FAILED",
            "Failed to migrate newly created workspace database",
            e,
        )
    })?;

    tracing::info!(path = %db_path.display(), "workspace created");
    Ok(conn)
}

/// Opens the workspace at `db_path`, creating it first when the file does not exist.
pub fn open_or_create_workspace_kv(db_path: &Path) -> Result<SqliteKv, AppError> {
    let conn = if db_path.exists() {
        open_workspace_connection(db_path)?
    } else {
        create_workspace_connection(db_path)?
    };
    Ok(SqliteKv::new(conn))
}

fn metadata(db_path: &Path, conn: Connection) -> Result<WorkspaceMetadata, AppError> {
    let kv = SqliteKv::new(conn);
    let count = report_count(&kv)?;
    Ok(WorkspaceMetadata {
        db_path: db_path.to_string_lossy().to_string(),
        is_empty: count == 0,
        report_count: count,
    })
}

pub fn open_workspace(db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
    metadata(db_path, open_workspace_connection(db_path)?)
}

pub fn create_workspace(db_path: &Path) -> Result<WorkspaceMetadata, AppError> {
    metadata(db_path, create_workspace_connection(db_path)?)
}
