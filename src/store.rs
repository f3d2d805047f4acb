//! SQLite store access: file naming, connection opening, row counts.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::LoadError;

pub const DATABASE_EXTENSION: &str = "db";

/// Resolves the database file for a `--db` argument, appending `.db` unless
/// it is already present.
pub fn database_path(db: &str) -> PathBuf {
    let path = Path::new(db);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(DATABASE_EXTENSION) => path.to_path_buf(),
        _ => PathBuf::from(format!("{db}.{DATABASE_EXTENSION}")),
    }
}

pub fn open(path: &Path) -> Result<Connection, LoadError> {
    Connection::open(path)
        .map_err(|err| LoadError::store(format!("Opening database {path:?}"), err))
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<u64, LoadError> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .map_err(|err| LoadError::store(format!("Counting rows in {table}"), err))?;
    Ok(count as u64)
}
