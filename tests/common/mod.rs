#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Path of `name` inside the workspace, without creating it.
    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

/// Header, units row, and three data rows; the first data row has a blank cell.
pub const PEOPLE_CSV: &str = "\
name,age,score,joined
text,years,points,date
alice,,1.5,2020-01-01
bob,-5,-5.2,2020-01-15
carol,41,7.25,2021-12-31
";

pub fn table_row_count(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).expect("open database");
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count rows")
}

pub fn table_exists(db: &Path, table: &str) -> bool {
    let conn = Connection::open(db).expect("open database");
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )
    .expect("query sqlite_master")
}

/// Declared column types in table order, as reported by SQLite.
pub fn declared_types(db: &Path, table: &str) -> Vec<(String, String)> {
    let conn = Connection::open(db).expect("open database");
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .expect("prepare pragma");
    stmt.query_map([], |row| Ok((row.get(1)?, row.get(2)?)))
        .expect("query pragma")
        .collect::<Result<Vec<_>, _>>()
        .expect("read pragma rows")
}
