//! Sample-row discovery.
//!
//! The input layout is: header, one unconditionally skipped line (units, a
//! second header line, or a blank line), then data. The first data row with
//! no empty cells is the exemplar used for type inference.

use std::{
    io::{Read, Seek},
    path::Path,
};

use log::debug;

use crate::{
    error::LoadError,
    io_utils::{Row, RowReader},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub header: Vec<String>,
    pub row: Row,
}

/// Reads the header, skips the line after it and returns the first fully
/// populated data row.
///
/// `path` only labels the error when no such row exists.
pub fn find_sample<R: Read + Seek>(mut rows: RowReader<R>, path: &Path) -> Result<Sample, LoadError> {
    let header = rows.read_preamble()?;
    first_complete_row(header, rows, path)
}

/// Scans data rows for the first one with no empty cells.
pub fn first_complete_row<I>(header: Vec<String>, rows: I, path: &Path) -> Result<Sample, LoadError>
where
    I: IntoIterator<Item = Result<Row, LoadError>>,
{
    for row in rows {
        let row = row?;
        if row.cells.iter().all(|cell| !cell.is_empty()) {
            debug!("Using line {} as the sample row", row.line);
            return Ok(Sample { header, row });
        }
    }
    Err(LoadError::SampleNotFound {
        path: path.to_path_buf(),
    })
}
