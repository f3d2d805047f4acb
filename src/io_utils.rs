//! I/O utilities for CSV reading, encoding, and delimiter resolution.
//!
//! All input file access in csv2sqlite flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Row streaming**: [`RowReader`] yields decoded rows tagged with the
//!   physical line they started on. The underlying reader is flexible so that
//!   short or long rows reach the loader and are reported there instead of
//!   aborting inside the CSV decoder.

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::LoadError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, LoadError> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| LoadError::Config(format!("Unknown encoding '{value}'")))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// One decoded input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line on which the record starts.
    pub line: u64,
    pub cells: Vec<String>,
}

/// Streams decoded rows from a delimited file.
///
/// A fresh reader yields every record, header included. After
/// [`RowReader::read_preamble`] it yields data rows only.
pub struct RowReader<R> {
    path: PathBuf,
    reader: csv::Reader<R>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
}

impl RowReader<BufReader<File>> {
    pub fn open(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|err| LoadError::input(path, err.to_string()))?;
        Ok(Self::from_reader(path, BufReader::new(file), delimiter, encoding))
    }
}

impl<R: Read + Seek> RowReader<R> {
    pub fn from_reader(path: &Path, reader: R, delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            path: path.to_path_buf(),
            reader: open_csv_reader(reader, delimiter),
            encoding,
            record: csv::ByteRecord::new(),
        }
    }

    /// Reads the header and discards exactly one physical line after it,
    /// leaving the reader at the first data row. Returns an empty header for
    /// empty input.
    pub fn read_preamble(&mut self) -> Result<Vec<String>, LoadError> {
        let Some(header) = self.next_row()? else {
            return Ok(Vec::new());
        };
        if self.skip_blank_line()? {
            debug!("Line after header is blank; nothing else skipped");
        } else if let Some(skipped) = self.next_row()? {
            debug!("Skipping line {} after header", skipped.line);
        }
        Ok(header.cells)
    }

    /// Consumes the line at the current position when it is empty.
    ///
    /// The CSV decoder silently drops blank lines, so a blank line after the
    /// header must be consumed here or the first data record would be taken
    /// for the skipped row.
    fn skip_blank_line(&mut self) -> Result<bool, LoadError> {
        let pos = self.reader.position().clone();
        // Start one byte early to see how the header line was terminated.
        let start = pos.byte().saturating_sub(1);
        let peeked = peek_bytes(self.reader.get_mut(), start, 4)
            .map_err(|err| LoadError::input(&self.path, err.to_string()))?;

        let mut offset = 1;
        let mut line = pos.line();
        // Only the `\r` of a CRLF terminator has been consumed so far.
        if peeked.first() == Some(&b'\r') && peeked.get(1) == Some(&b'\n') {
            offset += 1;
            line += 1;
        }
        let blank_len = match (peeked.get(offset), peeked.get(offset + 1)) {
            (Some(b'\r'), Some(b'\n')) => 2,
            (Some(b'\r' | b'\n'), _) => 1,
            _ => 0,
        };

        let mut resume = pos;
        if blank_len > 0 {
            let newlines = peeked[offset..offset + blank_len]
                .iter()
                .filter(|b| **b == b'\n')
                .count() as u64;
            resume
                .set_byte(start + (offset + blank_len) as u64)
                .set_line(line + newlines);
        }
        self.reader
            .seek_raw(SeekFrom::Start(resume.byte()), resume)
            .map_err(|err| LoadError::input(&self.path, err.to_string()))?;
        Ok(blank_len > 0)
    }

    fn next_row(&mut self) -> Result<Option<Row>, LoadError> {
        let more = self
            .reader
            .read_byte_record(&mut self.record)
            .map_err(|err| LoadError::input(&self.path, err.to_string()))?;
        if !more {
            return Ok(None);
        }
        let line = self.record.position().map(|pos| pos.line()).unwrap_or(0);
        let cells = self
            .record
            .iter()
            .map(|field| {
                decode_bytes(field, self.encoding).ok_or_else(|| {
                    LoadError::input(
                        &self.path,
                        format!(
                            "line {line}: failed to decode text with encoding {}",
                            self.encoding.name()
                        ),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Row { line, cells }))
    }
}

impl<R: Read + Seek> Iterator for RowReader<R> {
    type Item = Result<Row, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

fn peek_bytes<R: Read + Seek>(reader: &mut R, start: u64, len: u64) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(start))?;
    let mut bytes = Vec::with_capacity(len as usize);
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;
    use std::io::Cursor;

    fn reader(text: &'static [u8], encoding: &'static Encoding) -> RowReader<Cursor<&'static [u8]>> {
        RowReader::from_reader(Path::new("inline.csv"), Cursor::new(text), b',', encoding)
    }

    fn rows_from(text: &'static [u8], encoding: &'static Encoding) -> Vec<Row> {
        reader(text, encoding)
            .collect::<Result<Vec<_>, _>>()
            .expect("rows decode")
    }

    fn data_rows(text: &'static [u8]) -> (Vec<String>, Vec<Row>) {
        let mut rows = reader(text, UTF_8);
        let header = rows.read_preamble().expect("preamble");
        let data = rows.collect::<Result<Vec<_>, _>>().expect("rows decode");
        (header, data)
    }

    #[test]
    fn delimiter_defaults_follow_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn unknown_encoding_is_config_error() {
        assert!(matches!(
            resolve_encoding(Some("klingon")),
            Err(LoadError::Config(_))
        ));
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap(), WINDOWS_1252);
    }

    #[test]
    fn row_reader_keeps_ragged_rows_and_lines() {
        let rows = rows_from(b"a,b,c\nunits\n1,2,3\n4,5\n", UTF_8);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].cells, vec!["units"]);
        assert_eq!(rows[3].line, 4);
        assert_eq!(rows[3].cells, vec!["4", "5"]);
    }

    #[test]
    fn row_reader_decodes_legacy_encodings() {
        let rows = rows_from(b"name\n-\ncaf\xe9\n", WINDOWS_1252);
        assert_eq!(rows[2].cells, vec!["café"]);
    }

    #[test]
    fn preamble_skips_populated_second_line() {
        let (header, data) = data_rows(b"name,age\nunits,years\nalice,30\nbob,41\n");
        assert_eq!(header, vec!["name", "age"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].cells, vec!["alice", "30"]);
        assert_eq!(data[0].line, 3);
    }

    #[test]
    fn preamble_treats_blank_second_line_as_skipped_row() {
        let (header, data) = data_rows(b"name,age\n\nalice,30\nbob,41\n");
        assert_eq!(header, vec!["name", "age"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].cells, vec!["alice", "30"]);
        assert_eq!(data[0].line, 3);
        assert_eq!(data[1].line, 4);
    }

    #[test]
    fn preamble_handles_crlf_terminators() {
        let (_, blank) = data_rows(b"name,age\r\n\r\nalice,30\r\nbob,41\r\n");
        assert_eq!(blank.len(), 2);
        assert_eq!(blank[0].cells, vec!["alice", "30"]);
        assert_eq!(blank[0].line, 3);

        let (_, populated) = data_rows(b"name,age\r\nunits,years\r\nalice,30\r\n");
        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].cells, vec!["alice", "30"]);
    }

    #[test]
    fn preamble_skips_only_one_of_several_blank_lines() {
        // Later blank lines are dropped by the decoder and never count as rows.
        let (_, data) = data_rows(b"a\n\n\n1\n");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].cells, vec!["1"]);
    }

    #[test]
    fn preamble_on_short_input() {
        assert_eq!(data_rows(b""), (Vec::new(), Vec::new()));
        let (header, data) = data_rows(b"a,b");
        assert_eq!(header, vec!["a", "b"]);
        assert!(data.is_empty());
        let (_, data) = data_rows(b"a,b\nunits\n");
        assert!(data.is_empty());
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = RowReader::open(Path::new("/definitely/not/here.csv"), b',', UTF_8)
            .err()
            .expect("open fails");
        assert_eq!(err.exit_code(), 4);
    }
}
