use std::path::PathBuf;

use clap::Parser;

use crate::rules::MatchPolicy;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load a CSV file into a SQLite table, inferring column types from a sample row",
    long_about = None
)]
pub struct Cli {
    /// Input CSV file (first row header, second row skipped, data after)
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,
    /// Output database name; `.db` is appended when missing
    #[arg(short = 'd', long = "db")]
    pub db: String,
    /// Target table name
    #[arg(short = 't', long = "table", value_parser = parse_identifier)]
    pub table: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file with ordered `label`/`pattern` classification rules
    #[arg(long)]
    pub rules: Option<PathBuf>,
    /// Which matching rule decides a column's type
    #[arg(long = "match-policy", value_enum, default_value = "last")]
    pub match_policy: MatchPolicy,
    /// Type assigned to columns whose sample value matches no rule
    #[arg(long = "fallback-type")]
    pub fallback_type: Option<String>,
    /// Rewrite header names into snake_case identifiers
    #[arg(long = "normalize-columns")]
    pub normalize_columns: bool,
    /// Print the load summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_identifier(value: &str) -> Result<String, String> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(value.to_string())
    } else {
        Err(format!(
            "'{value}' is not a plain identifier (letters, digits and '_', not starting with a digit)"
        ))
    }
}
