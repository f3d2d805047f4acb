//! Error kinds surfaced by the load pipeline.
//!
//! Every failure the pipeline can report is a distinct [`LoadError`] variant so
//! the binary can print an actionable message and pick a matching exit code.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Command-line arguments were missing or malformed. Carries clap's rendered
    /// message including the usage text.
    #[error("{0}")]
    Argument(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read input {path:?}: {message}")]
    Input { path: PathBuf, message: String },

    #[error("no sample row found in {path:?}: every data row contains at least one empty cell")]
    SampleNotFound { path: PathBuf },

    #[error(
        "column '{column}' has no matching classification rule for sample value '{value}' (use --fallback-type to assign a default)"
    )]
    SchemaInferenceGap { column: String, value: String },

    #[error("row at line {line} has {found} cell(s) but the sample row has {expected}")]
    ArityMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{context}")]
    Store {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl LoadError {
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LoadError::Input {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn store(context: impl Into<String>, source: rusqlite::Error) -> Self {
        LoadError::Store {
            context: context.into(),
            source,
        }
    }

    /// Process exit code reported by the binary for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Argument(_) => 2,
            LoadError::Config(_) => 3,
            LoadError::Input { .. } => 4,
            LoadError::SampleNotFound { .. } => 5,
            LoadError::SchemaInferenceGap { .. } => 6,
            LoadError::ArityMismatch { .. } => 7,
            LoadError::Store { .. } => 8,
        }
    }
}
