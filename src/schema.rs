//! Schema model and type inference from a single sample row.
//!
//! [`infer_schema`] zips the header with the sample row, classifies each
//! cell against a [`RuleSet`], and returns the ordered column→label mapping
//! used for table creation. Columns whose sample cell matches no rule either
//! receive a caller-supplied fallback label or fail inference; an empty type
//! token never leaves this module.

use std::fmt;

use heck::ToSnakeCase;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{error::LoadError, rules::RuleSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn label_of(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.label.as_str())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, column) in self.columns.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", column.name, column.label)?;
        }
        write!(f, "}}")
    }
}

/// Options controlling how inference treats headers and unmatched cells.
#[derive(Debug, Clone, Default)]
pub struct InferenceOptions {
    /// Label for columns whose sample cell matches no rule. `None` fails the run.
    pub fallback_label: Option<String>,
    /// Rewrite header names into snake_case identifiers.
    pub normalize_columns: bool,
}

pub fn infer_schema(
    header: &[String],
    sample: &[String],
    rules: &RuleSet,
    options: &InferenceOptions,
) -> Result<Schema, LoadError> {
    if header.len() != sample.len() {
        debug!(
            "Header has {} column(s) and sample row has {}; extra entries are ignored",
            header.len(),
            sample.len()
        );
    }
    let mut columns = Vec::with_capacity(header.len().min(sample.len()));
    for (name, cell) in header.iter().zip(sample) {
        let name = if options.normalize_columns {
            normalize_column_name(name)
        } else {
            name.clone()
        };
        let mut label = rules.classify(cell);
        if label.is_empty() {
            match &options.fallback_label {
                Some(fallback) => {
                    warn!(
                        "Column '{name}' sample value '{cell}' matched no rule; using {fallback}"
                    );
                    label = fallback.clone();
                }
                None => {
                    return Err(LoadError::SchemaInferenceGap {
                        column: name,
                        value: cell.clone(),
                    });
                }
            }
        }
        debug!("Column '{name}' inferred as {label} from '{cell}'");
        columns.push(ColumnDef { name, label });
    }
    Ok(Schema { columns })
}

/// Converts a raw header into a snake_case identifier, replacing anything
/// outside `[a-z0-9_]` with `_` and prefixing a leading digit.
pub fn normalize_column_name(name: &str) -> String {
    let snake = name.to_snake_case();
    let mut normalized = snake
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect::<String>();
    if normalized.is_empty() || normalized.starts_with(|c: char| c.is_ascii_digit()) {
        normalized.insert(0, '_');
    }
    normalized
}
