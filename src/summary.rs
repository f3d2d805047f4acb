//! Success summary printed after a load.
//!
//! The plain form lists the database, table and row counts followed by an
//! aligned column/type table; `--json` emits the same data as one object.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::{loader::LoadReport, rules::MatchPolicy};

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub database: &'a Path,
    pub table: &'a str,
    pub match_policy: MatchPolicy,
    pub sample_line: u64,
    pub table_rows: u64,
    #[serde(flatten)]
    pub report: &'a LoadReport,
}

impl Summary<'_> {
    pub fn render_text(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "DB Loading Success!");
        let _ = writeln!(output, "DB Name     : {}", self.database.display());
        let _ = writeln!(output, "Table Name  : {}", self.table);
        let _ = writeln!(output, "Rows Loaded : {}", self.report.rows_inserted);
        let _ = writeln!(output, "Table Rows  : {}", self.table_rows);
        let _ = writeln!(
            output,
            "Table Schema: {} (sampled from line {})",
            self.report.schema, self.sample_line
        );
        let rows = self
            .report
            .schema
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                vec![
                    (idx + 1).to_string(),
                    column.name.clone(),
                    column.label.clone(),
                ]
            })
            .collect::<Vec<_>>();
        output.push('\n');
        output.push_str(&render_table(&["#", "column", "type"], &rows));
        output
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths));
    let separator = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}
