pub mod cli;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod rules;
pub mod sample;
pub mod schema;
pub mod store;
pub mod summary;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{Parser, error::ErrorKind};
use encoding_rs::Encoding;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::Cli,
    error::LoadError,
    io_utils::RowReader,
    loader::{LoadReport, Loader},
    rules::RuleSet,
    sample::Sample,
    schema::InferenceOptions,
    summary::Summary,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv2sqlite", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let Some(cli) = validate_arguments(env::args_os())? else {
        return Ok(());
    };
    let output = execute(&cli)?;
    println!("{output}");
    Ok(())
}

/// Parses and validates process arguments before any file or store access.
///
/// Returns `Ok(None)` when help or version output was requested and printed.
pub fn validate_arguments<I, T>(args: I) -> Result<Option<Cli>, LoadError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            Ok(None)
        }
        Err(err) => Err(LoadError::Argument(err.render().to_string())),
    }
}

/// Runs the full pipeline for parsed arguments and returns the rendered
/// summary.
pub fn execute(cli: &Cli) -> Result<String> {
    let rule_set = match &cli.rules {
        Some(path) => {
            RuleSet::load(path).with_context(|| format!("Loading rules from {path:?}"))?
        }
        None => RuleSet::default(),
    }
    .with_policy(cli.match_policy);
    if let Some(label) = &cli.fallback_type {
        rules::validate_type_label(label).context("Validating --fallback-type")?;
    }
    let options = InferenceOptions {
        fallback_label: cli.fallback_type.clone(),
        normalize_columns: cli.normalize_columns,
    };
    let delimiter = io_utils::resolve_input_delimiter(&cli.file, cli.delimiter);
    let encoding = io_utils::resolve_encoding(cli.input_encoding.as_deref())?;
    let database = store::database_path(&cli.db);

    info!(
        "Loading '{}' into table '{}' of {:?} (delimiter '{}')",
        cli.file.display(),
        cli.table,
        database,
        printable_delimiter(delimiter)
    );
    let outcome = load_csv(
        &cli.file, &database, &cli.table, delimiter, encoding, &rule_set, &options,
    )?;

    let summary = Summary {
        database: &database,
        table: &cli.table,
        match_policy: rule_set.policy(),
        sample_line: outcome.sample.row.line,
        table_rows: outcome.table_rows,
        report: &outcome.report,
    };
    if cli.json {
        summary.render_json().context("Rendering JSON summary")
    } else {
        Ok(summary.render_text())
    }
}

/// Result of a committed load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub report: LoadReport,
    pub sample: Sample,
    /// Row count read back from the table after commit.
    pub table_rows: u64,
}

/// Samples `input`, infers its schema and loads every data row into `table`.
///
/// The input is read twice: once to find the sample row and once to load.
pub fn load_csv(
    input: &Path,
    database: &Path,
    table: &str,
    delimiter: u8,
    encoding: &'static Encoding,
    rules: &RuleSet,
    options: &InferenceOptions,
) -> Result<LoadOutcome> {
    let sample = sample::find_sample(RowReader::open(input, delimiter, encoding)?, input)
        .with_context(|| format!("Sampling {input:?}"))?;
    debug!("Header: {:?}", sample.header);
    let schema = schema::infer_schema(&sample.header, &sample.row.cells, rules, options)
        .with_context(|| format!("Inferring schema from line {}", sample.row.line))?;
    info!("Inferred schema {schema}");

    let mut conn = store::open(database)?;
    let mut rows = RowReader::open(input, delimiter, encoding)?;
    rows.read_preamble()?;
    let report = Loader::new(&mut conn)
        .load(schema, table, sample.row.cells.len(), rows)
        .with_context(|| format!("Loading {input:?} into {table}"))?;
    let table_rows = store::count_rows(&conn, table)?;
    if table_rows != report.rows_inserted {
        warn!(
            "Table {table} holds {table_rows} row(s) after inserting {}",
            report.rows_inserted
        );
    }
    Ok(LoadOutcome {
        report,
        sample,
        table_rows,
    })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
