//! Table creation and bulk insert.
//!
//! The loader synthesizes a `CREATE TABLE` statement from the inferred
//! [`Schema`] and a positional `INSERT` with one placeholder per sample cell,
//! then runs both inside a single transaction. Any failure drops the
//! transaction, so neither the table nor a partial batch becomes visible.
//!
//! Table and column names are interpolated verbatim; callers validate them.

use itertools::Itertools;
use log::{debug, info};
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

use crate::{error::LoadError, io_utils::Row, schema::Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    TableCreating,
    TableCreated,
    Inserting,
    Committed,
    Failed,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Committed | LoadState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub schema: Schema,
    pub rows_inserted: u64,
}

pub fn create_table_statement(table: &str, schema: &Schema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|column| format!("{} {}", column.name, column.label))
        .join(", ");
    format!("CREATE TABLE {table} ({columns})")
}

pub fn insert_statement(table: &str, arity: usize) -> String {
    let placeholders = std::iter::repeat_n("?", arity).join(", ");
    format!("INSERT INTO {table} VALUES ({placeholders})")
}

pub struct Loader<'conn> {
    conn: &'conn mut Connection,
    state: LoadState,
}

impl<'conn> Loader<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self {
            conn,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Creates `table` from `schema` and inserts every row of `rows`.
    ///
    /// Each row must have exactly `arity` cells (the sample row's width).
    pub fn load<I>(
        &mut self,
        schema: Schema,
        table: &str,
        arity: usize,
        rows: I,
    ) -> Result<LoadReport, LoadError>
    where
        I: IntoIterator<Item = Result<Row, LoadError>>,
    {
        if self.state != LoadState::Idle {
            return Err(LoadError::Config(format!(
                "Loader already used (state {:?})",
                self.state
            )));
        }
        match self.run(&schema, table, arity, rows) {
            Ok(rows_inserted) => Ok(LoadReport {
                schema,
                rows_inserted,
            }),
            Err(err) => {
                advance(&mut self.state, LoadState::Failed);
                Err(err)
            }
        }
    }

    fn run<I>(
        &mut self,
        schema: &Schema,
        table: &str,
        arity: usize,
        rows: I,
    ) -> Result<u64, LoadError>
    where
        I: IntoIterator<Item = Result<Row, LoadError>>,
    {
        let create = create_table_statement(table, schema);
        let insert = insert_statement(table, arity);
        let Loader { conn, state } = self;

        advance(state, LoadState::TableCreating);
        let tx = conn
            .transaction()
            .map_err(|err| LoadError::store("Starting transaction", err))?;
        debug!("{create}");
        tx.execute(&create, [])
            .map_err(|err| LoadError::store(format!("Creating table {table}"), err))?;
        advance(state, LoadState::TableCreated);

        let mut inserted = 0u64;
        {
            let mut stmt = tx
                .prepare(&insert)
                .map_err(|err| LoadError::store(format!("Preparing insert into {table}"), err))?;
            advance(state, LoadState::Inserting);
            for row in rows {
                let row = row?;
                if row.cells.len() != arity {
                    return Err(LoadError::ArityMismatch {
                        line: row.line,
                        expected: arity,
                        found: row.cells.len(),
                    });
                }
                stmt.execute(params_from_iter(row.cells.iter()))
                    .map_err(|err| {
                        LoadError::store(format!("Inserting line {} into {table}", row.line), err)
                    })?;
                inserted += 1;
            }
        }
        tx.commit()
            .map_err(|err| LoadError::store(format!("Committing load into {table}"), err))?;
        advance(state, LoadState::Committed);
        info!("Inserted {inserted} row(s) into {table}");
        Ok(inserted)
    }
}

fn advance(state: &mut LoadState, next: LoadState) {
    debug!("Load state {state:?} -> {next:?}");
    *state = next;
}
