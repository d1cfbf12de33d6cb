//! Query gateway
//!
//! Executes SQL text against the store and hands back plain text. Statements
//! are not validated or restricted in any way: DDL, DML and queries all pass
//! through as written. Only expose this to a trusted local user.
//!
//! The text must hold exactly one statement; a trailing `;`, whitespace or
//! comments are fine.

use std::fmt;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Batch, Statement};

use crate::error::GatewayError;
use crate::store::Store;

/// Appended to every failure so callers learn to ask for rows back.
pub const RETURNING_HINT: &str =
    "Include the `RETURNING` keyword to ensure the result object always returns rows.";

/// Returned when a statement produces no result cursor at all.
pub const NO_ROWS_MESSAGE: &str =
    "No rows found, include the `RETURNING` keyword to ensure the result object always returns rows.";

/// Rows produced by one statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl fmt::Display for QueryResult {
    /// One tuple-formatted row per line, each line terminated by `\n`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", render_row(row))?;
        }
        Ok(())
    }
}

fn render_row(row: &[SqlValue]) -> String {
    let fields: Vec<String> = row.iter().map(render_value).collect();
    if fields.len() == 1 {
        format!("({},)", fields[0])
    } else {
        format!("({})", fields.join(", "))
    }
}

fn render_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "None".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(r) => format!("{:?}", r),
        SqlValue::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        SqlValue::Blob(b) => format!("b'<{} bytes>'", b.len()),
    }
}

/// Runs arbitrary SQL in its own transaction.
#[derive(Debug, Clone, Copy)]
pub struct QueryGateway<'a> {
    store: &'a Store,
}

impl<'a> QueryGateway<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Executes `sql`, committing on success and rolling back on failure.
    ///
    /// # Returns
    /// * `Ok(None)` - the statement has no result columns
    /// * `Ok(Some(result))` - every row the statement produced
    /// * `Err(Empty | MultipleStatements)` - nothing was executed
    pub fn execute(&self, sql: &str) -> Result<Option<QueryResult>, GatewayError> {
        let mut conn = self.store.lock();
        let tx = conn.transaction()?;

        let result = {
            let mut batch = Batch::new(&tx, sql);
            let mut stmt = batch.next()?.ok_or(GatewayError::Empty)?;
            // A tail that fails to prepare is still a second statement
            if !matches!(batch.next(), Ok(None)) {
                return Err(GatewayError::MultipleStatements);
            }
            run_statement(&mut stmt)?
        };

        tx.commit()?;
        Ok(result)
    }

    /// Executes `sql` and renders the outcome as text. Never fails: store
    /// errors come back as messages carrying [`RETURNING_HINT`], blank or
    /// multi-statement text as a plain explanation.
    pub fn query(&self, sql: &str) -> String {
        match self.execute(sql) {
            Ok(Some(result)) => {
                tracing::debug!(
                    "Query returned {} rows with columns [{}]",
                    result.rows.len(),
                    result.columns.join(", ")
                );
                result.to_string()
            }
            Ok(None) => {
                tracing::debug!("Statement produced no result cursor");
                NO_ROWS_MESSAGE.to_string()
            }
            Err(e @ GatewayError::Sql(_)) => {
                tracing::warn!("Query failed: {}", e);
                format!("{}. {}", e, RETURNING_HINT)
            }
            Err(e) => {
                tracing::warn!("Query rejected: {}", e);
                format!("{}.", e)
            }
        }
    }
}

fn run_statement(stmt: &mut Statement<'_>) -> rusqlite::Result<Option<QueryResult>> {
    let column_count = stmt.column_count();
    if column_count == 0 {
        stmt.execute([])?;
        return Ok(None);
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        collected.push(
            (0..column_count)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?,
        );
    }

    Ok(Some(QueryResult {
        columns,
        rows: collected,
    }))
}
