//! Error taxonomy shared by the ingestion pipeline and the query gateway.
//!
//! The `Display` output of every variant is the message shown to the user,
//! so session operations can turn any failure into feedback text with
//! `to_string()`.

use thiserror::Error;

/// Typed error enum for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source file could not be parsed as delimited text
    #[error("Failed to parse CSV: {message}")]
    Format { message: String },

    /// The transient dataset snapshot could not be read or written
    #[error("{message}")]
    Snapshot { message: String },

    /// The type list has a different length than the dataset's column list
    #[error("Number of data types ({types}) does not match number of columns ({columns}).")]
    CountMismatch { types: usize, columns: usize },

    /// A type tag is not one of the recognized tags
    #[error("A data type you entered was invalid: '{tag}'. Expected one of String, Integer, Float.")]
    UnknownType { tag: String },

    /// A statement could not be built against the table definition
    #[error("{message}.")]
    Compile { message: String },

    /// The store rejected a statement, typically because the table shape is already fixed
    #[error("{message}. {table} has already had its schema defined.")]
    Operational { message: String, table: String },

    /// The referenced table does not exist in the store
    #[error("NoSuchTableError: {table}. The referenced table does not exist.")]
    NoSuchTable { table: String },

    /// Local filesystem failure outside CSV parsing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Wraps a store-level error raised while touching `table`.
    pub fn operational(table: &str, err: rusqlite::Error) -> Self {
        PipelineError::Operational {
            message: err.to_string(),
            table: table.to_string(),
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        PipelineError::Compile {
            message: message.into(),
        }
    }
}

impl From<PipelineError> for String {
    fn from(error: PipelineError) -> Self {
        error.to_string()
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures of a single gateway statement
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The text holds no statement, only whitespace or comments
    #[error("No SQL statement provided")]
    Empty,

    /// The text holds more than one statement
    #[error("You can only execute one statement at a time")]
    MultipleStatements,

    /// The store rejected the statement
    #[error("{0}")]
    Sql(#[from] rusqlite::Error),
}
