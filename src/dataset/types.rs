//! Core type definitions for loaded tabular data
//!
//! A dataset is held column-major, the way it is read from the source file;
//! rows are only reconstructed when they are about to be inserted.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Scalar Values
// ============================================================================

/// A single cell value, typed by what its text parses as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Whole numbers that fit in 64 bits
    Integer(i64),
    /// Finite floating point numbers
    Real(f64),
    /// Everything else
    Text(String),
}

impl Value {
    /// Classifies a raw (already trimmed) field.
    pub fn infer(raw: &str) -> Value {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Real(f),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Name of the kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{:?}", r),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Columnar Dataset
// ============================================================================

/// One named column and its values in row order.
///
/// `raw` keeps the trimmed source text of every value, so text columns can
/// store exactly what the file said (`00501` stays `00501`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
    pub raw: Vec<String>,
}

impl Column {
    /// Builds a column from trimmed source fields, inferring each value.
    pub fn from_raw(name: impl Into<String>, raw: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: raw.iter().map(|field| Value::infer(field)).collect(),
            raw,
        }
    }
}

/// Column-major view of a loaded file.
///
/// Column names are unique and every column holds the same number of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnarDataset {
    columns: Vec<Column>,
}

impl ColumnarDataset {
    /// Builds a dataset from columns that were checked by the caller to be
    /// uniquely named and of equal length.
    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Transposes the columns into rows, preserving column order in each row.
    pub fn rows(&self) -> Vec<Row> {
        (0..self.row_count())
            .map(|i| Row {
                fields: self
                    .columns
                    .iter()
                    .map(|c| Field {
                        name: c.name.clone(),
                        value: c.values[i].clone(),
                        raw: c.raw[i].clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One cell of a row: column name, inferred value and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    pub raw: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let raw = value.to_string();
        Self {
            name: name.into(),
            value,
            raw,
        }
    }
}

/// A row reconstructed for insertion, fields in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn field(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.field(column).map(|f| &f.value)
    }
}
