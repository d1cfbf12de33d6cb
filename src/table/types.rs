//! Table definition types

use crate::schema::TypedSchema;
use crate::store::quote_ident;

/// Name of the synthetic auto-incrementing key prepended to every table
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Declared type of the synthetic key
pub const PRIMARY_KEY_TYPE: &str = "INTEGER";

/// A managed table: a synthetic key followed by one column per schema entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub schema: TypedSchema,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, schema: TypedSchema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Every column of the table with its declared type, key first.
    pub fn columns(&self) -> Vec<(String, &'static str)> {
        std::iter::once((PRIMARY_KEY_COLUMN.to_string(), PRIMARY_KEY_TYPE))
            .chain(
                self.schema
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), c.ty.sql_type())),
            )
            .collect()
    }

    /// Whether an existing column list (as reported by the store) has the
    /// same shape as this definition.
    pub fn matches_columns(&self, existing: &[(String, String)]) -> bool {
        let expected = self.columns();
        expected.len() == existing.len()
            && expected
                .iter()
                .zip(existing)
                .all(|((name, ty), (other_name, other_ty))| {
                    name.eq_ignore_ascii_case(other_name) && ty.eq_ignore_ascii_case(other_ty)
                })
    }

    pub fn create_sql(&self) -> String {
        let mut parts = vec![format!(
            "{} {} PRIMARY KEY",
            quote_ident(PRIMARY_KEY_COLUMN),
            PRIMARY_KEY_TYPE
        )];
        parts.extend(
            self.schema
                .columns()
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type())),
        );
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            parts.join(", ")
        )
    }

    /// Insert statement binding every schema column, in schema order.
    pub fn insert_sql(&self) -> String {
        let columns: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.name),
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    /// Short human-readable column list, e.g. `id INTEGER, name TEXT`.
    pub fn summary(&self) -> String {
        self.columns()
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
