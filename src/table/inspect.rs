//! Table-state inspection
//!
//! Text-producing helpers whose output is fed into agent prompts, so they
//! report absence as a message rather than an error.

use crate::error::PipelineError;
use crate::store::Store;

/// Lists the columns of `table_name` with their declared types.
pub fn describe(store: &Store, table_name: &str) -> String {
    match store.table_columns(table_name) {
        Ok(columns) if columns.is_empty() => absent(table_name),
        Ok(columns) => {
            let lines: Vec<String> = columns
                .iter()
                .map(|(name, ty)| format!(" - {}: {}", name, ty))
                .collect();
            format!("Columns:\n{}", lines.join("\n"))
        }
        Err(e) => PipelineError::operational(table_name, e).to_string(),
    }
}

/// Reports whether `table_name` exists.
pub fn exists(store: &Store, table_name: &str) -> String {
    match store.has_table(table_name) {
        Ok(true) => format!("Table '{}' exists.", table_name),
        Ok(false) => absent(table_name),
        Err(e) => PipelineError::operational(table_name, e).to_string(),
    }
}

fn absent(table_name: &str) -> String {
    PipelineError::NoSuchTable {
        table: table_name.to_string(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, PrimitiveType, TypedSchema};
    use crate::table::provisioner::TableProvisioner;

    #[test]
    fn test_absent_table_messages() {
        let store = Store::open_in_memory().unwrap();

        assert!(describe(&store, "agent_table").starts_with("NoSuchTableError"));
        assert!(exists(&store, "agent_table").starts_with("NoSuchTableError"));
    }

    #[test]
    fn test_describe_lists_provisioned_columns() {
        let store = Store::open_in_memory().unwrap();
        let schema = TypedSchema::new(vec![
            ColumnType {
                name: "name".to_string(),
                ty: PrimitiveType::Text,
            },
            ColumnType {
                name: "score".to_string(),
                ty: PrimitiveType::Real,
            },
        ]);
        TableProvisioner::new()
            .provision(&store, "agent_table", &schema)
            .unwrap();

        assert_eq!(
            describe(&store, "agent_table"),
            "Columns:\n - id: INTEGER\n - name: TEXT\n - score: REAL"
        );
        assert_eq!(exists(&store, "agent_table"), "Table 'agent_table' exists.");
    }
}
