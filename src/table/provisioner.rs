//! Table provisioning
//!
//! Registers table definitions in a session-owned registry and materializes
//! them in the store when they do not exist there yet.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::schema::TypedSchema;
use crate::store::{read_table_columns, Store};
use crate::table::types::{TableDefinition, PRIMARY_KEY_COLUMN};

/// Table definitions known to the current session, keyed by table name
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableDefinition>,
}

impl TableRegistry {
    pub fn get(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn register(&mut self, definition: TableDefinition) {
        self.tables.insert(definition.name.clone(), definition);
    }

    fn forget(&mut self, name: &str) -> Option<TableDefinition> {
        self.tables.remove(name)
    }
}

/// Creates or reuses table definitions.
///
/// A definition registered under a name is fixed for the lifetime of the
/// provisioner unless it is explicitly forgotten (after the table has been
/// dropped).
#[derive(Debug, Default)]
pub struct TableProvisioner {
    registry: TableRegistry,
}

impl TableProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Removes a definition so the name can be provisioned with a new schema.
    pub fn forget(&mut self, table_name: &str) -> bool {
        self.registry.forget(table_name).is_some()
    }

    /// Provision `table_name` with `schema`.
    ///
    /// # Behavior
    /// - Identical re-provisioning is a no-op that returns the registered
    ///   definition (and recreates the table if it was dropped behind the
    ///   registry's back)
    /// - A different schema under a registered name is an operational error
    /// - A table already present in the store must have the same shape
    pub fn provision(
        &mut self,
        store: &Store,
        table_name: &str,
        schema: &TypedSchema,
    ) -> Result<TableDefinition> {
        if let Some(column) = schema
            .columns()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN))
        {
            return Err(PipelineError::compile(format!(
                "Column '{}' collides with the synthetic primary key '{}'",
                column.name, PRIMARY_KEY_COLUMN
            )));
        }

        let definition = TableDefinition::new(table_name, schema.clone());

        if let Some(existing) = self.registry.get(table_name) {
            if *existing != definition {
                return Err(PipelineError::Operational {
                    message: format!(
                        "Table '{}' is already defined as ({}) and cannot be redefined as ({})",
                        table_name,
                        existing.summary(),
                        definition.summary()
                    ),
                    table: table_name.to_string(),
                });
            }
            tracing::debug!("Reusing registered definition for table {}", table_name);
        }

        materialize(store, &definition)?;
        self.registry.register(definition.clone());

        Ok(definition)
    }
}

/// Creates the table in the store unless it is already there with the same shape.
fn materialize(store: &Store, definition: &TableDefinition) -> Result<()> {
    let table = definition.name.as_str();
    let op = |e| PipelineError::operational(table, e);

    let mut conn = store.lock();
    let tx = conn.transaction().map_err(op)?;

    let existing = read_table_columns(&tx, table).map_err(op)?;
    if existing.is_empty() {
        tx.execute_batch(&definition.create_sql()).map_err(op)?;
        tracing::info!("Created table {} ({})", table, definition.summary());
    } else if !definition.matches_columns(&existing) {
        let found = existing
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(PipelineError::Operational {
            message: format!(
                "Table '{}' already exists as ({}), which does not match ({})",
                table,
                found,
                definition.summary()
            ),
            table: table.to_string(),
        });
    } else {
        tracing::debug!("Table {} already exists with a matching shape", table);
    }

    tx.commit().map_err(op)?;
    Ok(())
}
