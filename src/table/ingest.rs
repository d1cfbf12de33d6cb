//! Row ingestion
//!
//! Inserts rows one at a time, each in its own transaction. When row `k`
//! fails, rows before it stay committed and nothing after it is attempted.
//! Rows are numbered among the data rows that survived loading, so once an
//! incomplete record was dropped the number no longer matches the file line.

use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::params_from_iter;

use crate::dataset::{Field, Row, Value};
use crate::error::{PipelineError, Result};
use crate::schema::PrimitiveType;
use crate::store::Store;
use crate::table::types::TableDefinition;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(r) => ToSqlOutput::from(*r),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Insert `rows` into `table`.
///
/// # Returns
/// * `Ok(n)` - number of rows inserted (all of them)
/// * `Err(Compile)` - a row could not be bound to the table's columns
/// * `Err(Operational)` - the store rejected an insert
pub fn ingest(store: &Store, table: &TableDefinition, rows: &[Row]) -> Result<usize> {
    let sql = table.insert_sql();
    let mut committed = 0;

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let values = match bind_row(table, row, row_number) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(
                    "Insertion into {} stopped at data row {} ({} rows committed): {}",
                    table.name,
                    row_number,
                    committed,
                    err
                );
                return Err(err);
            }
        };

        if let Err(err) = insert_one(store, &table.name, &sql, &values) {
            tracing::warn!(
                "Insertion into {} failed at data row {} ({} rows committed): {}",
                table.name,
                row_number,
                committed,
                err
            );
            return Err(err);
        }
        committed += 1;
    }

    tracing::info!("Inserted {} rows into {}", committed, table.name);
    Ok(committed)
}

fn insert_one(store: &Store, table: &str, sql: &str, values: &[Value]) -> Result<()> {
    let op = |e| PipelineError::operational(table, e);

    let mut conn = store.lock();
    let tx = conn.transaction().map_err(op)?;
    {
        let mut stmt = tx.prepare_cached(sql).map_err(op)?;
        stmt.execute(params_from_iter(values.iter())).map_err(op)?;
    }
    tx.commit().map_err(op)
}

/// Orders and coerces a row's values to the table's schema columns.
fn bind_row(table: &TableDefinition, row: &Row, row_number: usize) -> Result<Vec<Value>> {
    let unknown: Vec<&str> = row
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .filter(|name| table.schema.type_of(name).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(PipelineError::compile(format!(
            "Unconsumed column names: {}",
            unknown.join(", ")
        )));
    }

    table
        .schema
        .columns()
        .iter()
        .map(|column| {
            let field = row.field(&column.name).ok_or_else(|| {
                PipelineError::compile(format!(
                    "Data row {} has no value for column '{}'",
                    row_number, column.name
                ))
            })?;
            coerce(field, column.ty).ok_or_else(|| {
                PipelineError::compile(format!(
                    "Data row {}: {} value '{}' for column '{}' is not a valid {}",
                    row_number,
                    field.value.kind(),
                    field.raw,
                    column.name,
                    column.ty.tag()
                ))
            })
        })
        .collect()
}

/// Converts a field to what a column of type `ty` stores, if it can hold it.
/// Text columns store the source text as written.
pub fn coerce(field: &Field, ty: PrimitiveType) -> Option<Value> {
    let value = &field.value;
    match (ty, value) {
        (PrimitiveType::Text, _) => Some(Value::Text(field.raw.clone())),
        (PrimitiveType::Integer, Value::Integer(_)) => Some(value.clone()),
        (PrimitiveType::Real, Value::Integer(i)) => Some(Value::Real(*i as f64)),
        (PrimitiveType::Real, Value::Real(_)) => Some(value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_csv_content;
    use crate::schema::negotiate;
    use crate::table::provisioner::TableProvisioner;

    fn count(store: &Store) -> i64 {
        store
            .lock()
            .query_row("SELECT COUNT(*) FROM agent_table", [], |r| r.get(0))
            .unwrap()
    }

    fn setup(csv: &str, types: &str) -> (Store, TableDefinition, Vec<Row>) {
        let store = Store::open_in_memory().unwrap();
        let dataset = parse_csv_content(csv).unwrap();
        let schema = negotiate(types, &dataset).unwrap();
        let table = TableProvisioner::new()
            .provision(&store, "agent_table", &schema)
            .unwrap();
        (store, table, dataset.rows())
    }

    #[test]
    fn test_ingest_all_rows() {
        let (store, table, rows) = setup(
            "name,age,score\nAna,30,9.5\nBo,25,8.0",
            "String, Integer, Float",
        );

        assert_eq!(ingest(&store, &table, &rows).unwrap(), 2);
        assert_eq!(count(&store), 2);

        let (name, age, score): (String, i64, f64) = store
            .lock()
            .query_row(
                "SELECT name, age, score FROM agent_table WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((name.as_str(), age, score), ("Ana", 30, 9.5));
    }

    #[test]
    fn test_bad_row_keeps_earlier_rows() {
        let (store, table, rows) = setup(
            "name,age\nAna,30\nBo,25\nCy,abc\nDee,40",
            "String, Integer",
        );

        let result = ingest(&store, &table, &rows);

        match result {
            Err(PipelineError::Compile { message }) => {
                assert!(message.starts_with("Data row 3:"), "{}", message);
                assert!(message.contains("'abc'"));
                assert!(message.contains("Integer"));
            }
            other => panic!("Expected Compile error, got {:?}", other),
        }
        assert_eq!(count(&store), 2);
    }

    #[test]
    fn test_integer_widens_to_real() {
        let (store, table, rows) = setup("score\n9\n8.5", "Float");

        assert_eq!(ingest(&store, &table, &rows).unwrap(), 2);
        let total: f64 = store
            .lock()
            .query_row("SELECT SUM(score) FROM agent_table", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 17.5);
    }

    #[test]
    fn test_real_into_integer_is_rejected() {
        let (store, table, rows) = setup("age\n30\n30.5", "Integer");

        assert!(matches!(
            ingest(&store, &table, &rows),
            Err(PipelineError::Compile { .. })
        ));
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_text_columns_keep_source_text() {
        let (store, table, rows) = setup("code\n7\n2.50\n00501", "String");

        ingest(&store, &table, &rows).unwrap();
        let codes: Vec<String> = {
            let conn = store.lock();
            let mut stmt = conn.prepare("SELECT code FROM agent_table ORDER BY id").unwrap();
            let codes = stmt
                .query_map([], |r| r.get(0))
                .unwrap()
                .collect::<rusqlite::Result<Vec<String>>>()
                .unwrap();
            codes
        };
        assert_eq!(codes, vec!["7", "2.50", "00501"]);
    }

    #[test]
    fn test_dropped_table_is_operational_error() {
        let (store, table, rows) = setup("name\nAna", "String");
        store.lock().execute_batch("DROP TABLE agent_table").unwrap();

        match ingest(&store, &table, &rows) {
            Err(err @ PipelineError::Operational { .. }) => {
                assert!(err.to_string().contains("no such table"));
            }
            other => panic!("Expected Operational error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_with_unknown_column_is_compile_error() {
        let (store, table, _) = setup("name\nAna", "String");
        let row = Row {
            fields: vec![
                Field::new("name", Value::Text("Ana".into())),
                Field::new("city", Value::Text("Lima".into())),
            ],
        };

        match ingest(&store, &table, &[row]) {
            Err(PipelineError::Compile { message }) => assert!(message.contains("city")),
            other => panic!("Expected Compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_numbers_count_surviving_data_rows() {
        // The NA record on line 3 is dropped at load time
        let (store, table, rows) = setup("name,age\nAna,30\nBo,NA\nCy,old", "String, Integer");

        match ingest(&store, &table, &rows) {
            Err(PipelineError::Compile { message }) => {
                assert!(message.starts_with("Data row 2:"), "{}", message)
            }
            other => panic!("Expected Compile error, got {:?}", other),
        }
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_coerce_table() {
        let field = |value: Value| Field::new("c", value);

        assert_eq!(
            coerce(&field(Value::Integer(3)), PrimitiveType::Real),
            Some(Value::Real(3.0))
        );
        assert_eq!(coerce(&field(Value::Text("x".into())), PrimitiveType::Integer), None);
        assert_eq!(coerce(&field(Value::Real(1.5)), PrimitiveType::Integer), None);
        assert_eq!(
            coerce(&field(Value::Real(1.5)), PrimitiveType::Text),
            Some(Value::Text("1.5".into()))
        );

        let padded = Field {
            name: "zip".to_string(),
            value: Value::Integer(501),
            raw: "00501".to_string(),
        };
        assert_eq!(
            coerce(&padded, PrimitiveType::Text),
            Some(Value::Text("00501".into()))
        );
        assert_eq!(coerce(&padded, PrimitiveType::Integer), Some(Value::Integer(501)));
    }
}
