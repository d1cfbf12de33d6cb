//! CSV loading logic
//!
//! Parses delimited text into a [`ColumnarDataset`], dropping every record
//! that has a missing field.

use std::collections::HashSet;
use std::path::Path;

use crate::dataset::snapshot::SnapshotStore;
use crate::dataset::types::{Column, ColumnarDataset};
use crate::error::{PipelineError, Result};

/// Field contents treated as missing values, in addition to the empty field
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Read a CSV file from disk, parse it, and persist the result to the
/// snapshot store for the schema-assignment step.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `snapshots` - Where the parsed dataset is persisted
///
/// # Returns
/// * The parsed dataset, with incomplete records removed
pub fn load(path: &Path, snapshots: &SnapshotStore) -> Result<ColumnarDataset> {
    let content = std::fs::read(path).map_err(|e| PipelineError::Format {
        message: format!("Failed to read file '{}': {}", path.display(), e),
    })?;
    let text = String::from_utf8(content).map_err(|e| PipelineError::Format {
        message: format!("File '{}' is not valid UTF-8: {}", path.display(), e),
    })?;

    let dataset = parse_csv_content(&text)?;
    snapshots.save(path, text.as_bytes(), &dataset)?;

    tracing::info!(
        "Loaded {} rows across {} columns from {} (snapshot at {})",
        dataset.row_count(),
        dataset.column_count(),
        path.display(),
        snapshots.path().display()
    );

    Ok(dataset)
}

/// Parse CSV content from a string.
///
/// # Behavior
/// - The first record is the header; names are trimmed and must be unique
///   ignoring ASCII case, as the store treats column names
/// - Fields are trimmed and classified with [`Value::infer`](crate::dataset::Value::infer);
///   the trimmed text is kept alongside
/// - Short records are padded with missing fields, then dropped along with
///   every other record holding a missing field
/// - A record longer than the header is a format error
pub fn parse_csv_content(content: &str) -> Result<ColumnarDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Format {
            message: format!("Failed to parse CSV headers: {}", e),
        })?
        .iter()
        .map(|s| s.to_string())
        .collect();

    validate_headers(&headers)?;

    let header_count = headers.len();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); header_count];
    let mut total_rows: usize = 0;
    let mut dropped_rows: usize = 0;

    for (line_number, result) in reader.records().enumerate() {
        // +2 for 1-based indexing and header row
        let line = line_number + 2;
        let record = result.map_err(|e| PipelineError::Format {
            message: format!("Malformed record on line {}: {}", line, e),
        })?;
        total_rows += 1;

        if record.len() > header_count {
            return Err(PipelineError::Format {
                message: format!(
                    "Expected {} fields on line {}, saw {}",
                    header_count,
                    line,
                    record.len()
                ),
            });
        }

        if record.len() < header_count || record.iter().any(is_missing) {
            dropped_rows += 1;
            continue;
        }

        for (column, field) in columns.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    if dropped_rows > 0 {
        tracing::info!(
            "CSV parsing complete: {} rows read, {} rows dropped for missing values",
            total_rows,
            dropped_rows
        );
    }

    Ok(ColumnarDataset::from_columns(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect(),
    ))
}

fn validate_headers(headers: &[String]) -> Result<()> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::Format {
            message: "CSV file has no headers".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (index, name) in headers.iter().enumerate() {
        if name.is_empty() {
            return Err(PipelineError::Format {
                message: format!("Column {} has an empty header", index + 1),
            });
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(PipelineError::Format {
                message: format!("Duplicate column name '{}'", name),
            });
        }
    }

    Ok(())
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || MISSING_MARKERS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::Value;
    use tempfile::TempDir;

    #[test]
    fn test_parse_basic_csv() {
        let content = "name,age,score\n\"Ana\",30,9.5\n\"Bo\",25,8.0";
        let dataset = parse_csv_content(content).unwrap();

        assert_eq!(dataset.column_names(), vec!["name", "age", "score"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.column("name").unwrap().values,
            vec![Value::Text("Ana".into()), Value::Text("Bo".into())]
        );
        assert_eq!(
            dataset.column("age").unwrap().values,
            vec![Value::Integer(30), Value::Integer(25)]
        );
        assert_eq!(
            dataset.column("score").unwrap().values,
            vec![Value::Real(9.5), Value::Real(8.0)]
        );
    }

    #[test]
    fn test_every_column_has_row_count_entries() {
        let content = "a,b,c,d\n1,2,3,4\n5,6,7,8\n9,10,11,12";
        let dataset = parse_csv_content(content).unwrap();

        assert_eq!(dataset.column_count(), 4);
        for column in dataset.columns() {
            assert_eq!(column.values.len(), 3);
        }
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let content = "a,b\n1,x\n2,\n,y\n3,NA\n4,z";
        let dataset = parse_csv_content(content).unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.column("a").unwrap().values,
            vec![Value::Integer(1), Value::Integer(4)]
        );
    }

    #[test]
    fn test_short_record_is_dropped() {
        let content = "a,b,c\n1,2,3\n4,5";
        let dataset = parse_csv_content(content).unwrap();

        assert_eq!(dataset.row_count(), 1);
    }

    #[test]
    fn test_long_record_is_format_error() {
        let content = "a,b\n1,2\n3,4,5";
        let result = parse_csv_content(content);

        match result {
            Err(PipelineError::Format { message }) => {
                assert!(message.contains("line 3"));
            }
            _ => panic!("Expected Format error"),
        }
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let content = "name,description\n\"Doe, John\",\"A, B\"";
        let dataset = parse_csv_content(content).unwrap();

        assert_eq!(
            dataset.column("name").unwrap().values[0],
            Value::Text("Doe, John".into())
        );
    }

    #[test]
    fn test_parse_empty_csv_fails() {
        let result = parse_csv_content("");
        match result {
            Err(PipelineError::Format { message }) => assert!(message.contains("headers")),
            _ => panic!("Expected Format error"),
        }
    }

    #[test]
    fn test_duplicate_header_fails() {
        let result = parse_csv_content("a,a\n1,2");
        assert!(matches!(result, Err(PipelineError::Format { .. })));
    }

    #[test]
    fn test_headers_differing_only_in_case_are_duplicates() {
        match parse_csv_content("Name,name\nA,b") {
            Err(PipelineError::Format { message }) => {
                assert_eq!(message, "Duplicate column name 'name'")
            }
            other => panic!("Expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_text_is_kept_next_to_inferred_value() {
        let dataset = parse_csv_content("zip,label\n00501, 7 ").unwrap();

        let zip = dataset.column("zip").unwrap();
        assert_eq!(zip.values, vec![Value::Integer(501)]);
        assert_eq!(zip.raw, vec!["00501".to_string()]);
        assert_eq!(dataset.column("label").unwrap().raw, vec!["7".to_string()]);
    }

    #[test]
    fn test_headers_only_yields_zero_rows() {
        let dataset = parse_csv_content("col1,col2").unwrap();
        assert_eq!(dataset.column_count(), 2);
        assert_eq!(dataset.row_count(), 0);
    }

    #[test]
    fn test_load_persists_snapshot() {
        let temp = TempDir::new().unwrap();
        let csv_path = temp.path().join("people.csv");
        std::fs::write(&csv_path, "name,age\nAna,30\n").unwrap();
        let snapshots = SnapshotStore::new(temp.path().join("table_data.bin"));

        let dataset = load(&csv_path, &snapshots).unwrap();
        let restored = snapshots.load().unwrap();

        assert_eq!(restored.dataset, dataset);
        assert!(restored.source_file.ends_with("people.csv"));
    }

    #[test]
    fn test_load_missing_file_is_format_error() {
        let temp = TempDir::new().unwrap();
        let snapshots = SnapshotStore::new(temp.path().join("table_data.bin"));

        let result = load(&temp.path().join("nope.csv"), &snapshots);
        match result {
            Err(PipelineError::Format { message }) => {
                assert!(message.contains("Failed to read file"))
            }
            _ => panic!("Expected Format error"),
        }
    }
}
