//! Turns a user-typed, comma separated type list into a [`TypedSchema`].

use crate::dataset::ColumnarDataset;
use crate::error::{PipelineError, Result};
use crate::schema::types::{ColumnType, PrimitiveType, TypedSchema};

/// Negotiate a schema for `dataset` from a type list such as
/// `"String, Integer, Float"`.
///
/// Entries are matched to columns by position. The count is checked before
/// any tag is parsed, so a list that is both too short and misspelled
/// reports the count mismatch.
pub fn negotiate(type_spec: &str, dataset: &ColumnarDataset) -> Result<TypedSchema> {
    let tags: Vec<&str> = type_spec.split(',').map(str::trim).collect();
    let names = dataset.column_names();

    if tags.len() != names.len() {
        return Err(PipelineError::CountMismatch {
            types: tags.len(),
            columns: names.len(),
        });
    }

    let types = tags
        .iter()
        .map(|tag| PrimitiveType::from_tag(tag))
        .collect::<Result<Vec<_>>>()?;

    let schema = TypedSchema::new(
        names
            .into_iter()
            .zip(types)
            .map(|(name, ty)| ColumnType {
                name: name.to_string(),
                ty,
            })
            .collect(),
    );

    tracing::debug!("Negotiated schema with {} columns", schema.len());
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_csv_content;

    fn dataset() -> ColumnarDataset {
        parse_csv_content("name,age,score\nAna,30,9.5\nBo,25,8.0").unwrap()
    }

    #[test]
    fn test_negotiate_preserves_column_order() {
        let schema = negotiate("String, Integer, Float", &dataset()).unwrap();

        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "score"]);
        assert_eq!(schema.type_of("name"), Some(PrimitiveType::Text));
        assert_eq!(schema.type_of("age"), Some(PrimitiveType::Integer));
        assert_eq!(schema.type_of("score"), Some(PrimitiveType::Real));
    }

    #[test]
    fn test_negotiate_matches_by_position_not_name() {
        let schema = negotiate("Float,String,Integer", &dataset()).unwrap();
        assert_eq!(schema.columns()[0].ty, PrimitiveType::Real);
        assert_eq!(schema.columns()[0].name, "name");
    }

    #[test]
    fn test_too_few_types() {
        match negotiate("String, Integer", &dataset()) {
            Err(PipelineError::CountMismatch { types, columns }) => {
                assert_eq!(types, 2);
                assert_eq!(columns, 3);
            }
            other => panic!("Expected CountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_types() {
        let result = negotiate("String,Integer,Float,Float", &dataset());
        assert!(matches!(
            result,
            Err(PipelineError::CountMismatch {
                types: 4,
                columns: 3
            })
        ));
    }

    #[test]
    fn test_empty_spec_counts_as_one_entry() {
        let result = negotiate("", &dataset());
        assert!(matches!(
            result,
            Err(PipelineError::CountMismatch { types: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        match negotiate("String, Int, Float", &dataset()) {
            Err(PipelineError::UnknownType { tag }) => assert_eq!(tag, "Int"),
            other => panic!("Expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn test_count_is_checked_before_tags() {
        let result = negotiate("Bogus", &dataset());
        assert!(matches!(result, Err(PipelineError::CountMismatch { .. })));
    }
}
