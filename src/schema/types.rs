//! Column type definitions
//!
//! The closed set of primitive column types a user can assign, and the
//! ordered schema built from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Primitive column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Text,
    Integer,
    Real,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 3] =
        [PrimitiveType::Text, PrimitiveType::Integer, PrimitiveType::Real];

    /// Maps a user-facing tag to a type. Every tag outside
    /// `String`, `Integer` and `Float` is rejected.
    pub fn from_tag(tag: &str) -> Result<Self, PipelineError> {
        match tag {
            "String" => Ok(PrimitiveType::Text),
            "Integer" => Ok(PrimitiveType::Integer),
            "Float" => Ok(PrimitiveType::Real),
            other => Err(PipelineError::UnknownType {
                tag: other.to_string(),
            }),
        }
    }

    /// The tag a user types for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            PrimitiveType::Text => "String",
            PrimitiveType::Integer => "Integer",
            PrimitiveType::Real => "Float",
        }
    }

    /// The column type used in table DDL.
    pub fn sql_type(&self) -> &'static str {
        match self {
            PrimitiveType::Text => "TEXT",
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveType::from_tag(s)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// A named column and its assigned type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub name: String,
    pub ty: PrimitiveType,
}

/// Ordered column-to-type assignment, positionally matched to a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedSchema {
    columns: Vec<ColumnType>,
}

impl TypedSchema {
    pub fn new(columns: Vec<ColumnType>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn type_of(&self, name: &str) -> Option<PrimitiveType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.ty)
    }
}
