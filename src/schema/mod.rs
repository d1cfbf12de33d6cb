//! Column type assignment

pub mod negotiator;
pub mod types;

pub use negotiator::negotiate;
pub use types::{ColumnType, PrimitiveType, TypedSchema};
