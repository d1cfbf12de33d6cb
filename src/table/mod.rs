//! Managed table lifecycle: provisioning, ingestion and inspection

pub mod ingest;
pub mod inspect;
pub mod provisioner;
pub mod types;

pub use ingest::ingest;
pub use inspect::{describe, exists};
pub use provisioner::{TableProvisioner, TableRegistry};
pub use types::{TableDefinition, PRIMARY_KEY_COLUMN};
