//! Load CSV files into a typed SQLite table and query it in plain language.
//!
//! The pipeline runs upload → [`dataset`] → [`schema`] → [`table`]; the
//! [`gateway`] executes SQL against the result and [`session`] ties the
//! steps together behind text-returning operations.

pub mod config;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod schema;
pub mod server;
pub mod session;
pub mod store;
pub mod table;

pub use config::Config;
pub use error::PipelineError;
pub use gateway::{QueryGateway, QueryResult};
pub use session::Session;
pub use store::Store;
