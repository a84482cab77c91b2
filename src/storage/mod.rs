//! SQLite persistence layer.

mod database;
mod metrics;
mod schema;

pub use database::{Database, DatabaseError};
pub use metrics::SqliteMetricsStorage;
