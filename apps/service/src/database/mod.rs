/// Database abstraction layer
///
/// This module provides the persistence interface the monitoring engine
/// and reporting code run against, backed by LibSQL (SQLite).

pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{Database, DatabaseImpl};

use anyhow::Result;

/// Create any missing schema and bring an existing one up to date
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
