//! Database access for the importer
//!
//! SQLite implementations of the `ReferenceCatalog` and `CaseStore` seams.

pub mod cases;
pub mod reference_catalog;

pub use cases::SqliteCaseStore;
pub use reference_catalog::{match_reference, SqliteReferenceCatalog};

use casemap_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the shared database in the root folder, creating schema as needed
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Opening database: {}", db_path.display());
    casemap_common::db::init_database(db_path).await
}
