//! Database initialization
//!
//! Creates the schema on first run and seeds the reference catalogs the
//! importer resolves names against.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Reference category holding dengue classifications
pub const CLASSIFICATION_CATEGORY: &str = "dengue_classification";

/// Reference category holding case workflow states
pub const CASE_STATE_CATEGORY: &str = "case_state";

const DEFAULT_CLASSIFICATIONS: &[&str] = &[
    "Dengue sin signos de alarma",
    "Dengue con signos de alarma",
    "Dengue grave",
];

const DEFAULT_CASE_STATES: &[&str] = &["Reportado", "En investigación", "Confirmado", "Descartado"];

/// Open (or create) the database file and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare(&pool).await?;
    Ok(pool)
}

/// In-memory database with schema and seed data
///
/// Limited to one connection: every SQLite in-memory connection is its own
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    prepare(&pool).await?;
    Ok(pool)
}

async fn prepare(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_reference_entities_table(pool).await?;
    create_cases_table(pool).await?;
    seed_reference_catalogs(pool).await?;

    Ok(())
}

/// Create the reference catalog table
///
/// One table holds every small catalog, partitioned by `category`.
pub async fn create_reference_entities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reference_entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            UNIQUE(category, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reference_entities_category ON reference_entities(category, active)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the imported case table
pub async fn create_cases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            classification_id INTEGER NOT NULL REFERENCES reference_entities(id),
            workflow_state_id INTEGER NOT NULL REFERENCES reference_entities(id),
            year INTEGER NOT NULL,
            age INTEGER NOT NULL,
            neighborhood TEXT NOT NULL,
            address TEXT NOT NULL,
            description TEXT NOT NULL,
            temporary_name TEXT NOT NULL,
            notes TEXT,
            latitude TEXT,
            longitude TEXT,
            coordinate_tier TEXT,
            source_row INTEGER NOT NULL,
            imported_by TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed default classifications and workflow states (idempotent)
pub async fn seed_reference_catalogs(pool: &SqlitePool) -> Result<()> {
    for name in DEFAULT_CLASSIFICATIONS {
        insert_reference_entity(pool, CLASSIFICATION_CATEGORY, name, true).await?;
    }
    for name in DEFAULT_CASE_STATES {
        insert_reference_entity(pool, CASE_STATE_CATEGORY, name, true).await?;
    }
    Ok(())
}

/// Insert a catalog entry, returning its id
///
/// An existing `(category, name)` pair keeps its id and active flag.
pub async fn insert_reference_entity(
    pool: &SqlitePool,
    category: &str,
    name: &str,
    active: bool,
) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO reference_entities (category, name, active) VALUES (?, ?, ?)")
        .bind(category)
        .bind(name)
        .bind(active)
        .execute(pool)
        .await?;

    let id: i64 =
        sqlx::query_scalar("SELECT id FROM reference_entities WHERE category = ? AND name = ?")
            .bind(category)
            .bind(name)
            .fetch_one(pool)
            .await?;

    Ok(id)
}
