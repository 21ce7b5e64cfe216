//! casemap-import library interface
//!
//! Exposes the import pipeline and HTTP surface for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_logs;

pub use crate::error::{ApiError, ApiResult, ImportError};

use axum::Router;
use casemap_common::db::CASE_STATE_CATEGORY;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ImportSettings;
use crate::db::{SqliteCaseStore, SqliteReferenceCatalog};
use crate::services::{
    BatchImporter, GeocodeResolver, InitialState, NominatimClient, RequestGate, ResolverSettings,
    RowMapper,
};
use crate::types::GeocodeError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub importer: Arc<BatchImporter>,
    /// Cancellation tokens for imports in flight, by session id
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last fatal import error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, importer: Arc<BatchImporter>) -> Self {
        Self {
            db,
            importer,
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Wire the production importer: SQLite catalog and store, Nominatim
/// geocoder behind the shared `gate`
pub fn build_importer(
    db: &SqlitePool,
    settings: &ImportSettings,
    gate: Arc<dyn RequestGate>,
) -> Result<BatchImporter, GeocodeError> {
    let geocoder = Arc::new(NominatimClient::from_config(&settings.geocoding)?);
    let resolver = Arc::new(GeocodeResolver::new(
        geocoder,
        gate,
        ResolverSettings::from_config(&settings.geocoding),
    ));
    let catalog = Arc::new(SqliteReferenceCatalog::new(db.clone()));
    let store = Arc::new(SqliteCaseStore::new(db.clone()));

    let mapper = RowMapper::new(
        resolver,
        catalog.clone(),
        settings.import.classification_category.clone(),
        settings.geocoding.default_city.clone(),
    );

    Ok(BatchImporter::new(
        mapper,
        catalog,
        store,
        InitialState {
            category: CASE_STATE_CATEGORY.to_string(),
            name: settings.import.initial_state_name.clone(),
        },
    ))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::health_routes())
        .with_state(state)
}
