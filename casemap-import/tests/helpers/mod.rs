//! Test Helper Utilities
//!
//! Shared fakes and builders for casemap-import integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use casemap_common::db::{init_memory_database, CASE_STATE_CATEGORY, CLASSIFICATION_CATEGORY};
use casemap_import::db::{SqliteCaseStore, SqliteReferenceCatalog};
use casemap_import::services::{
    BatchImporter, GeocodeResolver, InitialState, NoDelayGate, RequestGate, ResolverSettings,
    RowMapper,
};
use casemap_import::types::{GeoPoint, GeocodeError, Geocoder};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Geocoder answering from a fixed table
///
/// Records every query with the instant it arrived.
#[derive(Default)]
pub struct ScriptedGeocoder {
    hits: HashMap<String, (String, String)>,
    faults: HashSet<String>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(mut self, query: &str, lat: &str, lon: &str) -> Self {
        self.hits
            .insert(query.to_string(), (lat.to_string(), lon.to_string()));
        self
    }

    pub fn fault(mut self, query: &str) -> Self {
        self.faults.insert(query.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn search(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), Instant::now()));

        if self.faults.contains(query) {
            return Err(GeocodeError::Network("connection reset".to_string()));
        }

        Ok(self.hits.get(query).map(|(lat, lon)| GeoPoint {
            latitude: BigDecimal::from_str(lat).unwrap(),
            longitude: BigDecimal::from_str(lon).unwrap(),
        }))
    }
}

pub fn test_resolver_settings() -> ResolverSettings {
    ResolverSettings {
        region: "Quindío".to_string(),
        country: "Colombia".to_string(),
        online: true,
    }
}

/// In-memory database with schema and seeded catalogs
pub async fn create_test_db() -> SqlitePool {
    init_memory_database().await.unwrap()
}

/// Importer over `pool` using `geocoder` and `gate`
pub fn create_test_importer(
    pool: &SqlitePool,
    geocoder: Arc<dyn Geocoder>,
    gate: Arc<dyn RequestGate>,
) -> BatchImporter {
    create_test_importer_with_state(pool, geocoder, gate, "Reportado")
}

pub fn create_test_importer_with_state(
    pool: &SqlitePool,
    geocoder: Arc<dyn Geocoder>,
    gate: Arc<dyn RequestGate>,
    initial_state: &str,
) -> BatchImporter {
    let resolver = Arc::new(GeocodeResolver::new(
        geocoder,
        gate,
        test_resolver_settings(),
    ));
    let catalog = Arc::new(SqliteReferenceCatalog::new(pool.clone()));
    let mapper = RowMapper::new(
        resolver,
        catalog.clone(),
        CLASSIFICATION_CATEGORY,
        "Armenia",
    );

    BatchImporter::new(
        mapper,
        catalog,
        Arc::new(SqliteCaseStore::new(pool.clone())),
        InitialState {
            category: CASE_STATE_CATEGORY.to_string(),
            name: initial_state.to_string(),
        },
    )
}

/// Importer whose geocoder never finds anything and never waits
pub fn create_offline_importer(pool: &SqlitePool) -> (BatchImporter, Arc<ScriptedGeocoder>) {
    let geocoder = Arc::new(ScriptedGeocoder::new());
    let importer = create_test_importer(pool, geocoder.clone(), Arc::new(NoDelayGate));
    (importer, geocoder)
}

pub async fn count_cases(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cases")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Header plus the two sample rows used throughout the tests
pub const SAMPLE_CSV: &str = "\
year,age,classification,neighborhood,latitude,longitude
2024,30,Dengue sin signos de alarma,El Jardín,4.5389,-75.6821
abc,30,Dengue grave,Centro,,
";
