//! Core trait definitions
//!
//! The importer talks to the outside world through three seams:
//! - `Geocoder`: free-text place search (one top result)
//! - `ReferenceCatalog`: name → id lookups in small reference catalogs
//! - `CaseStore`: bulk persistence of mapped cases
//!
//! Production implementations live in `services::geocoding_client` and `db`;
//! tests substitute in-process fakes.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use casemap_common::Result;
use thiserror::Error;

use crate::models::MappedCase;

/// Point returned by a geocoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPoint {
    pub latitude: BigDecimal,
    pub longitude: BigDecimal,
}

/// Geocoding transport/format errors
///
/// Never fatal for a row: the resolver records it and moves to the next tier.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Invalid geocoder configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Geocoder returned HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Free-text geocoding service
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Search for `query`, returning the top result if any
    ///
    /// Rate limiting is the caller's job.
    async fn search(&self, query: &str) -> std::result::Result<Option<GeoPoint>, GeocodeError>;
}

/// Outcome of a fuzzy catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLookup {
    Found(i64),
    NotFound,
    /// Several active entries matched; holds their names
    Ambiguous(Vec<String>),
}

/// Read-only reference catalog (classifications, workflow states)
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    /// Case-insensitive substring match against active entries of `category`
    async fn find_active_by_fuzzy_name(&self, category: &str, text: &str)
        -> Result<ReferenceLookup>;

    /// Case-insensitive exact match against active entries of `category`
    async fn find_active_by_name(&self, category: &str, name: &str) -> Result<Option<i64>>;
}

/// Case persistence
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Insert all cases as one batch, returning ids in input order
    async fn persist_batch(&self, cases: &[MappedCase]) -> Result<Vec<i64>>;
}
