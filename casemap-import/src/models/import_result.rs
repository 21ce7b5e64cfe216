//! Import outcome and per-row errors
//!
//! Every input row ends up in exactly one of `errors` or `imported_cases`.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::{MappedCase, ResolutionTier};

/// Key raw fields of a failed row, enough to fix the source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub year: String,
    pub age: String,
    pub classification: String,
    pub neighborhood: String,
    pub latitude: String,
    pub longitude: String,
}

/// A row that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Source file row number (1-based, header included)
    pub row_number: usize,
    pub message: String,
    pub raw: RowSnapshot,
}

/// Summary of a persisted case for review screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedCase {
    pub id: i64,
    pub row_number: usize,
    pub temporary_name: String,
    pub neighborhood: String,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
    pub tier: Option<ResolutionTier>,
}

impl ImportedCase {
    pub fn from_mapped(id: i64, case: &MappedCase) -> Self {
        let (latitude, longitude, tier) = match &case.coordinate {
            Some(c) => (Some(c.latitude.clone()), Some(c.longitude.clone()), Some(c.tier)),
            None => (None, None, None),
        };

        Self {
            id,
            row_number: case.row_number,
            temporary_name: case.temporary_name.clone(),
            neighborhood: case.neighborhood.clone(),
            latitude,
            longitude,
            tier,
        }
    }
}

/// Import completion result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Non-blank data rows seen
    pub total_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    /// Wall-clock processing time in milliseconds
    pub duration_ms: u64,
    /// Failed rows in file order
    pub errors: Vec<RowError>,
    /// Imported rows in file order
    pub imported_cases: Vec<ImportedCase>,
}

impl ImportOutcome {
    /// Build an outcome; counts are derived so totals always add up
    pub fn new(errors: Vec<RowError>, imported_cases: Vec<ImportedCase>, duration_ms: u64) -> Self {
        Self {
            total_rows: errors.len() + imported_cases.len(),
            successful_imports: imported_cases.len(),
            failed_imports: errors.len(),
            duration_ms,
            errors,
            imported_cases,
        }
    }
}
