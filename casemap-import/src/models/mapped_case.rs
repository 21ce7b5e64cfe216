//! Validated case record produced by the row mapper

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ResolvedCoordinate;

/// A row that passed validation, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedCase {
    /// Source file row number (1-based, header included)
    pub row_number: usize,
    pub classification_id: i64,
    pub workflow_state_id: i64,
    pub year: i32,
    pub age: i32,
    pub neighborhood: String,
    pub address: String,
    pub description: String,
    pub temporary_name: String,
    pub notes: Option<String>,
    pub coordinate: Option<ResolvedCoordinate>,
    pub imported_by: Uuid,
    pub imported_at: DateTime<Utc>,
}
