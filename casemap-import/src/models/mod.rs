//! Data models for the case importer
//!
//! - Raw rows as read from a file
//! - Resolved coordinates and the audit trail of how they were found
//! - Mapped cases ready for persistence
//! - The per-import outcome returned to callers

pub mod coordinate;
pub mod import_result;
pub mod import_row;
pub mod mapped_case;

pub use coordinate::{
    AttemptResult, Resolution, ResolutionOutcome, ResolutionTier, ResolvedCoordinate, Specificity,
    TierAttempt,
};
pub use import_result::{ImportOutcome, ImportedCase, RowError, RowSnapshot};
pub use import_row::{ImportRow, RowField};
pub use mapped_case::MappedCase;
