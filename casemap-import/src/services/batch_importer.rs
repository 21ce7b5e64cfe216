//! Batch import of one uploaded file
//!
//! Flow: decode file → resolve initial workflow state → map rows in file
//! order → persist all mapped cases in one batch → summarize.
//!
//! Row failures are isolated and reported in the outcome. Fatal failures
//! (unreadable file, catalog or store errors, cancellation) abort the whole
//! import and nothing is persisted.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::file_reader::{read_rows, FileFormat};
use super::row_mapper::{MappingContext, RowMapper, RowMappingError};
use crate::error::ImportError;
use crate::models::{ImportOutcome, ImportedCase, RowError};
use crate::types::{CaseStore, ReferenceCatalog};

/// Uploaded file contents
#[derive(Debug, Clone)]
pub struct ImportSource {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImportSource {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Which catalog entry new cases start in
#[derive(Debug, Clone)]
pub struct InitialState {
    pub category: String,
    pub name: String,
}

pub struct BatchImporter {
    mapper: RowMapper,
    catalog: Arc<dyn ReferenceCatalog>,
    store: Arc<dyn CaseStore>,
    initial_state: InitialState,
}

impl BatchImporter {
    pub fn new(
        mapper: RowMapper,
        catalog: Arc<dyn ReferenceCatalog>,
        store: Arc<dyn CaseStore>,
        initial_state: InitialState,
    ) -> Self {
        Self {
            mapper,
            catalog,
            store,
            initial_state,
        }
    }

    /// Import every row of `source` on behalf of `imported_by`
    ///
    /// Returns either a complete outcome or a single fatal error, never a
    /// partial result.
    pub async fn import(
        &self,
        source: ImportSource,
        imported_by: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome, ImportError> {
        let file_name = source.file_name.clone();
        info!(file = %file_name, bytes = source.bytes.len(), actor = %imported_by, "Starting import");

        match self.run(source, imported_by, cancel).await {
            Ok(outcome) => {
                info!(
                    file = %file_name,
                    total = outcome.total_rows,
                    imported = outcome.successful_imports,
                    failed = outcome.failed_imports,
                    duration_ms = outcome.duration_ms,
                    "Import completed"
                );
                Ok(outcome)
            }
            Err(ImportError::Cancelled) => {
                warn!(file = %file_name, "Import cancelled, nothing persisted");
                Err(ImportError::Cancelled)
            }
            Err(e) => {
                error!(file = %file_name, error = %e, "Import failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        source: ImportSource,
        imported_by: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome, ImportError> {
        let start = Instant::now();

        let format = FileFormat::from_file_name(&source.file_name)?;
        let rows = tokio::task::spawn_blocking(move || read_rows(&source.bytes, format))
            .await
            .map_err(|e| ImportError::UnreadableFile(format!("Reader task failed: {}", e)))??;

        if rows.is_empty() {
            debug!("No data rows in file");
            return Ok(ImportOutcome::new(
                Vec::new(),
                Vec::new(),
                start.elapsed().as_millis() as u64,
            ));
        }

        let workflow_state_id = self.resolve_initial_state().await?;
        let context = MappingContext {
            workflow_state_id,
            imported_by,
            imported_at: Utc::now(),
        };

        let mut staged = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (row_number, row) in &rows {
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }

            match self.mapper.map(row, *row_number, &context).await {
                Ok(case) => staged.push(case),
                Err(RowMappingError::Catalog(e)) => return Err(ImportError::Catalog(e)),
                Err(e) => {
                    warn!(row = row_number, error = %e, "Row rejected");
                    errors.push(RowError {
                        row_number: *row_number,
                        message: e.to_string(),
                        raw: row.snapshot(),
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let ids = if staged.is_empty() {
            Vec::new()
        } else {
            self.store
                .persist_batch(&staged)
                .await
                .map_err(ImportError::Persistence)?
        };

        if ids.len() != staged.len() {
            return Err(ImportError::Persistence(casemap_common::Error::Internal(format!(
                "Store returned {} ids for {} cases",
                ids.len(),
                staged.len()
            ))));
        }

        let imported = ids
            .iter()
            .zip(&staged)
            .map(|(id, case)| ImportedCase::from_mapped(*id, case))
            .collect();

        Ok(ImportOutcome::new(
            errors,
            imported,
            start.elapsed().as_millis() as u64,
        ))
    }

    async fn resolve_initial_state(&self) -> Result<i64, ImportError> {
        let InitialState { category, name } = &self.initial_state;
        self.catalog
            .find_active_by_name(category, name)
            .await
            .map_err(ImportError::Catalog)?
            .ok_or_else(|| ImportError::MissingInitialState(name.clone()))
    }
}
