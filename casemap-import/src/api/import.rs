//! Import API handlers
//!
//! POST /import                      upload a file (raw body), wait for the outcome
//! POST /import/cancel/:session_id   cancel an import in flight

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::ImportOutcome,
    services::ImportSource,
    AppState,
};

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// POST /import query parameters
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// Original file name; its extension selects the decoder
    pub file_name: String,
    /// Actor recorded as the importer of every case
    pub imported_by: Uuid,
    /// Client-chosen id, needed to cancel the import later
    pub session_id: Option<Uuid>,
}

/// POST /import/cancel response
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelImportResponse {
    pub session_id: Uuid,
    pub cancelled: bool,
}

/// Registry entry for one running import
///
/// Dropping the guard cancels the token and unregisters the session, also
/// when the handler future is dropped because the client went away.
struct SessionGuard {
    sessions: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    session_id: Uuid,
    token: CancellationToken,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.token.cancel();

        if let Ok(mut sessions) = self.sessions.try_write() {
            sessions.remove(&self.session_id);
            return;
        }

        // Lock busy: finish the removal on the runtime
        let sessions = Arc::clone(&self.sessions);
        let session_id = self.session_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sessions.write().await.remove(&session_id);
                });
            }
            Err(_) => {
                tracing::warn!(session_id = %session_id, "Could not release import session");
            }
        }
    }
}

/// POST /import
///
/// Runs the import to completion and returns the full outcome.
pub async fn import_file(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<Json<ImportOutcome>> {
    if query.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("file_name is required".to_string()));
    }

    let session_id = query.session_id.unwrap_or_else(Uuid::new_v4);
    let token = CancellationToken::new();

    {
        let mut tokens = state.cancellation_tokens.write().await;
        if tokens.contains_key(&session_id) {
            return Err(ApiError::Conflict(format!(
                "Import session already running: {}",
                session_id
            )));
        }
        tokens.insert(session_id, token.clone());
    }
    let session = SessionGuard {
        sessions: Arc::clone(&state.cancellation_tokens),
        session_id,
        token: token.clone(),
    };

    tracing::info!(
        session_id = %session_id,
        file = %query.file_name,
        "Import request received"
    );

    let source = ImportSource::new(query.file_name, body.to_vec());
    let result = state
        .importer
        .import(source, query.imported_by, &token)
        .await;

    drop(session);

    match result {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(ApiError::Import(e))
        }
    }
}

/// POST /import/cancel/:session_id
pub async fn cancel_import(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CancelImportResponse>> {
    let tokens = state.cancellation_tokens.read().await;
    let token = tokens
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Import session not found: {}", session_id)))?;

    token.cancel();
    tracing::info!(session_id = %session_id, "Import cancellation requested");

    Ok(Json(CancelImportResponse {
        session_id,
        cancelled: true,
    }))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/import",
            post(import_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/import/cancel/:session_id", post(cancel_import))
}
