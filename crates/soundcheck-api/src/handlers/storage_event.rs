use crate::auth::WebhookAuthorized;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use soundcheck_core::models::TriggerEvent;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Storage-insert webhook: run the extraction pipeline for the inserted object
#[tracing::instrument(skip(state, _auth, payload), fields(operation = "storage_event"))]
pub async fn handle_storage_event(
    State(state): State<Arc<AppState>>,
    _auth: WebhookAuthorized,
    ValidatedJson(payload): ValidatedJson<serde_json::Value>,
) -> Result<impl IntoResponse, HttpAppError> {
    let event = TriggerEvent::from_json(payload);

    let outcome = state.extractor.handle(event).await?;

    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}
