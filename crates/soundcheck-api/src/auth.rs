//! Optional shared-secret check for webhook deliveries
//!
//! When `WEBHOOK_SECRET` is configured, every delivery must carry
//! `Authorization: Bearer <secret>`. Without it the endpoint is open and relies
//! on the hosted backend's own gateway key.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use soundcheck_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check an `Authorization` header value against the configured secret
pub fn verify_bearer(expected: &str, header: Option<&str>) -> Result<(), AppError> {
    let header = header
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    if !secure_compare(token.trim(), expected) {
        return Err(AppError::Unauthorized("Invalid webhook secret".to_string()));
    }

    Ok(())
}

/// Extractor guarding webhook handlers; rejects with 401 on a bad secret
pub struct WebhookAuthorized;

impl FromRequestParts<Arc<AppState>> for WebhookAuthorized {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.webhook_secret.as_deref() else {
            return Ok(WebhookAuthorized);
        };

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        verify_bearer(expected, header).map_err(|err| {
            tracing::warn!(error = %err, "Rejected webhook delivery");
            HttpAppError(err)
        })?;

        Ok(WebhookAuthorized)
    }
}
