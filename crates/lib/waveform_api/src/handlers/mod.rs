//! Request handlers.

pub mod auth;
pub mod health;
pub mod link_preview;
pub mod proxy;
pub mod user;

use axum::extract::OriginalUri;

use crate::error::AppError;

/// Fallback for unknown `/api/*` routes.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound {
        path: uri.path().to_string(),
    }
}

/// Parse a JSON request body, rejecting anything that is not JSON.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting request body");
        AppError::Validation("Invalid JSON in request body".into())
    })
}
