//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use waveform_core::oauth::OAuthError;
use waveform_core::preview::PreviewError;
use waveform_core::proxy::{AVAILABLE_ROUTES, ProxyError};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping. Every variant renders as
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// OAuth `state` did not match the stored cookie.
    #[error("{0}")]
    Csrf(String),

    #[error("Not found")]
    NotFound { path: String },

    #[error("{0}")]
    Configuration(String),

    /// An upstream answered with an error, an unparseable body or not at all.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::Csrf(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Upstream(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = match &self {
            AppError::NotFound { path } => json!({
                "error": self.to_string(),
                "path": path,
                "availableRoutes": AVAILABLE_ROUTES,
            }),
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::MissingApiKey => AppError::Configuration(e.to_string()),
            ProxyError::UpstreamStatus { .. }
            | ProxyError::UpstreamParse(_)
            | ProxyError::Network(_) => AppError::Upstream(e.to_string()),
        }
    }
}

impl From<PreviewError> for AppError {
    fn from(e: PreviewError) -> Self {
        match e {
            PreviewError::MissingApiKey => AppError::Configuration(e.to_string()),
            PreviewError::MissingUrl | PreviewError::InvalidUrl(_) => {
                AppError::Validation(e.to_string())
            }
            PreviewError::UpstreamStatus(_) | PreviewError::Network(_) => {
                AppError::Upstream(e.to_string())
            }
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::StateMismatch => AppError::Csrf(e.to_string()),
            OAuthError::MissingCode => AppError::Validation(e.to_string()),
            OAuthError::MissingClientSecret | OAuthError::InvalidUrl(_) => {
                AppError::Configuration(e.to_string())
            }
            OAuthError::TokenExchange { .. }
            | OAuthError::UserInfo { .. }
            | OAuthError::Parse(_)
            | OAuthError::Network(_) => AppError::Upstream(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn missing_api_key_is_a_500_with_message() {
        let (status, body) = render(ProxyError::MissingApiKey.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "API key not configured"}));
    }

    #[tokio::test]
    async fn state_mismatch_is_a_400() {
        let (status, body) = render(OAuthError::StateMismatch.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid state parameter");
    }

    #[tokio::test]
    async fn token_exchange_hides_provider_body() {
        let err = OAuthError::TokenExchange {
            status: 400,
            body: "invalid_client secret=abc".into(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to exchange code for tokens");
    }

    #[tokio::test]
    async fn not_found_lists_routes() {
        let (status, body) = render(AppError::NotFound {
            path: "/api/nope".into(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["path"], "/api/nope");
        assert_eq!(body["availableRoutes"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (_, body) = render(AppError::Internal("stack trace".into())).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}
