//! Link preview handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use waveform_core::models::LinkPreviewRequest;

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::parse_json;

const CACHE_CONTROL: &str = "max-age=3600";

/// `POST /api/link-preview`: `{url, context?}` to `{title?, description?, site_name?, image?}`.
pub async fn link_preview(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let request: LinkPreviewRequest = if body.is_empty() {
        LinkPreviewRequest::default()
    } else {
        parse_json(&body)?
    };
    let preview = state.previews.preview(&request).await?;
    Ok(([(header::CACHE_CONTROL, CACHE_CONTROL)], Json(preview)))
}
