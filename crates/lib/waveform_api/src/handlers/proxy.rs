//! Story API proxy handlers.
//!
//! The key check runs before the body is read, so an unconfigured server
//! answers 500 regardless of what the caller sent.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;
use waveform_core::proxy::ProxyRoute;

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::parse_json;

async fn forward(state: &AppState, route: ProxyRoute, body: &[u8]) -> AppResult<Json<Value>> {
    state.proxy.ensure_configured()?;
    let body: Value = parse_json(body)?;
    let out = state.proxy.handle(route, body).await?;
    Ok(Json(out))
}

/// `POST /api/top-stories`
pub async fn top_stories(State(state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    forward(&state, ProxyRoute::TopStories, &body).await
}

/// `POST /api/breaking-news`
pub async fn breaking_news(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    forward(&state, ProxyRoute::BreakingNews, &body).await
}

/// `POST /api/article`: returns the unwrapped article object.
pub async fn article(State(state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    forward(&state, ProxyRoute::Article, &body).await
}

/// `POST /api/event`: returns the unwrapped event object.
pub async fn event(State(state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    forward(&state, ProxyRoute::Event, &body).await
}
