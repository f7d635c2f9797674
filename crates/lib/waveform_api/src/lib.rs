//! # waveform_api
//!
//! HTTP API library for Waveform: the hosted-UI login flow, the current-user
//! endpoint, the story API proxy and link previews.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use waveform_core::preview::LinkPreviewService;
use waveform_core::proxy::ProxyService;
use waveform_core::session::{Base64JsonCodec, SessionCodec};
use waveform_core::transport::HttpTransport;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, link_preview, proxy, user};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    /// Outbound HTTP for the identity provider.
    pub transport: Arc<dyn HttpTransport>,
    pub proxy: Arc<ProxyService>,
    pub previews: Arc<LinkPreviewService>,
    pub sessions: Arc<dyn SessionCodec>,
}

impl AppState {
    /// Wire every service to one shared transport.
    pub fn new(config: ApiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let proxy = ProxyService::new(
            transport.clone(),
            config.upstreams.clone(),
            config.api_key.clone(),
        );
        let previews = LinkPreviewService::new(transport.clone(), config.api_key.clone());
        Self {
            config: Arc::new(config),
            transport,
            proxy: Arc::new(proxy),
            previews: Arc::new(previews),
            sessions: Arc::new(Base64JsonCodec),
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/user", get(user::current_user))
        .route("/top-stories", post(proxy::top_stories))
        .route("/breaking-news", post(proxy::breaking_news))
        .route("/article", post(proxy::article))
        .route("/event", post(proxy::event))
        .route("/link-preview", post(link_preview::link_preview))
        .fallback(handlers::not_found)
        .layer(cors);

    Router::new()
        .route("/health", get(health::health))
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
