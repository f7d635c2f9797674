//! Client for Waveform's own `/api` routes.
//!
//! Used by the CLI and as the remote [`EventRepository`]. The server injects
//! the upstream API key, so no credentials travel with these requests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::feed::{EventRepository, FeedError, FeedMode};
use crate::models::{FeedPage, FeedRequest, LinkPreview, PreviewContext};
use crate::transport::{HttpTransport, OutboundRequest, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx from the server; `message` is its `{error}` text when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Typed access to a running Waveform server.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8788`.
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str) -> Result<Self, ClientError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            transport,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn top_stories(&self, request: &FeedRequest) -> Result<FeedPage, ClientError> {
        self.post("top-stories", to_value(request)?).await
    }

    pub async fn breaking_news(&self, request: &FeedRequest) -> Result<FeedPage, ClientError> {
        self.post("breaking-news", to_value(request)?).await
    }

    pub async fn article(&self, article_id: &str) -> Result<Value, ClientError> {
        self.post("article", json!({ "article_id": article_id })).await
    }

    pub async fn event(&self, event_id: &str) -> Result<Value, ClientError> {
        self.post("event", json!({ "event_id": event_id })).await
    }

    pub async fn link_preview(
        &self,
        url: &str,
        context: Option<&str>,
    ) -> Result<LinkPreview, ClientError> {
        let context = context.unwrap_or(PreviewContext::Default.as_str());
        self.post("link-preview", json!({ "url": url, "context": context })).await
    }

    async fn post<T: DeserializeOwned>(&self, route: &str, body: Value) -> Result<T, ClientError> {
        let url = self
            .base_url
            .join(&format!("api/{route}"))
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        debug!(%url, "api request");

        let resp = self
            .transport
            .send(OutboundRequest::post_json(url.as_str(), body))
            .await?;
        if !resp.is_success() {
            let message = resp
                .json()
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("API error: {}", resp.status));
            return Err(ClientError::Api {
                status: resp.status,
                message,
            });
        }
        serde_json::from_str(&resp.body).map_err(|e| ClientError::Parse(format!("{route}: {e}")))
    }
}

fn to_value(request: &FeedRequest) -> Result<Value, ClientError> {
    serde_json::to_value(request).map_err(|e| ClientError::Parse(e.to_string()))
}

#[async_trait]
impl EventRepository for ApiClient {
    async fn fetch_page(
        &self,
        mode: FeedMode,
        request: &FeedRequest,
    ) -> Result<FeedPage, FeedError> {
        let page = match mode {
            FeedMode::TopStories => self.top_stories(request).await?,
            FeedMode::BreakingNews => self.breaking_news(request).await?,
        };
        Ok(page)
    }
}
