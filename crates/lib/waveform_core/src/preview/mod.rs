//! Link previews.
//!
//! Fetches an arbitrary page, scrapes Open Graph / Twitter-card metadata and
//! caches the result per URL for an hour.

mod cache;
mod extract;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::{LinkPreview, LinkPreviewRequest, PreviewContext};
use crate::transport::{HttpTransport, OutboundRequest, TransportError};

pub use cache::PreviewCache;
pub use extract::{extract_meta, extract_preview, extract_title};

/// User agent announced to preview targets.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; WaveformBot/1.0; +https://waveform.com)";

/// Bytes of a target page read before scraping; metadata lives in `<head>`.
pub const PREVIEW_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// How long a fetched preview stays fresh.
pub const PREVIEW_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch URL: {0}")]
    UpstreamStatus(u16),

    #[error("Failed to fetch URL: {0}")]
    Network(#[from] TransportError),
}

/// Fetches and caches link previews.
pub struct LinkPreviewService {
    transport: Arc<dyn HttpTransport>,
    api_key: Option<String>,
    cache: Arc<PreviewCache>,
}

impl LinkPreviewService {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key: api_key.filter(|k| !k.is_empty()),
            cache: Arc::new(PreviewCache::new(PREVIEW_TTL)),
        }
    }

    pub fn cache(&self) -> &Arc<PreviewCache> {
        &self.cache
    }

    /// Preview the requested URL for the requested context.
    pub async fn preview(&self, request: &LinkPreviewRequest) -> Result<LinkPreview, PreviewError> {
        if self.api_key.is_none() {
            return Err(PreviewError::MissingApiKey);
        }
        let raw = request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(PreviewError::MissingUrl)?;
        let url = parse_target(raw)?;
        let context = PreviewContext::parse(request.context.as_deref());

        let preview = match self.cache.get(url.as_str()) {
            Some(hit) => {
                debug!(url = %url, context = context.as_str(), "link preview cache hit");
                hit
            }
            None => {
                let fetched = self.fetch(&url).await?;
                self.cache.insert(url.as_str(), fetched.clone());
                fetched
            }
        };
        Ok(preview.for_context(context))
    }

    async fn fetch(&self, url: &Url) -> Result<LinkPreview, PreviewError> {
        let request = OutboundRequest::get(url.as_str())
            .header("user-agent", USER_AGENT)
            .header("accept", "text/html,application/xhtml+xml")
            .limit_body(PREVIEW_MAX_BODY_BYTES);
        let resp = self.transport.send(request).await.inspect_err(|e| {
            warn!(url = %url, error = %e, "link preview fetch failed");
        })?;
        if !resp.is_success() {
            warn!(url = %url, status = resp.status, "link preview target returned an error");
            return Err(PreviewError::UpstreamStatus(resp.status));
        }
        Ok(extract_preview(&resp.body))
    }
}

fn parse_target(raw: &str) -> Result<Url, PreviewError> {
    let url = Url::parse(raw).map_err(|e| PreviewError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PreviewError::InvalidUrl(format!(
            "unsupported scheme: {other}"
        ))),
    }
}
