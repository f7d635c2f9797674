//! Story API proxy.
//!
//! Injects the server-held API key and forwards the caller's JSON body to a
//! fixed upstream URL per route. `article` and `event` responses carry their
//! payload double-encoded and are unwrapped before returning.

mod unwrap;

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error};

use crate::transport::{HttpTransport, OutboundRequest, TransportError};

pub use unwrap::unwrap_double_encoded;

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Every route served under `/api`.
pub const AVAILABLE_ROUTES: [&str; 5] = [
    "/api/top-stories",
    "/api/breaking-news",
    "/api/event",
    "/api/article",
    "/api/link-preview",
];

/// Proxy failures. Messages are safe to return to callers.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("{0}")]
    UpstreamParse(String),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),
}

/// A forwarded upstream route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyRoute {
    TopStories,
    BreakingNews,
    Article,
    Event,
}

impl ProxyRoute {
    pub fn name(&self) -> &'static str {
        match self {
            ProxyRoute::TopStories => "top-stories",
            ProxyRoute::BreakingNews => "breaking-news",
            ProxyRoute::Article => "article",
            ProxyRoute::Event => "event",
        }
    }
}

/// Upstream URL per route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub top_stories: String,
    pub breaking_news: String,
    pub article: String,
    pub event: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            top_stories: "https://qxo4xa3yoa.execute-api.us-east-1.amazonaws.com/Prod/top-stories/"
                .into(),
            breaking_news: "https://z4sqpmcefg.execute-api.us-east-1.amazonaws.com/Prod/events"
                .into(),
            article: "https://s2ngde15vg.execute-api.us-east-1.amazonaws.com/Prod/article/".into(),
            event: "https://po8ob8r11k.execute-api.us-east-1.amazonaws.com/Prod/event/".into(),
        }
    }
}

impl UpstreamEndpoints {
    pub fn url_for(&self, route: ProxyRoute) -> &str {
        match route {
            ProxyRoute::TopStories => &self.top_stories,
            ProxyRoute::BreakingNews => &self.breaking_news,
            ProxyRoute::Article => &self.article,
            ProxyRoute::Event => &self.event,
        }
    }
}

/// Stateless forwarder for the story API routes.
pub struct ProxyService {
    transport: Arc<dyn HttpTransport>,
    endpoints: UpstreamEndpoints,
    api_key: Option<String>,
}

impl ProxyService {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoints: UpstreamEndpoints,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            endpoints,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Fails with [`ProxyError::MissingApiKey`] when no key is configured.
    pub fn ensure_configured(&self) -> Result<(), ProxyError> {
        self.api_key().map(|_| ())
    }

    fn api_key(&self) -> Result<&str, ProxyError> {
        self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)
    }

    /// Dispatch `body` to `route` and apply the route's unwrap rule.
    pub async fn handle(&self, route: ProxyRoute, body: Value) -> Result<Value, ProxyError> {
        match route {
            ProxyRoute::TopStories | ProxyRoute::BreakingNews => self.forward(route, body).await,
            ProxyRoute::Article => {
                let upstream = self
                    .forward(route, json!({ "article_id": field(&body, "article_id") }))
                    .await?;
                unwrap_double_encoded(upstream, "article")
            }
            ProxyRoute::Event => {
                let upstream = self
                    .forward(route, json!({ "event_id": field(&body, "event_id") }))
                    .await?;
                unwrap_double_encoded(upstream, "event")
            }
        }
    }

    async fn forward(&self, route: ProxyRoute, body: Value) -> Result<Value, ProxyError> {
        let api_key = self.api_key()?;
        let url = self.endpoints.url_for(route);
        debug!(route = route.name(), "forwarding to upstream");

        let request = OutboundRequest::post_json(url, body).header(API_KEY_HEADER, api_key);
        let resp = self.transport.send(request).await.inspect_err(|e| {
            error!(route = route.name(), error = %e, "upstream request failed");
        })?;

        if !resp.is_success() {
            let detail = describe_error_body(&resp.body).replace(api_key, "[redacted]");
            error!(
                route = route.name(),
                status = resp.status,
                body = %detail,
                "upstream returned an error status"
            );
            let message = if detail.is_empty() {
                format!("API responded with status: {}", resp.status)
            } else {
                format!("API responded with status: {} - {detail}", resp.status)
            };
            return Err(ProxyError::UpstreamStatus {
                status: resp.status,
                message,
            });
        }

        resp.json().map_err(|e| {
            error!(route = route.name(), error = %e, "upstream body is not JSON");
            ProxyError::UpstreamParse(format!(
                "Failed to parse {} response from upstream API: {e}",
                route.name()
            ))
        })
    }
}

fn field(body: &Value, name: &str) -> Value {
    body.get(name).cloned().unwrap_or(Value::Null)
}

/// Compact JSON if the body parses, otherwise the trimmed text.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
