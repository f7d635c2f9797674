//! Outbound HTTP transport.
//!
//! Every call Waveform makes to a third party (story APIs, the identity
//! provider, link-preview targets) goes through [`HttpTransport`], so handlers
//! can be exercised against scripted responses without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Default timeout applied to every outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A transport-agnostic outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<OutboundBody>,
    /// Response bytes kept before the body is cut off; `None` reads it all.
    pub max_body_bytes: Option<usize>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            max_body_bytes: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(OutboundBody::Json(body)),
            max_body_bytes: None,
        }
    }

    pub fn post_form(url: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(OutboundBody::Form(fields)),
            max_body_bytes: None,
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Read at most `bytes` of the response body.
    pub fn limit_body(mut self, bytes: usize) -> Self {
        self.max_body_bytes = Some(bytes);
        self
    }

    /// Append an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body text of an upstream response.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

impl OutboundResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Failures before any HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let timed_out = e.is_timeout();
        let msg = e.without_url().to_string();
        if timed_out {
            TransportError::Timeout(msg)
        } else {
            TransportError::Request(msg)
        }
    }
}

/// Sends outbound HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests expire after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

/// Append `chunk` to `buf` without letting it grow past `limit`. Returns
/// true once the limit is reached.
pub(crate) fn append_limited(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() >= limit
}

async fn read_body(
    mut resp: reqwest::Response,
    limit: Option<usize>,
) -> Result<String, TransportError> {
    let Some(limit) = limit else {
        return Ok(resp.text().await?);
    };
    let declared = resp.content_length().unwrap_or(0);
    if declared > limit as u64 {
        debug!(declared, limit, "response larger than limit, truncating");
    }
    let capacity = usize::try_from(declared).unwrap_or(limit).min(limit);
    let mut buf = Vec::with_capacity(capacity);
    while let Some(chunk) = resp.chunk().await? {
        if append_limited(&mut buf, &chunk, limit) {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(OutboundBody::Json(body)) => builder.json(&body),
            Some(OutboundBody::Form(fields)) => builder.form(&fields),
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = read_body(resp, request.max_body_bytes).await?;
        Ok(OutboundResponse { status, body })
    }
}

/// Scripted transports for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{
        HttpTransport, OutboundRequest, OutboundResponse, TransportError, append_limited,
    };

    /// Replays queued responses in order and records every request it sees.
    ///
    /// Once the queue is exhausted further sends fail with
    /// [`TransportError::Request`].
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<OutboundResponse, TransportError>>>,
        requests: Mutex<Vec<OutboundRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_json(&self, status: u16, body: serde_json::Value) -> &Self {
            self.push(Ok(OutboundResponse::new(status, body.to_string())))
        }

        pub fn push_text(&self, status: u16, body: &str) -> &Self {
            self.push(Ok(OutboundResponse::new(status, body)))
        }

        pub fn push_error(&self, err: TransportError) -> &Self {
            self.push(Err(err))
        }

        fn push(&self, response: Result<OutboundResponse, TransportError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        /// Number of requests sent so far.
        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Snapshot of every request sent so far.
        pub fn requests(&self) -> Vec<OutboundRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(
            &self,
            request: OutboundRequest,
        ) -> Result<OutboundResponse, TransportError> {
            let limit = request.max_body_bytes;
            self.requests.lock().unwrap().push(request);
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Request("no scripted response".into())));
            response.map(|mut resp| {
                if let Some(limit) = limit {
                    let mut buf = Vec::new();
                    append_limited(&mut buf, resp.body.as_bytes(), limit);
                    resp.body = String::from_utf8_lossy(&buf).into_owned();
                }
                resp
            })
        }
    }
}
