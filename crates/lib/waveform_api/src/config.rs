//! API server configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;
use waveform_core::oauth::{DEFAULT_SCOPES, IdentityProviderConfig};
use waveform_core::proxy::UpstreamEndpoints;
use waveform_core::transport::DEFAULT_TIMEOUT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8788").
    pub bind_addr: String,
    /// Origin browsers reach the app at; redirect and logout URIs hang off it.
    pub public_origin: String,
    /// Story API key. Without it every proxy route answers 500.
    pub api_key: Option<String>,
    pub identity: IdentityProviderConfig,
    /// Where the browser lands after login.
    pub post_login_redirect: String,
    pub upstreams: UpstreamEndpoints,
    pub http_timeout: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                       | Default                      |
    /// |--------------------------------|------------------------------|
    /// | `BIND_ADDR`                    | `127.0.0.1:8788`             |
    /// | `WAVEFORM_PUBLIC_ORIGIN`       | `http://localhost:8788`      |
    /// | `WAVEFORM_API_KEY`             | unset                        |
    /// | `COGNITO_DOMAIN`               | required                     |
    /// | `COGNITO_CLIENT_ID`            | required                     |
    /// | `COGNITO_CLIENT_SECRET`        | unset                        |
    /// | `COGNITO_SCOPES`               | `email openid phone profile` |
    /// | `WAVEFORM_POST_LOGIN_REDIRECT` | `/`                          |
    /// | `WAVEFORM_TOP_STORIES_URL`, `WAVEFORM_BREAKING_NEWS_URL`, `WAVEFORM_ARTICLE_URL`, `WAVEFORM_EVENT_URL` | built-in upstreams |
    /// | `WAVEFORM_HTTP_TIMEOUT_SECS`   | `20`                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let public_origin = var("WAVEFORM_PUBLIC_ORIGIN")
            .unwrap_or_else(|| "http://localhost:8788".into())
            .trim_end_matches('/')
            .to_string();
        validate_origin(&public_origin)?;

        let defaults = UpstreamEndpoints::default();
        let upstreams = UpstreamEndpoints {
            top_stories: var("WAVEFORM_TOP_STORIES_URL").unwrap_or(defaults.top_stories),
            breaking_news: var("WAVEFORM_BREAKING_NEWS_URL").unwrap_or(defaults.breaking_news),
            article: var("WAVEFORM_ARTICLE_URL").unwrap_or(defaults.article),
            event: var("WAVEFORM_EVENT_URL").unwrap_or(defaults.event),
        };

        let http_timeout = match var("WAVEFORM_HTTP_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "WAVEFORM_HTTP_TIMEOUT_SECS",
                    reason: format!("expected a positive number of seconds, got {raw:?}"),
                })?,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8788".into()),
            public_origin,
            api_key: var("WAVEFORM_API_KEY"),
            identity: IdentityProviderConfig {
                domain: required("COGNITO_DOMAIN")?,
                client_id: required("COGNITO_CLIENT_ID")?,
                client_secret: var("COGNITO_CLIENT_SECRET"),
                scopes: var("COGNITO_SCOPES").unwrap_or_else(|| DEFAULT_SCOPES.into()),
            },
            post_login_redirect: var("WAVEFORM_POST_LOGIN_REDIRECT").unwrap_or_else(|| "/".into()),
            upstreams,
            http_timeout,
        })
    }

    /// Replace the public origin, applying the same checks as the environment.
    pub fn set_public_origin(&mut self, origin: &str) -> Result<(), ConfigError> {
        let origin = origin.trim().trim_end_matches('/');
        validate_origin(origin)?;
        self.public_origin = origin.to_string();
        Ok(())
    }

    /// Cookies carry `Secure` when the app is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.public_origin.starts_with("https://")
    }

    /// OAuth `redirect_uri`; must be identical at login and at code exchange.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.public_origin)
    }

    /// Where the identity provider sends the browser after logout: the
    /// post-login landing when it is absolute, the app root otherwise.
    pub fn logout_uri(&self) -> String {
        if Url::parse(&self.post_login_redirect).is_ok() {
            self.post_login_redirect.clone()
        } else {
            format!("{}/", self.public_origin)
        }
    }
}

fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "WAVEFORM_PUBLIC_ORIGIN",
        reason,
    };
    let url = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
