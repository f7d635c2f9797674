//! Hosted-UI OAuth2 / OIDC client.
//!
//! Builds the authorize and logout URLs, validates the CSRF `state`, and runs
//! the authorization-code exchange followed by the user-info call.
//!
//! The `nonce` is generated, stored and sent with the authorize request but is
//! not checked against the ID token.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use crate::session::UserInfo;
use crate::transport::{HttpTransport, OutboundRequest, TransportError};

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &str = "email openid phone profile";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid state parameter")]
    StateMismatch,

    #[error("Authorization code missing")]
    MissingCode,

    #[error("OAuth client secret not configured")]
    MissingClientSecret,

    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to exchange code for tokens")]
    TokenExchange { status: u16, body: String },

    #[error("Failed to fetch user info")]
    UserInfo { status: u16, body: String },

    #[error("Unexpected identity provider response: {0}")]
    Parse(String),

    #[error("Identity provider unreachable: {0}")]
    Network(#[from] TransportError),
}

/// Identity provider settings.
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    /// Hosted-UI domain, e.g. `auth.example.com`. A full `http(s)://` base is
    /// accepted too.
    pub domain: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: String,
}

impl IdentityProviderConfig {
    fn base(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, OAuthError> {
        Url::parse(&format!("{}{path}", self.base()))
            .map_err(|e| OAuthError::InvalidUrl(e.to_string()))
    }

    pub fn token_url(&self) -> Result<Url, OAuthError> {
        self.endpoint("/oauth2/token")
    }

    pub fn user_info_url(&self) -> Result<Url, OAuthError> {
        self.endpoint("/oauth2/userInfo")
    }

    /// Hosted-UI login URL carrying `state` and `nonce`.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        state: &str,
        nonce: &str,
    ) -> Result<Url, OAuthError> {
        let mut url = self.endpoint("/login")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state)
            .append_pair("nonce", nonce);
        Ok(url)
    }

    /// Provider logout URL that returns the browser to `logout_uri`.
    pub fn logout_url(&self, logout_uri: &str) -> Result<Url, OAuthError> {
        let mut url = self.endpoint("/logout")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("logout_uri", logout_uri);
        Ok(url)
    }
}

/// Everything the login handler needs to start the flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub nonce: String,
    pub url: Url,
}

/// Generate fresh `state`/`nonce` values and the authorize URL.
pub fn begin_login(
    config: &IdentityProviderConfig,
    redirect_uri: &str,
) -> Result<AuthorizationRequest, OAuthError> {
    let state = Uuid::new_v4().to_string();
    let nonce = Uuid::new_v4().to_string();
    let url = config.authorize_url(redirect_uri, &state, &nonce)?;
    Ok(AuthorizationRequest { state, nonce, url })
}

/// The returned `state` must be present and byte-identical to the stored one.
pub fn verify_state(returned: Option<&str>, stored: Option<&str>) -> Result<(), OAuthError> {
    match (returned, stored) {
        (Some(r), Some(s)) if !r.is_empty() && r.as_bytes() == s.as_bytes() => Ok(()),
        _ => Err(OAuthError::StateMismatch),
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

/// Exchange an authorization code for tokens.
///
/// `redirect_uri` must be the one used to build the authorize URL.
pub async fn exchange_code(
    transport: &dyn HttpTransport,
    config: &IdentityProviderConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse, OAuthError> {
    let secret = config
        .client_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(OAuthError::MissingClientSecret)?;
    let credentials = STANDARD.encode(format!("{}:{secret}", config.client_id));

    let request = OutboundRequest::post_form(
        config.token_url()?.as_str(),
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &config.client_id),
            ("redirect_uri", redirect_uri),
        ],
    )
    .header("authorization", format!("Basic {credentials}"));

    let resp = transport.send(request).await?;
    if !resp.is_success() {
        error!(status = resp.status, body = %resp.body, "token exchange failed");
        return Err(OAuthError::TokenExchange {
            status: resp.status,
            body: resp.body,
        });
    }
    serde_json::from_str(&resp.body).map_err(|e| OAuthError::Parse(format!("token response: {e}")))
}

/// Fetch the signed-in user's claims with the access token.
pub async fn fetch_user_info(
    transport: &dyn HttpTransport,
    config: &IdentityProviderConfig,
    access_token: &str,
) -> Result<UserInfo, OAuthError> {
    let request = OutboundRequest::get(config.user_info_url()?.as_str()).bearer(access_token);
    let resp = transport.send(request).await?;
    if !resp.is_success() {
        error!(status = resp.status, body = %resp.body, "user info request failed");
        return Err(OAuthError::UserInfo {
            status: resp.status,
            body: resp.body,
        });
    }
    match serde_json::from_str(&resp.body) {
        Ok(serde_json::Value::Object(user)) => Ok(user),
        Ok(_) => Err(OAuthError::Parse("user info is not a JSON object".into())),
        Err(e) => Err(OAuthError::Parse(format!("user info: {e}"))),
    }
}

/// Code exchange followed by the user-info call.
pub async fn complete_login(
    transport: &dyn HttpTransport,
    config: &IdentityProviderConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<UserInfo, OAuthError> {
    let tokens = exchange_code(transport, config, code, redirect_uri).await?;
    debug!(
        has_id_token = tokens.id_token.is_some(),
        has_refresh_token = tokens.refresh_token.is_some(),
        "token exchange succeeded"
    );
    fetch_user_info(transport, config, &tokens.access_token).await
}
