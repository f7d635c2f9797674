//! Shared router fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use tower::ServiceExt;
use waveform_api::{AppState, config::ApiConfig};
use waveform_core::oauth::IdentityProviderConfig;
use waveform_core::proxy::UpstreamEndpoints;
use waveform_core::transport::testing::ScriptedTransport;

pub const API_KEY: &str = "test-api-key";

pub fn config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        public_origin: "https://waveform.example".into(),
        api_key: Some(API_KEY.into()),
        identity: IdentityProviderConfig {
            domain: "auth.example.com".into(),
            client_id: "client-123".into(),
            client_secret: Some("client-secret".into()),
            scopes: "email openid phone profile".into(),
        },
        post_login_redirect: "/".into(),
        upstreams: UpstreamEndpoints::default(),
        http_timeout: Duration::from_secs(5),
    }
}

pub fn app_with(config: ApiConfig) -> (Router, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let state = AppState::new(config, transport.clone());
    (waveform_api::router(state), transport)
}

pub fn app() -> (Router, Arc<ScriptedTransport>) {
    app_with(config())
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("parse JSON")
}

/// Every `Set-Cookie` header value.
pub fn set_cookies<B>(resp: &Response<B>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` value for `name`, if any.
pub fn set_cookie<B>(resp: &Response<B>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(resp).into_iter().find(|c| c.starts_with(&prefix))
}

pub fn location<B>(resp: &Response<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}
