//! Hosted-UI login, callback and logout.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};
use waveform_core::oauth::{self, OAuthError};

use crate::AppState;
use crate::error::AppResult;
use crate::services::cookies::{
    NONCE_COOKIE, STATE_COOKIE, all_cookie_names, clear_cookie, session_cookie, transient_cookie,
    user_cookie,
};

/// Query parameters the identity provider appends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// 302 with cookie changes. `Redirect::to` would answer 303.
fn found(jar: CookieJar, location: &str) -> Response {
    (
        StatusCode::FOUND,
        jar,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// `GET /login`: issue `state`/`nonce` cookies and redirect to the hosted UI.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let config = &state.config;
    let request = oauth::begin_login(&config.identity, &config.redirect_uri())?;
    let secure = config.secure_cookies();

    let jar = jar
        .add(transient_cookie(STATE_COOKIE, &request.state, secure))
        .add(transient_cookie(NONCE_COOKIE, &request.nonce, secure));
    info!("redirecting to hosted login");
    Ok(found(jar, request.url.as_str()))
}

/// `GET /auth/callback?code&state`: verify `state`, exchange the code, store
/// the session.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<Response> {
    let config = &state.config;
    let stored = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if let Err(e) = oauth::verify_state(params.state.as_deref(), stored.as_deref()) {
        warn!(
            returned = params.state.is_some(),
            stored = stored.is_some(),
            "rejecting callback with invalid state"
        );
        return Err(e.into());
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(OAuthError::MissingCode)?;
    let user = oauth::complete_login(
        state.transport.as_ref(),
        &config.identity,
        code,
        &config.redirect_uri(),
    )
    .await?;

    let encoded = state.sessions.encode(&user);
    let secure = config.secure_cookies();
    let jar = jar
        .add(session_cookie(&encoded, secure))
        .add(user_cookie(&encoded, secure))
        .add(clear_cookie(STATE_COOKIE, secure))
        .add(clear_cookie(NONCE_COOKIE, secure));
    info!(
        sub = user.get("sub").and_then(|v| v.as_str()).unwrap_or("-"),
        "login complete"
    );
    Ok(found(jar, &config.post_login_redirect))
}

/// `GET /logout`: clear every app cookie and sign out at the provider.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let config = &state.config;
    let secure = config.secure_cookies();
    let jar = all_cookie_names().fold(jar, |jar, name| jar.add(clear_cookie(name, secure)));
    let url = config.identity.logout_url(&config.logout_uri())?;
    Ok(found(jar, url.as_str()))
}
