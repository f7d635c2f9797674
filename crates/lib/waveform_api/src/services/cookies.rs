//! Cookie builders for the login flow and the session.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// CSRF token issued at login, checked at the callback.
pub const STATE_COOKIE: &str = "cognito_state";
/// Nonce issued at login.
pub const NONCE_COOKIE: &str = "cognito_nonce";
/// Encoded user info, server-only.
pub const SESSION_COOKIE: &str = "waveform_session";
/// Same payload as the session cookie, readable by page scripts.
pub const USER_COOKIE: &str = "waveform_user";
/// Cookies from earlier releases, cleared on logout.
pub const LEGACY_COOKIES: [&str; 2] = ["waveform_auth", "waveform_username"];

const TRANSIENT_MAX_AGE: Duration = Duration::hours(1);
const SESSION_MAX_AGE: Duration = Duration::days(1);

fn cookie(
    name: &'static str,
    value: String,
    http_only: bool,
    secure: bool,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(http_only)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// httpOnly `cognito_state` / `cognito_nonce` cookie, one hour.
pub fn transient_cookie(name: &'static str, value: &str, secure: bool) -> Cookie<'static> {
    cookie(name, value.to_string(), true, secure, TRANSIENT_MAX_AGE)
}

/// httpOnly session cookie, 24 hours.
pub fn session_cookie(encoded: &str, secure: bool) -> Cookie<'static> {
    cookie(SESSION_COOKIE, encoded.to_string(), true, secure, SESSION_MAX_AGE)
}

/// Script-readable user cookie, 24 hours.
pub fn user_cookie(encoded: &str, secure: bool) -> Cookie<'static> {
    cookie(USER_COOKIE, encoded.to_string(), false, secure, SESSION_MAX_AGE)
}

/// Expired cookie that clears `name`.
pub fn clear_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let http_only = name != USER_COOKIE;
    cookie(name, String::new(), http_only, secure, Duration::ZERO)
}

/// Every cookie the app may have set.
pub fn all_cookie_names() -> impl Iterator<Item = &'static str> {
    [SESSION_COOKIE, USER_COOKIE, STATE_COOKIE, NONCE_COOKIE]
        .into_iter()
        .chain(LEGACY_COOKIES)
}
