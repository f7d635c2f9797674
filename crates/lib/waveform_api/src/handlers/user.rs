//! Current-user endpoint.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};
use tracing::debug;

use crate::AppState;
use crate::services::cookies::SESSION_COOKIE;

/// `GET /api/user`
///
/// Always 200. An unreadable session cookie is reported as anonymous with an
/// `error` field.
pub async fn current_user(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    let Some(session) = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty()) else {
        return Json(json!({ "isAuthenticated": false, "user": null }));
    };
    match state.sessions.decode(session.value()) {
        Ok(user) => Json(json!({ "isAuthenticated": true, "user": user })),
        Err(e) => {
            debug!(error = %e, "session cookie rejected");
            Json(json!({ "isAuthenticated": false, "user": null, "error": e.to_string() }))
        }
    }
}
