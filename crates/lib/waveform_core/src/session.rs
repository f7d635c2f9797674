//! Session cookie codec.
//!
//! The session is the identity provider's user-info object, stored as
//! base64(JSON) in a cookie. Call sites depend on [`SessionCodec`] only, so the
//! cookie format can be swapped for a server-side store later.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use thiserror::Error;

/// Provider claims (`email`, `sub`, `preferred_username`, ...).
pub type UserInfo = serde_json::Map<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session")]
    InvalidSession,
}

/// Encodes user info into a cookie value and back.
pub trait SessionCodec: Send + Sync {
    fn encode(&self, user: &UserInfo) -> String;

    fn decode(&self, value: &str) -> Result<UserInfo, SessionError>;
}

/// Standard-alphabet base64 of the UTF-8 JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonCodec;

impl SessionCodec for Base64JsonCodec {
    fn encode(&self, user: &UserInfo) -> String {
        let json = Value::Object(user.clone()).to_string();
        STANDARD.encode(json.as_bytes())
    }

    fn decode(&self, value: &str) -> Result<UserInfo, SessionError> {
        let bytes = STANDARD
            .decode(value.trim())
            .map_err(|_| SessionError::InvalidSession)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(user)) => Ok(user),
            _ => Err(SessionError::InvalidSession),
        }
    }
}
