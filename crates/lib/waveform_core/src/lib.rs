//! # waveform_core
//!
//! Core domain logic for Waveform: the event model, the session cookie codec,
//! the upstream story proxy, the hosted-UI OAuth client, link previews and the
//! paginated feed client.

pub mod client;
pub mod feed;
pub mod models;
pub mod oauth;
pub mod preview;
pub mod proxy;
pub mod session;
pub mod transport;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
