//! Shared helpers used by the handlers.

pub mod cookies;
