//! # slackmode-client
//!
//! The authenticated request/response transport for the Slack Web API.
//!
//! [`Client`] issues rate-limited JSON POSTs with bearer-token auth and
//! decodes the `{ok, warning, error}` response header before the typed
//! payload. The only method the socket layer needs is
//! [`Client::connections_open`], which exchanges the app-level credential
//! for a Socket Mode endpoint URL.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod rate_limit;
pub mod tokens;

pub use client::{Client, PUBLIC_BASE_URL};
pub use errors::ClientError;
pub use rate_limit::RateLimit;
pub use tokens::{AppToken, TokenError};
