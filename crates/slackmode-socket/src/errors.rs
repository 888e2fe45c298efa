//! Session-fatal and per-message error types.

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end a session (or prevent one from being established).
///
/// Per-message failures never appear here; they stay inside
/// [`DispatchError`] and are logged by the serve loop.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The negotiation call failed; no connection was attempted.
    #[error("negotiating socket endpoint: {0}")]
    Negotiate(#[from] slackmode_client::ClientError),

    /// The negotiated endpoint is not a valid URL. A configuration
    /// error, not retried.
    #[error("invalid endpoint URL {url:?}: {source}")]
    InvalidEndpoint {
        /// The endpoint string the server returned.
        url: String,
        /// Underlying parse failure.
        source: url::ParseError,
    },

    /// Dialing the endpoint failed.
    #[error("connecting to {url:?}: {source}")]
    Connect {
        /// The endpoint being dialed.
        url: String,
        /// Underlying transport failure.
        source: tungstenite::Error,
    },

    /// The connection failed while waiting for the greeting.
    #[error("receiving greeting: {source}")]
    GreetingRead {
        /// Underlying transport failure.
        source: tungstenite::Error,
    },

    /// The connection ended before any greeting arrived.
    #[error("connection closed before greeting")]
    GreetingClosed,

    /// The first frame was not a text frame.
    #[error("initial frame was not a text frame")]
    GreetingNotText,

    /// The first frame was not well-formed JSON.
    #[error("decoding greeting ({preview:?}): {source}")]
    GreetingDecode {
        /// Bounded preview of the offending frame.
        preview: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },

    /// The first frame decoded but did not carry the greeting tag.
    #[error("initial frame of type {got:?}, want \"hello\"")]
    UnexpectedGreeting {
        /// The discriminator the frame actually carried.
        got: String,
    },

    /// Reading from the established connection failed.
    #[error("reading envelope: {0}")]
    Read(#[source] tungstenite::Error),

    /// An inbound frame did not decode as an envelope.
    #[error("decoding envelope ({preview:?}): {source}")]
    Frame {
        /// Bounded preview of the offending frame.
        preview: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },

    /// Writing an acknowledgment failed; the write path is unusable.
    #[error("acknowledging envelope {envelope_id:?}: {source}")]
    Ack {
        /// The envelope that could not be acknowledged.
        envelope_id: String,
        /// Underlying transport failure.
        source: tungstenite::Error,
    },

    /// The session's connection is gone; the operation cannot proceed.
    #[error("session is closed")]
    Closed,
}

/// Errors from dispatching one payload, fatal only to that message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The opaque payload did not decode into the handler's target shape.
    #[error("{discriminator}: decoding {target}: {source} (payload {preview:?})")]
    Decode {
        /// The discriminator that selected the handler.
        discriminator: String,
        /// Type name of the shape the handler expected.
        target: &'static str,
        /// Bounded preview of the payload that failed to decode.
        preview: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },

    /// A handler ran and failed.
    #[error("{discriminator}: handling {target}: {source}")]
    Handler {
        /// The discriminator that selected the handler.
        discriminator: String,
        /// Type name of the shape the handler received.
        target: &'static str,
        /// The handler's error.
        source: anyhow::Error,
    },

    /// More than one handler failed for the same dispatch.
    #[error("{} handlers failed: {}", .0.len(), join_failures(.0))]
    Multiple(Vec<DispatchError>),
}

fn join_failures(failures: &[DispatchError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// First few characters of `raw`, truncated with an ellipsis.
pub(crate) fn preview(raw: &str) -> String {
    const MAX: usize = 10;
    if raw.chars().count() > MAX + 3 {
        let mut out: String = raw.chars().take(MAX).collect();
        out.push_str("...");
        out
    } else {
        raw.to_owned()
    }
}

/// Bounded preview of a JSON payload, for decode diagnostics.
pub(crate) fn value_preview(payload: &Value) -> String {
    preview(&payload.to_string())
}
