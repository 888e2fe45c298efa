//! Socket Mode frames: greeting, envelope, acknowledgment.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator of the greeting frame, the first frame on every connection.
pub const TYPE_HELLO: &str = "hello";

/// The greeting frame sent by the server once the connection is up.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Hello {
    /// Must be [`TYPE_HELLO`] for the connection to be usable.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// How many connections the app currently holds.
    #[serde(default)]
    pub num_connections: u32,
    /// Metadata about the app this connection belongs to.
    #[serde(default)]
    pub connection_info: ConnectionInfo,
}

/// Connection metadata carried in the greeting.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectionInfo {
    /// Identifier of the connected app.
    #[serde(default)]
    pub app_id: String,
}

/// One inbound frame after the greeting.
///
/// Only `kind`, `payload`, and `envelope_id` participate in routing and
/// acknowledgment; the authentication and context fields are opaque
/// pass-through.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Envelope {
    /// Credential echo; not used for routing.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Installations authorized to see this event; opaque.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<Value>,
    /// Workspace identifier; opaque.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    /// App identifier; opaque.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_app_id: String,
    /// Event context string; opaque.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_context: String,

    /// Correlates the acknowledgment. Empty for frames that need none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub envelope_id: String,
    /// Discriminator routing this envelope (e.g. `events_api`).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Opaque payload, decoded only by the handler that matches `kind`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Outbound acknowledgment, correlated to an [`Envelope`] by identifier.
#[derive(Clone, Debug, Serialize)]
pub struct Ack {
    /// The acknowledged envelope's identifier.
    pub envelope_id: String,
    /// Response payload for handlers that must return a synchronous
    /// result; omitted from the wire when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}
