//! The event wrapper nested inside an `events_api` envelope.

use serde::Deserialize;
use serde_json::Value;

/// Envelope discriminator marking a payload that carries an [`Event`].
pub const TYPE_EVENTS_API: &str = "events_api";

/// Event discriminator marking a callback that wraps a domain notification.
pub const TYPE_EVENT_CALLBACK: &str = "event_callback";

/// The generic event wrapper one level below the envelope.
///
/// Its `event` field is routed again by its own embedded `type`, so it
/// stays opaque here.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Event {
    /// Credential echo; opaque.
    #[serde(default)]
    pub token: String,
    /// Installations authorized to see this event; opaque.
    #[serde(default)]
    pub authorizations: Vec<Value>,
    /// Workspace identifier; opaque.
    #[serde(default)]
    pub team_id: String,
    /// App identifier; opaque.
    #[serde(default)]
    pub api_app_id: String,
    /// Event context string; opaque.
    #[serde(default)]
    pub event_context: String,

    /// Identifier of this event delivery.
    #[serde(default)]
    pub event_id: String,
    /// Unix timestamp of the event.
    #[serde(default)]
    pub event_time: i64,
    /// Discriminator routing this wrapper (e.g. `event_callback`).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// The domain notification, discriminated by its own `type` field.
    #[serde(default, rename = "event")]
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_event_callback() {
        let event: Event = serde_json::from_str(
            r#"{"type":"event_callback","event_id":"Ev1","event_time":1234,"event":{"type":"message","text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, TYPE_EVENT_CALLBACK);
        assert_eq!(event.event_id, "Ev1");
        assert_eq!(event.event_time, 1234);
        assert_eq!(event.payload["type"], "message");
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let event: Event = serde_json::from_str("{}").unwrap();
        assert!(event.kind.is_empty());
        assert!(event.payload.is_null());
    }
}
