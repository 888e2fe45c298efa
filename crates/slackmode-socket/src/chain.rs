//! Wiring of the three dispatch levels.
//!
//! The wire format nests three independent type tags: envelope →
//! generic event wrapper → domain notification. Each level is its own
//! [`Registry`]; the links here capture only their downstream registry,
//! so the pipeline is fixed and acyclic.

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value;
use slackmode_api::{Event, TYPE_EVENT_CALLBACK, TYPE_EVENTS_API};

use crate::registry::Registry;

/// Install the unwrap handlers linking the three levels.
///
/// Called once at session construction, before any user registration.
pub(crate) fn wire(
    envelope_types: &Registry,
    event_types: &Arc<Registry>,
    notification_types: &Arc<Registry>,
) {
    let next = Arc::clone(event_types);
    envelope_types.register(TYPE_EVENTS_API, move |event: Event| {
        let next = Arc::clone(&next);
        async move {
            next.dispatch(&event.kind, &event.payload)
                .await
                .map_err(anyhow::Error::from)
        }
    });

    let next = Arc::clone(notification_types);
    event_types.register_raw(TYPE_EVENT_CALLBACK, move |payload: Value| {
        let next = Arc::clone(&next);
        async move {
            // Peek at the embedded tag without committing to a shape.
            let kind = payload
                .get("type")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .ok_or_else(|| anyhow!("event has no string \"type\" field"))?;
            next.dispatch(&kind, &payload)
                .await
                .map_err(anyhow::Error::from)
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use serde_json::json;

    use crate::errors::DispatchError;

    use super::*;

    struct Chain {
        envelope_types: Arc<Registry>,
        notification_types: Arc<Registry>,
        seen: Arc<Mutex<Vec<(String, Value)>>>,
    }

    /// A wired chain with a capturing handler at the notification level.
    fn wired_chain(notification_kind: &str) -> Chain {
        let envelope_types = Arc::new(Registry::new());
        let event_types = Arc::new(Registry::new());
        let notification_types = Arc::new(Registry::new());
        wire(&envelope_types, &event_types, &notification_types);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let kind = notification_kind.to_owned();
        notification_types.register_raw(notification_kind, move |payload| {
            let sink = Arc::clone(&sink);
            let kind = kind.clone();
            async move {
                sink.lock().unwrap().push((kind, payload));
                Ok(())
            }
        });

        Chain {
            envelope_types,
            notification_types,
            seen,
        }
    }

    #[tokio::test]
    async fn notification_reaches_the_innermost_level() {
        let chain = wired_chain("message");
        let payload = json!({
            "type": "event_callback",
            "event": {"type": "message", "text": "hi"}
        });

        chain
            .envelope_types
            .dispatch(TYPE_EVENTS_API, &payload)
            .await
            .unwrap();

        let seen = chain.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "message");
        assert_eq!(seen[0].1, json!({"type": "message", "text": "hi"}));
    }

    #[tokio::test]
    async fn unknown_notification_kind_hits_innermost_fallback() {
        let chain = wired_chain("message");
        let fallback_seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fallback_seen);
        chain.notification_types.set_fallback(move |kind, _| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(kind);
                Ok(())
            }
        });

        let payload = json!({
            "type": "event_callback",
            "event": {"type": "reaction_added"}
        });
        chain
            .envelope_types
            .dispatch(TYPE_EVENTS_API, &payload)
            .await
            .unwrap();

        assert!(chain.seen.lock().unwrap().is_empty());
        assert_eq!(*fallback_seen.lock().unwrap(), vec!["reaction_added"]);
    }

    #[tokio::test]
    async fn missing_embedded_type_is_a_hard_error() {
        let chain = wired_chain("message");
        let payload = json!({
            "type": "event_callback",
            "event": {"text": "no type here"}
        });

        let err = chain
            .envelope_types
            .dispatch(TYPE_EVENTS_API, &payload)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("type"));
        assert!(chain.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_object_event_payload_is_a_decode_error() {
        let chain = wired_chain("message");

        let err = chain
            .envelope_types
            .dispatch(TYPE_EVENTS_API, &json!("not an object"))
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::Decode { discriminator, .. } => {
            assert_eq!(discriminator, TYPE_EVENTS_API);
        });
    }

    #[tokio::test]
    async fn user_handlers_coexist_with_the_unwrap_handler() {
        let chain = wired_chain("message");
        let extra_calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&extra_calls);
        chain
            .envelope_types
            .register(TYPE_EVENTS_API, move |_: Event| {
                let counter = Arc::clone(&counter);
                async move {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                }
            });

        let payload = json!({
            "type": "event_callback",
            "event": {"type": "message", "text": "hi"}
        });
        chain
            .envelope_types
            .dispatch(TYPE_EVENTS_API, &payload)
            .await
            .unwrap();

        assert_eq!(chain.seen.lock().unwrap().len(), 1);
        assert_eq!(*extra_calls.lock().unwrap(), 1);
    }
}
