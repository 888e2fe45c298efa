//! Web API client error type.

use serde_json::Value;
use thiserror::Error;

/// Errors from an authenticated Web API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL or method path did not form a valid URL.
    #[error("{method}: invalid request URL: {source}")]
    Url {
        /// Web API method being called.
        method: String,
        /// Underlying parse failure.
        source: url::ParseError,
    },

    /// The request body could not be serialized.
    #[error("{method}: encoding request: {source}")]
    Encode {
        /// Web API method being called.
        method: String,
        /// Underlying serialization failure.
        source: serde_json::Error,
    },

    /// The HTTP exchange itself failed.
    #[error("{method}: request failed: {source}")]
    Http {
        /// Web API method being called.
        method: String,
        /// Underlying transport failure.
        source: reqwest::Error,
    },

    /// The server answered with `ok: false`.
    #[error("{method}: request failed: {code}")]
    Api {
        /// Web API method being called.
        method: String,
        /// Machine-readable error code from the response header.
        code: String,
        /// The request body that was sent.
        request: Value,
        /// Raw response bytes, for diagnosis.
        response: Vec<u8>,
    },

    /// The response body was not the expected JSON.
    #[error("{method}: decoding response: {source} ({len} bytes starting with {preview:?})")]
    Parse {
        /// Web API method being called.
        method: String,
        /// Total response length in bytes.
        len: usize,
        /// Bounded preview of the offending bytes.
        preview: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Build a [`ClientError::Parse`] with a bounded preview of `raw`.
    pub(crate) fn parse(method: &str, raw: &[u8], source: serde_json::Error) -> Self {
        Self::Parse {
            method: method.to_owned(),
            len: raw.len(),
            preview: byte_preview(raw),
            source,
        }
    }
}

/// First few bytes of `raw` as lossy UTF-8, truncated with an ellipsis.
fn byte_preview(raw: &[u8]) -> String {
    const MAX: usize = 10;
    if raw.len() > MAX + 3 {
        format!("{}...", String::from_utf8_lossy(&raw[..MAX]))
    } else {
        String::from_utf8_lossy(raw).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_err() -> serde_json::Error {
        serde_json::from_str::<Value>("nope").unwrap_err()
    }

    #[test]
    fn short_payload_not_truncated() {
        assert_eq!(byte_preview(b"{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn long_payload_truncated() {
        let preview = byte_preview(b"<html><body>not json</body></html>");
        assert_eq!(preview, "<html><bo...");
    }

    #[test]
    fn parse_error_mentions_length_and_preview() {
        let raw = b"<html>definitely not json</html>";
        let err = ClientError::parse("apps.connections.open", raw, decode_err());
        let msg = err.to_string();
        assert!(msg.contains("apps.connections.open"));
        assert!(msg.contains("32 bytes"));
        assert!(msg.contains("<html>"));
    }

    #[test]
    fn api_error_mentions_code() {
        let err = ClientError::Api {
            method: "apps.connections.open".into(),
            code: "invalid_auth".into(),
            request: Value::Object(serde_json::Map::new()),
            response: b"{\"ok\":false}".to_vec(),
        };
        assert_eq!(
            err.to_string(),
            "apps.connections.open: request failed: invalid_auth"
        );
    }
}
