//! Web API response header and method responses.

use serde::{Deserialize, Serialize};

/// The header every Web API response carries alongside the method payload.
///
/// Decoded first, before the typed response body: a non-`ok` response has
/// no usable payload, only an error code.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub ok: bool,
    /// Comma-separated non-fatal warnings.
    #[serde(default)]
    pub warning: String,
    /// Machine-readable error code (e.g. `invalid_auth`) when not `ok`.
    #[serde(default, rename = "error")]
    pub error_code: String,
}

/// Response of `apps.connections.open`: the negotiated socket endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectionOpenResponse {
    /// The `wss://` URL to dial.
    #[serde(default)]
    pub url: String,
}

/// An empty request body, serialized as `{}`.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ok_response() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"ok":true,"url":"wss://example.com"}"#).unwrap();
        assert!(resp.ok);
        assert!(resp.error_code.is_empty());
    }

    #[test]
    fn decode_error_response() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error":"invalid_auth"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, "invalid_auth");
    }

    #[test]
    fn decode_warning() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"ok":true,"warning":"missing_charset"}"#).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.warning, "missing_charset");
    }

    #[test]
    fn connection_open_url() {
        let resp: ConnectionOpenResponse =
            serde_json::from_str(r#"{"ok":true,"url":"wss://wss.slack.com/link/?ticket=t"}"#)
                .unwrap();
        assert_eq!(resp.url, "wss://wss.slack.com/link/?ticket=t");
    }

    #[test]
    fn empty_serializes_to_braces() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }
}
