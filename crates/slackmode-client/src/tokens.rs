//! App-level credential handling.

use std::fmt;
use std::path::Path;

use thiserror::Error;

const APP_TOKEN_PREFIX: &str = "xapp-";

/// Errors from loading or validating an app token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token file could not be read.
    #[error("reading app token {path:?}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The token does not carry the app-level prefix.
    #[error("app token does not have prefix \"xapp-\"")]
    BadPrefix,
}

/// An app-level token (`xapp-...`), the credential Socket Mode
/// negotiation authenticates with.
#[derive(Clone)]
pub struct AppToken(String);

impl AppToken {
    /// Validate a token string.
    pub fn new(token: impl Into<String>) -> Result<Self, TokenError> {
        let token = token.into();
        if token.starts_with(APP_TOKEN_PREFIX) {
            Ok(Self(token))
        } else {
            Err(TokenError::BadPrefix)
        }
    }

    /// Load a token from a file, trimming surrounding whitespace.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| TokenError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(data.trim())
    }

    /// The raw secret, for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

// The token is a credential; never let it leak through Debug output.
impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppToken(\"xapp-…\")")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_app_prefix() {
        let token = AppToken::new("xapp-1-A123-secret").unwrap();
        assert_eq!(token.secret(), "xapp-1-A123-secret");
    }

    #[test]
    fn rejects_bot_prefix() {
        assert_matches!(AppToken::new("xoxb-123"), Err(TokenError::BadPrefix));
    }

    #[test]
    fn rejects_empty() {
        assert_matches!(AppToken::new(""), Err(TokenError::BadPrefix));
    }

    #[test]
    fn loads_from_file_trimming_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  xapp-1-A123-secret\n").unwrap();
        let token = AppToken::from_file(file.path()).unwrap();
        assert_eq!(token.secret(), "xapp-1-A123-secret");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppToken::from_file("/nonexistent/token").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/token"));
    }

    #[test]
    fn debug_redacts_secret() {
        let token = AppToken::new("xapp-1-A123-secret").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("xapp-"));
    }
}
