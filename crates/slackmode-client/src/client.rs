//! The authenticated Web API client.

use serde::Serialize;
use serde::de::DeserializeOwned;
use slackmode_api::{ApiResponse, ConnectionOpenResponse, Empty};
use tracing::{debug, warn};
use url::Url;

use crate::errors::ClientError;
use crate::rate_limit::RateLimit;
use crate::tokens::AppToken;

/// Base URL of the public Web API.
pub const PUBLIC_BASE_URL: &str = "https://slack.com/api/";

/// An authenticated Web API client.
///
/// Every call waits on the tier-1 rate limiter, POSTs JSON with the app
/// token as a bearer credential, and decodes the response header before
/// the typed payload.
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    app_token: AppToken,
    tier1: RateLimit,
}

impl Client {
    /// A client against the public API.
    pub fn new(app_token: AppToken) -> Self {
        Self::with_base_url(app_token, PUBLIC_BASE_URL)
    }

    /// A client against a non-default base URL (test servers, proxies).
    pub fn with_base_url(app_token: AppToken, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            app_token,
            tier1: RateLimit::tier1(),
        }
    }

    fn method_url(&self, method: &str) -> Result<Url, ClientError> {
        let join = |base: Url| base.join(method);
        Url::parse(&self.base_url)
            .and_then(join)
            .map_err(|source| ClientError::Url {
                method: method.to_owned(),
                source,
            })
    }

    /// POST `request` to a Web API `method` and decode the typed response.
    ///
    /// A non-`ok` response header becomes [`ClientError::Api`] carrying the
    /// error code, the original request, and the raw response bytes.
    /// Warnings in the header are logged, never fatal.
    #[tracing::instrument(skip_all, fields(method = %method))]
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        request: &impl Serialize,
    ) -> Result<T, ClientError> {
        self.tier1.acquire().await;

        let url = self.method_url(method)?;
        let request_body =
            serde_json::to_value(request).map_err(|source| ClientError::Encode {
                method: method.to_owned(),
                source,
            })?;

        debug!(method, %url, "posting api request");
        let response = self
            .http
            .post(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.app_token.secret()),
            )
            .json(&request_body)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                method: method.to_owned(),
                source,
            })?;
        let body = response.bytes().await.map_err(|source| ClientError::Http {
            method: method.to_owned(),
            source,
        })?;

        let header: ApiResponse = serde_json::from_slice(&body)
            .map_err(|source| ClientError::parse(method, &body, source))?;
        if !header.ok {
            let code = if header.error_code.is_empty() {
                "unknown_error".to_owned()
            } else {
                header.error_code
            };
            return Err(ClientError::Api {
                method: method.to_owned(),
                code,
                request: request_body,
                response: body.to_vec(),
            });
        }
        if !header.warning.is_empty() {
            warn!(method, warning = %header.warning, "api call returned warnings");
        }

        serde_json::from_slice(&body).map_err(|source| ClientError::parse(method, &body, source))
    }

    /// Exchange the app token for a Socket Mode endpoint URL.
    pub async fn connections_open(&self) -> Result<ConnectionOpenResponse, ClientError> {
        self.post_json("apps.connections.open", &Empty {}).await
    }
}
