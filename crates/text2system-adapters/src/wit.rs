//! Wit.ai conversational NLU client.
//!
//! Sends `GET {base}/message?v={version}&q={message}` with the server access
//! token and returns the raw [`NluResponse`]; decoding against the confidence
//! threshold is left to [`text2system_nlp::DecodedMessage`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use text2system_nlp::{NluResponse, NluService};

use crate::error::{AdapterError, Result};

const SERVICE: &str = "wit";

/// Default Wit.ai API base URL.
pub const DEFAULT_WIT_BASE_URL: &str = "https://api.wit.ai";

/// API version pinned in every request.
pub const WIT_API_VERSION: &str = "20230215";

/// Wit.ai messages are short; fail fast.
const WIT_TIMEOUT_SECS: u64 = 15;

/// Client for the Wit.ai `/message` endpoint.
#[derive(Debug, Clone)]
pub struct WitClient {
    access_key: String,
    base_url: Url,
    http: reqwest::Client,
}

impl WitClient {
    /// Create a client for the public Wit.ai endpoint.
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_key, DEFAULT_WIT_BASE_URL)
    }

    pub fn with_base_url(access_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(AdapterError::ConfigError(
                "Wit.ai access key is empty".into(),
            ));
        }

        let base_url = Url::parse(base_url).map_err(|e| AdapterError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(WIT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            access_key,
            base_url,
            http,
        })
    }

    /// Full request URL for `message`.
    pub fn message_url(&self, message: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("message")
            .map_err(|e| AdapterError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("v", WIT_API_VERSION)
            .append_pair("q", message);
        Ok(url)
    }

    /// Fetch the raw JSON body for `message`.
    pub async fn message(&self, message: &str) -> Result<String> {
        let url = self.message_url(message)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout {
                        service: SERVICE.into(),
                        seconds: WIT_TIMEOUT_SECS,
                    }
                } else {
                    AdapterError::RequestFailed {
                        service: SERVICE.into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AdapterError::RequestFailed {
            service: SERVICE.into(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                service: SERVICE.into(),
                status: status.as_u16(),
                message: body,
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "wit message parsed");
        Ok(body)
    }
}

#[async_trait]
impl NluService for WitClient {
    async fn parse(&self, message: &str) -> text2system_nlp::Result<NluResponse> {
        let body = self.message(message).await?;
        NluResponse::from_json(&body)
    }
}
