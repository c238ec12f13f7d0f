//! Adapter error types.
//!
//! HTTP adapters surface their failures through [`AdapterError`].  At the
//! boundary with the pipeline every variant becomes an
//! [`NlpError::Service`] naming the service that failed.

use text2system_nlp::NlpError;

/// Unified error type for the text2system adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    // -- Transport errors --
    /// The HTTP request could not be sent or its body not read.
    #[error("request to `{service}` failed: {reason}")]
    RequestFailed { service: String, reason: String },

    /// The request exceeded the client timeout.
    #[error("request to `{service}` timed out after {seconds}s")]
    Timeout { service: String, seconds: u64 },

    /// The service answered with a non-success status.
    #[error("`{service}` returned {status}: {message}")]
    Status {
        service: String,
        status: u16,
        message: String,
    },

    // -- Response errors --
    /// The response body did not have the expected shape.
    #[error("unexpected response from `{service}`: {reason}")]
    InvalidResponse { service: String, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // -- Setup errors --
    /// A base URL could not be parsed or extended.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Configuration error in adapter setup.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AdapterError {
    /// Name of the service the error came from, if it is tied to one.
    pub fn service(&self) -> &str {
        match self {
            Self::RequestFailed { service, .. }
            | Self::Timeout { service, .. }
            | Self::Status { service, .. }
            | Self::InvalidResponse { service, .. } => service,
            Self::SerializationError(_) | Self::InvalidUrl { .. } | Self::ConfigError(_) => {
                "adapter"
            }
        }
    }

    pub(crate) fn invalid_response(service: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<AdapterError> for NlpError {
    fn from(err: AdapterError) -> Self {
        NlpError::service(err.service().to_string(), err.to_string())
    }
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
