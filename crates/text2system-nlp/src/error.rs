//! Command resolution error types.
//!
//! All pipeline subsystems surface errors through [`NlpError`].  Each variant
//! carries enough context for callers to decide how to handle the failure.
//!
//! Ambiguous outcomes (no entity class, no attributes) are *not* errors; they
//! are reported as `None` or an empty list by the resolvers.

/// Unified error type for the command resolution pipeline.
#[derive(Debug, thiserror::Error)]
pub enum NlpError {
    // -- Closed-enumeration errors -------------------------------------------
    /// A model or service produced an intent name outside [`crate::Intent`].
    #[error("unknown intent `{name}`")]
    UnknownIntent { name: String },

    /// The NLU service produced an entity name outside [`crate::EntityType`].
    #[error("unknown entity type `{name}`")]
    UnknownEntityType { name: String },

    /// The zero-shot classifier returned no labels at all.
    #[error("classifier returned an empty ranking for: {text}")]
    EmptyClassification { text: String },

    // -- Pipeline errors -----------------------------------------------------
    /// The pipeline name is not one of the supported pipeline kinds.
    #[error("unknown pipeline `{name}`")]
    UnknownPipeline { name: String },

    /// The registry holds a handle of a different kind than requested.
    #[error("pipeline `{expected}` resolved to a `{found}` handle")]
    PipelineMismatch { expected: String, found: String },

    /// An external model or service call failed.
    #[error("{service} failed: {reason}")]
    Service { service: String, reason: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    Config { reason: String },

    /// The configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::EngineConfig`].
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NlpError {
    /// Build a [`NlpError::Service`] for the named collaborator.
    pub fn service(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the nlp crate.
pub type Result<T> = std::result::Result<T, NlpError>;
