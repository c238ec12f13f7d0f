//! Engine configuration.
//!
//! Loaded from a TOML file (by default `config/default.toml`) with every
//! field optional, then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TEXT2SYSTEM_THRESHOLD` | `engine.threshold` |
//! | `WIT_ACCESS_KEY` | `engine.wit_access_key` |
//! | `HF_API_TOKEN` | `engine.hf_api_token` |
//! | `HF_INFERENCE_URL` | `engine.hf_base_url` |
//!
//! ```toml
//! [engine]
//! threshold = 0.7
//!
//! [models]
//! question_answering = "deepset/roberta-base-squad2"
//!
//! [[domain.classes]]
//! name = "customer"
//! attributes = ["name", "email"]
//! synonyms = ["client"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::DomainClass;
use crate::error::{NlpError, Result};
use crate::registry::PipelineKind;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default confidence threshold for decoding and similarity.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Default Hugging Face Inference API base URL.
pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub engine: EngineSection,
    pub models: ModelSection,
    pub domain: DomainSection,
}

/// `[engine]`: thresholds and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Confidence threshold; decoded items must score strictly above it.
    pub threshold: f64,
    pub wit_access_key: Option<String>,
    pub hf_api_token: Option<String>,
    pub hf_base_url: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            wit_access_key: None,
            hf_api_token: None,
            hf_base_url: DEFAULT_HF_BASE_URL.to_string(),
        }
    }
}

/// `[models]`: model identifier per pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub token_classification: String,
    pub zero_shot_classification: String,
    pub question_answering: String,
    pub sentiment_analysis: String,
    pub text_similarity: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            token_classification: "vblagoje/bert-english-uncased-finetuned-pos".into(),
            zero_shot_classification: "facebook/bart-large-mnli".into(),
            question_answering: "distilbert-base-cased-distilled-squad".into(),
            sentiment_analysis: "distilbert-base-uncased-finetuned-sst-2-english".into(),
            text_similarity: "sentence-transformers/all-MiniLM-L6-v2".into(),
        }
    }
}

impl ModelSection {
    /// Model identifier configured for `kind`.
    pub fn for_kind(&self, kind: PipelineKind) -> &str {
        match kind {
            PipelineKind::TokenClassification => &self.token_classification,
            PipelineKind::ZeroShotClassification => &self.zero_shot_classification,
            PipelineKind::QuestionAnswering => &self.question_answering,
            PipelineKind::SentimentAnalysis => &self.sentiment_analysis,
            PipelineKind::TextSimilarity => &self.text_similarity,
        }
    }
}

/// `[domain]`: the classes commands can target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSection {
    pub classes: Vec<DomainClass>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("TEXT2SYSTEM_THRESHOLD") {
            self.engine.threshold = raw.trim().parse().map_err(|e| NlpError::Config {
                reason: format!("TEXT2SYSTEM_THRESHOLD `{raw}` is not a number: {e}"),
            })?;
        }
        if let Some(key) = get("WIT_ACCESS_KEY") {
            self.engine.wit_access_key = Some(key);
        }
        if let Some(token) = get("HF_API_TOKEN") {
            self.engine.hf_api_token = Some(token);
        }
        if let Some(url) = get("HF_INFERENCE_URL") {
            self.engine.hf_base_url = url;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.engine.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(NlpError::Config {
                reason: format!("threshold must lie in [0, 1], got {threshold}"),
            });
        }
        if let Some(class) = self.domain.classes.iter().find(|c| c.name.trim().is_empty()) {
            return Err(NlpError::Config {
                reason: format!("domain class with empty name (attributes: {:?})", class.attributes),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
