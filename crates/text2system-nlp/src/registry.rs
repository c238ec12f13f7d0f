//! Pipeline registry.
//!
//! Model pipelines are expensive to set up, so each one is constructed at
//! most once per engine and then reused.  The registry memoizes handles by
//! [`PipelineKind`]:
//!
//! - the first [`PipelineRegistry::get_pipeline`] call for a kind asks the
//!   [`PipelineFactory`] to build it;
//! - every later call returns the stored handle, whatever model or config it
//!   passes (first write wins).
//!
//! There is no eviction; handles live as long as the registry.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = PipelineRegistry::new(factory);
//! let a = registry.get_pipeline(PipelineKind::QuestionAnswering, &PipelineOptions::default())?;
//! let b = registry.get_pipeline(PipelineKind::QuestionAnswering, &PipelineOptions::model("other"))?;
//! assert!(a.same_handle(&b));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NlpError, Result};
use crate::services::{QuestionAnswerer, SentimentAnalyzer, Tagger, TextEmbedder, ZeroShotClassifier};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The pipelines the resolvers consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    TokenClassification,
    ZeroShotClassification,
    QuestionAnswering,
    SentimentAnalysis,
    TextSimilarity,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::TokenClassification,
        PipelineKind::ZeroShotClassification,
        PipelineKind::QuestionAnswering,
        PipelineKind::SentimentAnalysis,
        PipelineKind::TextSimilarity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TokenClassification => "token-classification",
            Self::ZeroShotClassification => "zero-shot-classification",
            Self::QuestionAnswering => "question-answering",
            Self::SentimentAnalysis => "sentiment-analysis",
            Self::TextSimilarity => "text-similarity",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = NlpError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| NlpError::UnknownPipeline {
                name: name.to_string(),
            })
    }
}

/// Construction options for a pipeline.  Only honoured on first construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Model identifier; `None` lets the factory choose its default.
    pub model: Option<String>,
    /// Free-form model configuration forwarded to the factory.
    pub config: Option<serde_json::Value>,
}

impl PipelineOptions {
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            config: None,
        }
    }
}

/// A constructed, shareable pipeline handle.
#[derive(Clone)]
pub enum Pipeline {
    Tagger(Arc<dyn Tagger>),
    ZeroShot(Arc<dyn ZeroShotClassifier>),
    QuestionAnswering(Arc<dyn QuestionAnswerer>),
    Sentiment(Arc<dyn SentimentAnalyzer>),
    Embedding(Arc<dyn TextEmbedder>),
}

impl Pipeline {
    /// The kind of pipeline this handle serves.
    pub fn kind(&self) -> PipelineKind {
        match self {
            Self::Tagger(_) => PipelineKind::TokenClassification,
            Self::ZeroShot(_) => PipelineKind::ZeroShotClassification,
            Self::QuestionAnswering(_) => PipelineKind::QuestionAnswering,
            Self::Sentiment(_) => PipelineKind::SentimentAnalysis,
            Self::Embedding(_) => PipelineKind::TextSimilarity,
        }
    }

    /// Whether both handles point at the same underlying pipeline.
    pub fn same_handle(&self, other: &Pipeline) -> bool {
        match (self, other) {
            (Self::Tagger(a), Self::Tagger(b)) => Arc::ptr_eq(a, b),
            (Self::ZeroShot(a), Self::ZeroShot(b)) => Arc::ptr_eq(a, b),
            (Self::QuestionAnswering(a), Self::QuestionAnswering(b)) => Arc::ptr_eq(a, b),
            (Self::Sentiment(a), Self::Sentiment(b)) => Arc::ptr_eq(a, b),
            (Self::Embedding(a), Self::Embedding(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn into_tagger(self) -> Result<Arc<dyn Tagger>> {
        match self {
            Self::Tagger(p) => Ok(p),
            other => Err(mismatch(PipelineKind::TokenClassification, &other)),
        }
    }

    pub fn into_zero_shot(self) -> Result<Arc<dyn ZeroShotClassifier>> {
        match self {
            Self::ZeroShot(p) => Ok(p),
            other => Err(mismatch(PipelineKind::ZeroShotClassification, &other)),
        }
    }

    pub fn into_question_answerer(self) -> Result<Arc<dyn QuestionAnswerer>> {
        match self {
            Self::QuestionAnswering(p) => Ok(p),
            other => Err(mismatch(PipelineKind::QuestionAnswering, &other)),
        }
    }

    pub fn into_sentiment(self) -> Result<Arc<dyn SentimentAnalyzer>> {
        match self {
            Self::Sentiment(p) => Ok(p),
            other => Err(mismatch(PipelineKind::SentimentAnalysis, &other)),
        }
    }

    pub fn into_embedder(self) -> Result<Arc<dyn TextEmbedder>> {
        match self {
            Self::Embedding(p) => Ok(p),
            other => Err(mismatch(PipelineKind::TextSimilarity, &other)),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pipeline").field(&self.kind()).finish()
    }
}

fn mismatch(expected: PipelineKind, found: &Pipeline) -> NlpError {
    NlpError::PipelineMismatch {
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

/// Builds pipelines on first use.
pub trait PipelineFactory: Send + Sync {
    fn create(&self, kind: PipelineKind, options: &PipelineOptions) -> Result<Pipeline>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Memoizing pipeline registry owned by a single engine.
pub struct PipelineRegistry {
    factory: Arc<dyn PipelineFactory>,
    pipelines: HashMap<PipelineKind, Pipeline>,
}

impl PipelineRegistry {
    /// Create an empty registry backed by `factory`.
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            factory,
            pipelines: HashMap::new(),
        }
    }

    /// Return the pipeline for `kind`, constructing it on first use.
    ///
    /// `options` only matter for that first construction.
    pub fn get_pipeline(&mut self, kind: PipelineKind, options: &PipelineOptions) -> Result<Pipeline> {
        if let Some(existing) = self.pipelines.get(&kind) {
            tracing::trace!(pipeline = %kind, "pipeline cache hit");
            return Ok(existing.clone());
        }

        tracing::info!(
            pipeline = %kind,
            model = options.model.as_deref().unwrap_or("<default>"),
            "constructing pipeline"
        );
        let pipeline = self.factory.create(kind, options)?;
        if pipeline.kind() != kind {
            return Err(mismatch(kind, &pipeline));
        }
        self.pipelines.insert(kind, pipeline.clone());
        Ok(pipeline)
    }

    pub fn contains(&self, kind: PipelineKind) -> bool {
        self.pipelines.contains_key(&kind)
    }

    /// Number of constructed pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.pipelines.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("PipelineRegistry")
            .field("pipelines", &kinds)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
