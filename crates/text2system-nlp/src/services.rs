//! Interfaces of the external NLP collaborators.
//!
//! The pipeline never talks to a model directly; it goes through these
//! traits.  `text2system-adapters` implements them over HTTP and the tests
//! implement them with in-memory stubs.  Every call is a single awaited
//! request/response; failures surface as [`crate::NlpError::Service`] and are
//! propagated unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decoder::NluResponse;
use crate::error::Result;
use crate::types::Token;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// One entry of a zero-shot ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Extractive question-answering result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// Polarity reported by the sentiment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Model pipelines
// ---------------------------------------------------------------------------

/// Part-of-speech tagging.
#[async_trait]
pub trait Tagger: Send + Sync {
    async fn tag(&self, text: &str) -> Result<Vec<Token>>;
}

/// Zero-shot text classification.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Rank `candidate_labels` for `text`, best first.
    async fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<Vec<LabelScore>>;
}

/// Extractive question answering over a context passage.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<Answer>;
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn sentiment(&self, text: &str) -> Result<Sentiment>;
}

/// Sentence embeddings.  Similarity is computed by the caller.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

// ---------------------------------------------------------------------------
// Conversational NLU
// ---------------------------------------------------------------------------

/// Hosted conversational NLU service (greetings, goodbyes, contacts).
#[async_trait]
pub trait NluService: Send + Sync {
    async fn parse(&self, message: &str) -> Result<NluResponse>;
}
