//! Command resolution pipeline for text2system.
//!
//! This crate turns a free-text user message into a structured command:
//!
//! - **Intent resolution**: verb match, single-word direct command, then a
//!   zero-shot classifier fallback, via [`CommandEngine::parse_message`].
//! - **Entity-class resolution**: contextual question answering backed by a
//!   learned synonym cache, via [`CommandEngine::entity_class_from_msg`].
//! - **Attribute extraction**: a noun-driven scan with one QA query per
//!   attribute, via [`CommandEngine::attributes_from_msg`].
//! - **NLU decoding**: typed intents and entities from the conversational NLU
//!   service, via [`DecodedMessage`].
//!
//! Models and services are reached through the traits in [`services`];
//! pipelines are built lazily by a [`PipelineFactory`] and memoized in the
//! engine's [`PipelineRegistry`].

pub mod attributes;
pub mod class_resolver;
pub mod config;
pub mod decoder;
pub mod domain;
pub mod engine;
pub mod error;
pub mod parser;
pub mod registry;
pub mod services;
pub mod similarity;
pub mod types;

pub use attributes::{TokenCursor, attribute_pairs};
pub use class_resolver::CLASS_QUESTION;
pub use config::{EngineConfig, ModelSection};
pub use decoder::{DecodedMessage, NluEntity, NluIntent, NluResponse};
pub use domain::{DomainClass, DomainRegistry, StaticDomain};
pub use engine::{AttributePair, CommandEngine, ResolvedCommand};
pub use error::{NlpError, Result};
pub use parser::{ParsedMessage, ResolutionSource, RuleOutcome, classify_intent, match_rules};
pub use registry::{Pipeline, PipelineFactory, PipelineKind, PipelineOptions, PipelineRegistry};
pub use services::{
    Answer, LabelScore, NluService, QuestionAnswerer, Sentiment, SentimentAnalyzer, SentimentLabel,
    Tagger, TextEmbedder, ZeroShotClassifier,
};
pub use similarity::{SimilarityCache, cosine_similarity};
pub use types::{Entity, EntityType, Intent, Token};
