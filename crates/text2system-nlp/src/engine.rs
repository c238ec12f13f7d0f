//! The command engine.
//!
//! [`CommandEngine`] owns the long-lived state of the pipeline: the
//! [`PipelineRegistry`] with every model handle constructed so far and the
//! [`SimilarityCache`] of learned synonyms.  Both are created with the engine
//! and live as long as it does; nothing is ever reset.
//!
//! Every operation that may build a pipeline or learn a synonym takes
//! `&mut self`.  An engine shared between tasks must be wrapped in a mutex by
//! the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{EngineConfig, ModelSection};
use crate::decoder::DecodedMessage;
use crate::domain::{DomainRegistry, StaticDomain};
use crate::error::{NlpError, Result};
use crate::parser::{ParsedMessage, ResolutionSource, RuleOutcome, classify_intent, match_rules};
use crate::registry::{Pipeline, PipelineFactory, PipelineKind, PipelineOptions, PipelineRegistry};
use crate::services::{
    NluService, QuestionAnswerer, SentimentAnalyzer, SentimentLabel, Tagger, TextEmbedder,
    ZeroShotClassifier,
};
use crate::similarity::{SimilarityCache, cosine_similarity};
use crate::types::{Intent, Token};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One extracted attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributePair {
    pub name: String,
    pub value: String,
}

/// A message resolved end to end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCommand {
    pub text: String,
    pub intent: Intent,
    pub source: ResolutionSource,
    /// Target class of a CRUD command; `None` when the message names none.
    pub entity_class: Option<String>,
    pub attributes: Vec<AttributePair>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Resolves free-text messages into structured commands.
pub struct CommandEngine {
    pub(crate) threshold: f64,
    pub(crate) models: ModelSection,
    pub(crate) registry: PipelineRegistry,
    pub(crate) cache: SimilarityCache,
    pub(crate) domain: Arc<dyn DomainRegistry>,
    pub(crate) nlu: Option<Arc<dyn NluService>>,
}

impl CommandEngine {
    /// Create an engine with default models and no NLU service.
    pub fn new(
        factory: Arc<dyn PipelineFactory>,
        domain: Arc<dyn DomainRegistry>,
        threshold: f64,
    ) -> Self {
        Self {
            threshold,
            models: ModelSection::default(),
            registry: PipelineRegistry::new(factory),
            cache: SimilarityCache::new(),
            domain,
            nlu: None,
        }
        .seed_domain_synonyms()
    }

    /// Create an engine from loaded configuration.
    ///
    /// Domain classes come from the `[domain]` section and their synonyms are
    /// registered before any inference runs.
    pub fn from_config(config: &EngineConfig, factory: Arc<dyn PipelineFactory>) -> Self {
        let domain = Arc::new(StaticDomain::new(config.domain.classes.clone()));
        Self::new(factory, domain, config.engine.threshold).with_models(config.models.clone())
    }

    /// Use `models` for pipelines that have not been constructed yet.
    pub fn with_models(mut self, models: ModelSection) -> Self {
        self.models = models;
        self
    }

    /// Attach the conversational NLU service.
    pub fn with_nlu(mut self, nlu: Arc<dyn NluService>) -> Self {
        self.nlu = Some(nlu);
        self
    }

    fn seed_domain_synonyms(mut self) -> Self {
        for class in self.domain.classes() {
            if !class.synonyms.is_empty() {
                self.cache.add_custom_synonyms(&class.name, class.synonyms);
            }
        }
        info!(
            threshold = self.threshold,
            synonyms = self.cache.len(),
            "command engine ready"
        );
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    pub fn domain(&self) -> &dyn DomainRegistry {
        self.domain.as_ref()
    }

    // -- Pipelines ------------------------------------------------------------

    /// Memoized pipeline access; see [`PipelineRegistry::get_pipeline`].
    pub fn get_pipeline(&mut self, kind: PipelineKind, options: &PipelineOptions) -> Result<Pipeline> {
        self.registry.get_pipeline(kind, options)
    }

    fn pipeline(&mut self, kind: PipelineKind) -> Result<Pipeline> {
        let options = PipelineOptions::model(self.models.for_kind(kind));
        self.registry.get_pipeline(kind, &options)
    }

    pub(crate) fn tagger(&mut self) -> Result<Arc<dyn Tagger>> {
        self.pipeline(PipelineKind::TokenClassification)?.into_tagger()
    }

    fn zero_shot(&mut self) -> Result<Arc<dyn ZeroShotClassifier>> {
        self.pipeline(PipelineKind::ZeroShotClassification)?
            .into_zero_shot()
    }

    pub(crate) fn question_answerer(&mut self) -> Result<Arc<dyn QuestionAnswerer>> {
        self.pipeline(PipelineKind::QuestionAnswering)?
            .into_question_answerer()
    }

    fn sentiment(&mut self) -> Result<Arc<dyn SentimentAnalyzer>> {
        self.pipeline(PipelineKind::SentimentAnalysis)?
            .into_sentiment()
    }

    fn embedder(&mut self) -> Result<Arc<dyn TextEmbedder>> {
        self.pipeline(PipelineKind::TextSimilarity)?.into_embedder()
    }

    // -- Messages -------------------------------------------------------------

    /// Part-of-speech tag `msg`.
    pub async fn pos_tag_msg(&mut self, msg: &str) -> Result<Vec<Token>> {
        let tagger = self.tagger()?;
        tagger.tag(msg).await
    }

    /// Tag `msg` and resolve its intent.
    pub async fn parse_message(&mut self, msg: &str) -> Result<ParsedMessage> {
        let tokens = self.pos_tag_msg(msg).await?;

        match match_rules(&tokens) {
            RuleOutcome::Resolved { intent, source } => {
                Ok(ParsedMessage::new(msg, tokens, intent, source, None))
            }
            RuleOutcome::Unresolved { candidates } => {
                let classifier = self.zero_shot()?;
                let (intent, ranking) = classify_intent(classifier.as_ref(), msg, &candidates).await?;
                Ok(ParsedMessage::new(
                    msg,
                    tokens,
                    intent,
                    ResolutionSource::ZeroShot,
                    Some(ranking),
                ))
            }
        }
    }

    /// Send `msg` to the NLU service and decode the answer.
    pub async fn decode_with_nlu(&self, msg: &str) -> Result<DecodedMessage> {
        let nlu = self.nlu.as_ref().ok_or_else(|| NlpError::Config {
            reason: "no NLU service configured (set WIT_ACCESS_KEY)".into(),
        })?;
        let response = nlu.parse(msg).await?;
        DecodedMessage::decode(&response, self.threshold)
    }

    /// Whether the NLU service reads `msg` as a greeting.
    pub async fn msg_is_greeting(&self, msg: &str) -> Result<bool> {
        Ok(self.decode_with_nlu(msg).await?.intent_is_greet())
    }

    /// Whether the NLU service reads `msg` as a goodbye.
    pub async fn msg_is_goodbye(&self, msg: &str) -> Result<bool> {
        Ok(self.decode_with_nlu(msg).await?.intent_is_say_goodbye())
    }

    /// Whether the sentiment model rates `msg` positive.
    pub async fn msg_is_positive(&mut self, msg: &str) -> Result<bool> {
        let analyzer = self.sentiment()?;
        let sentiment = analyzer.sentiment(msg).await?;
        debug!(label = ?sentiment.label, score = sentiment.score, "sentiment analysed");
        Ok(sentiment.label == SentimentLabel::Positive)
    }

    // -- Synonyms ---------------------------------------------------------------

    /// Register `alternatives` as names of `canonical`.
    pub fn add_custom_synonyms<I, S>(&mut self, canonical: &str, alternatives: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache.add_custom_synonyms(canonical, alternatives);
    }

    /// `name` plus every alternative learned or registered for it.
    pub fn synonyms(&self, name: &str) -> Vec<String> {
        self.cache.synonyms(name)
    }

    /// [`Self::texts_are_similar_with_threshold`] with the engine threshold.
    pub async fn texts_are_similar(&mut self, a: &str, b: &str) -> Result<bool> {
        let threshold = self.threshold;
        self.texts_are_similar_with_threshold(a, b, threshold).await
    }

    /// Whether `a` and `b` name the same thing.
    ///
    /// Equal strings and cached synonyms answer without a model call.
    /// Otherwise the embeddings are compared; a cosine strictly above
    /// `threshold` caches `b` as an alternative of `a`.
    pub async fn texts_are_similar_with_threshold(
        &mut self,
        a: &str,
        b: &str,
        threshold: f64,
    ) -> Result<bool> {
        if a == b || self.cache.related(a, b) {
            return Ok(true);
        }

        let embedder = self.embedder()?;
        let first = embedder.embed(a).await?;
        let second = embedder.embed(b).await?;
        let score = cosine_similarity(&first, &second);
        debug!(a, b, score, threshold, "embedding similarity");

        if score > threshold {
            self.cache.insert(b, a);
            return Ok(true);
        }
        Ok(false)
    }

    // -- End to end -------------------------------------------------------------

    /// Resolve intent, entity class and attributes of `msg`.
    ///
    /// Only CRUD intents look for a class; attributes are only extracted once
    /// a class was found.  The tags of the intent step are reused.
    pub async fn resolve_command(&mut self, msg: &str) -> Result<ResolvedCommand> {
        let parsed = self.parse_message(msg).await?;
        let intent = parsed.intent();

        let mut entity_class = None;
        let mut attributes = Vec::new();
        if intent.is_crud() {
            entity_class = self
                .entity_class_from_tokens(msg, parsed.tokens(), intent.label())
                .await?;
            if let Some(class) = &entity_class {
                let flat = self
                    .attributes_from_tokens(msg, parsed.tokens(), class)
                    .await?;
                attributes = crate::attributes::attribute_pairs(&flat);
            }
        }

        info!(
            intent = %intent,
            source = ?parsed.source(),
            entity_class = entity_class.as_deref().unwrap_or("-"),
            attributes = attributes.len(),
            "command resolved"
        );

        Ok(ResolvedCommand {
            text: msg.to_string(),
            intent,
            source: parsed.source(),
            entity_class,
            attributes,
        })
    }
}

impl std::fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("threshold", &self.threshold)
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("nlu", &self.nlu.is_some())
            .finish()
    }
}
