//! Integration tests for the text2system-nlp crate.
//!
//! These tests drive the [`CommandEngine`] end to end against in-memory stub
//! pipelines that count their calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use text2system_nlp::{
    Answer, CommandEngine, DecodedMessage, DomainClass, EngineConfig, Intent, LabelScore, NlpError,
    NluResponse, NluService, Pipeline, PipelineFactory, PipelineKind, PipelineOptions,
    QuestionAnswerer, ResolutionSource, Result, Sentiment, SentimentAnalyzer, SentimentLabel,
    StaticDomain, Tagger, TextEmbedder, Token, ZeroShotClassifier,
};

// ═══════════════════════════════════════════════════════════════════════
//  Stubs
// ═══════════════════════════════════════════════════════════════════════

/// Build tokens for `msg`, locating each word after the previous one.
/// Offsets are in characters, like the tagging service reports them.
fn tag(msg: &str, words: &[(&str, &str)]) -> Vec<Token> {
    let mut from = 0;
    words
        .iter()
        .map(|(word, tag)| {
            let byte_start = from + msg[from..].find(word).expect("word must occur in message");
            from = byte_start + word.len();
            let start = msg[..byte_start].chars().count();
            Token::new(*word, *tag, start, start + word.chars().count(), 0.99)
        })
        .collect()
}

#[derive(Default)]
struct StubTagger {
    tags: Mutex<HashMap<String, Vec<Token>>>,
    calls: AtomicUsize,
}

impl StubTagger {
    fn with(&self, msg: &str, words: &[(&str, &str)]) {
        self.tags
            .lock()
            .unwrap()
            .insert(msg.to_string(), tag(msg, words));
    }
}

#[async_trait]
impl Tagger for StubTagger {
    async fn tag(&self, text: &str) -> Result<Vec<Token>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tags
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct StubClassifier {
    top: Mutex<String>,
    last_candidates: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl ZeroShotClassifier for StubClassifier {
    async fn classify(&self, _text: &str, candidate_labels: &[String]) -> Result<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_candidates.lock().unwrap() = candidate_labels.to_vec();
        Ok(vec![LabelScore {
            label: self.top.lock().unwrap().clone(),
            score: 0.91,
        }])
    }
}

type AnswerFn = dyn Fn(&str, &str) -> Result<String> + Send + Sync;

struct StubQa {
    respond: Mutex<Box<AnswerFn>>,
    questions: Mutex<Vec<(String, String)>>,
}

impl Default for StubQa {
    fn default() -> Self {
        Self {
            respond: Mutex::new(Box::new(|_, _| Ok(String::new()))),
            questions: Mutex::new(Vec::new()),
        }
    }
}

impl StubQa {
    fn respond<F>(&self, f: F)
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        *self.respond.lock().unwrap() = Box::new(f);
    }

    fn calls(&self) -> usize {
        self.questions.lock().unwrap().len()
    }
}

#[async_trait]
impl QuestionAnswerer for StubQa {
    async fn answer(&self, question: &str, context: &str) -> Result<Answer> {
        self.questions
            .lock()
            .unwrap()
            .push((question.to_string(), context.to_string()));
        let answer = {
            let respond = self.respond.lock().unwrap();
            (*respond)(question, context)?
        };
        Ok(Answer {
            start: context.find(&answer).unwrap_or(0),
            end: context.find(&answer).unwrap_or(0) + answer.len(),
            answer,
            score: 0.8,
        })
    }
}

#[derive(Default)]
struct StubEmbedder {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    fn with(&self, text: &str, vector: Vec<f32>) {
        self.vectors.lock().unwrap().insert(text.to_string(), vector);
    }
}

#[async_trait]
impl TextEmbedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .vectors
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0, 0.0]))
    }
}

struct StubSentiment;

#[async_trait]
impl SentimentAnalyzer for StubSentiment {
    async fn sentiment(&self, text: &str) -> Result<Sentiment> {
        let label = if text.contains("great") {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };
        Ok(Sentiment { label, score: 0.99 })
    }
}

struct StubNlu {
    body: &'static str,
}

#[async_trait]
impl NluService for StubNlu {
    async fn parse(&self, _message: &str) -> Result<NluResponse> {
        NluResponse::from_json(self.body)
    }
}

/// Factory handing out the shared stubs and recording constructions.
#[derive(Default)]
struct StubFactory {
    tagger: Arc<StubTagger>,
    classifier: Arc<StubClassifier>,
    qa: Arc<StubQa>,
    embedder: Arc<StubEmbedder>,
    created: Mutex<Vec<(PipelineKind, Option<String>)>>,
}

impl StubFactory {
    fn created(&self, kind: PipelineKind) -> usize {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl PipelineFactory for StubFactory {
    fn create(&self, kind: PipelineKind, options: &PipelineOptions) -> Result<Pipeline> {
        self.created
            .lock()
            .unwrap()
            .push((kind, options.model.clone()));
        Ok(match kind {
            PipelineKind::TokenClassification => Pipeline::Tagger(self.tagger.clone()),
            PipelineKind::ZeroShotClassification => Pipeline::ZeroShot(self.classifier.clone()),
            PipelineKind::QuestionAnswering => Pipeline::QuestionAnswering(self.qa.clone()),
            PipelineKind::SentimentAnalysis => Pipeline::Sentiment(Arc::new(StubSentiment)),
            PipelineKind::TextSimilarity => Pipeline::Embedding(self.embedder.clone()),
        })
    }
}

fn engine_with(classes: Vec<DomainClass>) -> (CommandEngine, Arc<StubFactory>) {
    let factory = Arc::new(StubFactory::default());
    let domain = Arc::new(StaticDomain::new(classes));
    let engine = CommandEngine::new(factory.clone(), domain, 0.7);
    (engine, factory)
}

fn customer_domain() -> Vec<DomainClass> {
    vec![
        DomainClass::new("customer", ["name", "email"]),
        DomainClass::new("product", ["price", "description"]),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
//  Decoder
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn decoded_entities_are_ordered_by_offset() {
    let bodies = [
        r#"{"intents": [], "entities": {
            "email:email": [{"name": "email", "confidence": 0.9, "body": "a@b.c", "start": 40}],
            "class:class": [{"name": "class", "confidence": 0.9, "body": "customer", "start": 7},
                            {"name": "class", "confidence": 0.95, "body": "client", "start": 2}],
            "location:location": [{"name": "wit$location", "confidence": 0.8, "body": "Porto", "start": 20}]
        }}"#,
        r#"{"intents": [{"name": "delete", "confidence": 0.99}], "entities": {
            "attribute:attribute_name": [{"name": "attribute", "confidence": 0.75, "body": "Zip Code", "role": "attribute_name", "start": 9}],
            "contact:contact": [{"name": "contact", "confidence": 0.85, "body": "Rui", "start": 0}]
        }}"#,
    ];

    for body in bodies {
        let decoded = DecodedMessage::decode(&NluResponse::from_json(body).unwrap(), 0.7).unwrap();
        let starts: Vec<usize> = decoded.entities().iter().map(|e| e.start).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]), "unordered: {starts:?}");
    }
}

#[test]
fn confidence_at_threshold_is_dropped() {
    let body = r#"{"intents": [{"name": "help", "confidence": 0.7}], "entities": {
        "class:class": [{"name": "class", "confidence": 0.7, "body": "customer", "start": 0},
                        {"name": "class", "confidence": 0.7001, "body": "product", "start": 5}]
    }}"#;
    let decoded = DecodedMessage::decode(&NluResponse::from_json(body).unwrap(), 0.7).unwrap();

    assert_eq!(decoded.intent(), None);
    assert_eq!(decoded.entities().len(), 1);
    assert_eq!(decoded.entities()[0].body, "product");
}

// ═══════════════════════════════════════════════════════════════════════
//  Pipeline registry
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn get_pipeline_is_idempotent() {
    let (mut engine, factory) = engine_with(customer_domain());

    let first = engine
        .get_pipeline(PipelineKind::QuestionAnswering, &PipelineOptions::model("qa-a"))
        .unwrap();
    let second = engine
        .get_pipeline(PipelineKind::QuestionAnswering, &PipelineOptions::model("qa-b"))
        .unwrap();

    assert!(first.same_handle(&second));
    assert_eq!(factory.created(PipelineKind::QuestionAnswering), 1);
    assert_eq!(engine.registry().len(), 1);
}

#[tokio::test]
async fn configured_models_reach_the_factory() {
    let factory = Arc::new(StubFactory::default());
    let config = EngineConfig::from_toml_str(
        "[models]\ntoken_classification = \"custom/pos-tagger\"",
    )
    .unwrap();
    let mut engine = CommandEngine::from_config(&config, factory.clone());

    engine.pos_tag_msg("hello").await.unwrap();
    engine.pos_tag_msg("hello again").await.unwrap();

    let created = factory.created.lock().unwrap();
    assert_eq!(
        *created,
        vec![(
            PipelineKind::TokenClassification,
            Some("custom/pos-tagger".to_string())
        )]
    );
}

#[test]
fn shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = EngineConfig::load(path).unwrap();

    assert_eq!(config.engine.threshold, 0.7);
    assert_eq!(config.models, text2system_nlp::ModelSection::default());
    assert!(config.domain.classes.iter().any(|c| c.name == "customer"));

    let engine = CommandEngine::from_config(&config, Arc::new(StubFactory::default()));
    assert_eq!(engine.synonyms("customer"), vec!["customer", "client"]);
}

// ═══════════════════════════════════════════════════════════════════════
//  Similarity cache
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn similarity_learns_and_skips_the_model_afterwards() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory.embedder.with("customer", vec![1.0, 0.0, 0.0]);
    factory.embedder.with("client", vec![0.9, 0.1, 0.0]);

    assert!(engine.texts_are_similar("customer", "client").await.unwrap());
    assert_eq!(factory.embedder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.cache().canonical("client"), Some("customer"));

    assert!(engine.texts_are_similar("customer", "client").await.unwrap());
    // Reversed operands hit the cache too.
    assert!(engine.texts_are_similar("client", "customer").await.unwrap());
    assert_eq!(factory.embedder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.synonyms("customer"), vec!["customer", "client"]);
}

#[tokio::test]
async fn dissimilar_texts_are_not_cached() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory.embedder.with("customer", vec![1.0, 0.0, 0.0]);
    factory.embedder.with("invoice", vec![0.0, 1.0, 0.0]);

    assert!(!engine.texts_are_similar("customer", "invoice").await.unwrap());
    assert!(engine.cache().is_empty());

    // A lower threshold for this call only.
    factory.embedder.with("buyer", vec![0.6, 0.8, 0.0]);
    assert!(
        !engine
            .texts_are_similar("customer", "buyer")
            .await
            .unwrap()
    );
    assert!(
        engine
            .texts_are_similar_with_threshold("customer", "buyer", 0.5)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn equal_and_registered_texts_need_no_model() {
    let (mut engine, factory) = engine_with(customer_domain());
    engine.add_custom_synonyms("customer", ["patron"]);

    assert!(engine.texts_are_similar("order", "order").await.unwrap());
    assert!(engine.texts_are_similar("customer", "patron").await.unwrap());
    assert!(engine.texts_are_similar("patron", "customer").await.unwrap());
    assert_eq!(factory.created(PipelineKind::TextSimilarity), 0);
}

#[test]
fn configured_synonyms_are_seeded() {
    let classes = vec![DomainClass::new("customer", ["name"]).with_synonyms(["client", "buyer"])];
    let (engine, _) = engine_with(classes);
    assert_eq!(engine.synonyms("customer"), vec!["customer", "buyer", "client"]);
}

// ═══════════════════════════════════════════════════════════════════════
//  Intent resolution
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn verb_match_beats_the_classifier() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "delete the customer";
    factory
        .tagger
        .with(msg, &[("delete", "VERB"), ("the", "DET"), ("customer", "NOUN")]);
    *factory.classifier.top.lock().unwrap() = "greeting".into();

    let parsed = engine.parse_message(msg).await.unwrap();

    assert_eq!(parsed.intent(), Intent::Delete);
    assert!(parsed.intent_is_delete());
    assert_eq!(parsed.source(), ResolutionSource::Verb);
    assert!(parsed.classification().is_none());
    assert_eq!(factory.classifier.calls.load(Ordering::SeqCst), 0);
    assert_eq!(factory.created(PipelineKind::ZeroShotClassification), 0);
}

#[tokio::test]
async fn single_word_help_is_a_direct_command() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory.tagger.with("help", &[("help", "NOUN")]);

    let parsed = engine.parse_message("help").await.unwrap();

    assert!(parsed.intent_is_help());
    assert_eq!(parsed.source(), ResolutionSource::DirectCommand);
    assert_eq!(factory.classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_shot_fallback_uses_reduced_labels() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory
        .tagger
        .with("good morning!", &[("good", "ADJ"), ("morning", "NOUN"), ("!", "PUNCT")]);
    *factory.classifier.top.lock().unwrap() = "greeting".into();

    let parsed = engine.parse_message("good morning!").await.unwrap();

    assert!(parsed.intent_is_greet());
    assert_eq!(parsed.source(), ResolutionSource::ZeroShot);
    assert_eq!(parsed.classification().unwrap()[0].label, "greeting");
    let candidates = factory.classifier.last_candidates.lock().unwrap().clone();
    assert!(!candidates.contains(&"save".to_string()));
    assert!(!candidates.contains(&"read".to_string()));
    assert!(candidates.contains(&"delete".to_string()));
}

#[tokio::test]
async fn unknown_classifier_label_is_fatal() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory
        .tagger
        .with("book a flight", &[("book", "VERB"), ("a", "DET"), ("flight", "NOUN")]);
    *factory.classifier.top.lock().unwrap() = "travel".into();

    let err = engine.parse_message("book a flight").await.unwrap_err();
    assert!(matches!(err, NlpError::UnknownIntent { ref name } if name == "TRAVEL"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Entity-class resolution
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn class_answer_equal_to_intent_is_ambiguous() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory.tagger.with("delete it", &[("delete", "VERB"), ("it", "PRON")]);
    factory.qa.respond(|_, _| Ok("delete".to_string()));

    let class = engine.entity_class_from_msg("delete it", "delete").await.unwrap();

    assert_eq!(class, None);
    let questions = factory.qa.questions.lock().unwrap();
    assert_eq!(questions[0].0, text2system_nlp::CLASS_QUESTION);
    assert!(questions[0].1.contains("The intent of the user command is delete."));
}

#[tokio::test]
async fn cached_answer_maps_to_canonical_class() {
    let (mut engine, factory) = engine_with(customer_domain());
    engine.add_custom_synonyms("customer", ["client"]);
    factory.qa.respond(|_, _| Ok("client".to_string()));

    let class = engine
        .entity_class_from_msg("remove that client", "delete")
        .await
        .unwrap();
    assert_eq!(class.as_deref(), Some("customer"));
}

#[tokio::test]
async fn similar_candidate_makes_the_class_definite() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "save the client Ana";
    factory.tagger.with(
        msg,
        &[("save", "VERB"), ("the", "DET"), ("client", "NOUN"), ("Ana", "PROPN")],
    );
    factory.embedder.with("customer", vec![1.0, 0.1, 0.0]);
    factory.embedder.with("client", vec![0.95, 0.15, 0.0]);
    factory.embedder.with("product", vec![0.0, 0.0, 1.0]);
    factory.qa.respond(|_, context| {
        Ok(context
            .strip_prefix("The entity class is definitely this: ")
            .unwrap_or("Ana")
            .to_string())
    });

    let class = engine.entity_class_from_msg(msg, "save").await.unwrap();

    assert_eq!(class.as_deref(), Some("customer"));
    assert_eq!(engine.cache().canonical("client"), Some("customer"));
}

#[tokio::test]
async fn hint_skips_known_attribute_names() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "read email of supplier";
    factory.tagger.with(
        msg,
        &[("read", "VERB"), ("email", "NOUN"), ("of", "ADP"), ("supplier", "NOUN")],
    );
    factory.embedder.with("customer", vec![1.0, 0.0, 0.0]);
    factory.embedder.with("product", vec![0.0, 1.0, 0.0]);
    factory.embedder.with("supplier", vec![0.0, 0.0, 1.0]);
    factory.qa.respond(|_, _| Ok("supplier".to_string()));

    let class = engine.entity_class_from_msg(msg, "read").await.unwrap();

    assert_eq!(class.as_deref(), Some("supplier"));
    let questions = factory.qa.questions.lock().unwrap();
    assert!(questions[0].1.contains("Perhaps the entity class may be this: supplier."));
    assert!(!questions[0].1.contains("may be this: email"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Attribute extraction
// ═══════════════════════════════════════════════════════════════════════

fn customer_message_tags(factory: &StubFactory, msg: &str) {
    factory.tagger.with(
        msg,
        &[
            ("create", "VERB"),
            ("a", "DET"),
            ("customer", "NOUN"),
            ("name", "NOUN"),
            ("John", "PROPN"),
            ("with", "ADP"),
            ("email", "NOUN"),
            ("john@x.com", "X"),
        ],
    );
}

#[tokio::test]
async fn attributes_follow_the_class_mention() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "create a customer named John with email john@x.com";
    customer_message_tags(&factory, msg);
    factory.qa.respond(|question, _| {
        Ok(match question {
            "What is the name of the customer?" => "John",
            "What is the email of the customer?" => "john@x.com",
            other => panic!("unexpected question: {other}"),
        }
        .to_string())
    });

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();

    assert_eq!(attributes, vec!["name", "John", "email", "john@x.com"]);
    assert_eq!(factory.qa.calls(), 2);
}

#[tokio::test]
async fn attributes_after_accented_values_are_kept() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "create a customer name Zoë Ñuñez email z@x.com";
    factory.tagger.with(
        msg,
        &[
            ("create", "VERB"),
            ("a", "DET"),
            ("customer", "NOUN"),
            ("name", "NOUN"),
            ("Zoë", "PROPN"),
            ("Ñuñez", "PROPN"),
            ("email", "NOUN"),
            ("z@x.com", "X"),
        ],
    );
    factory.qa.respond(|question, _| {
        Ok(match question {
            "What is the name of the customer?" => "Zoë Ñuñez",
            "What is the email of the customer?" => "z@x.com",
            other => panic!("unexpected question: {other}"),
        }
        .to_string())
    });

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();

    assert_eq!(attributes, vec!["name", "Zoë Ñuñez", "email", "z@x.com"]);
    assert_eq!(factory.qa.calls(), 2);
}

#[tokio::test]
async fn attributes_use_class_synonyms() {
    let (mut engine, factory) = engine_with(customer_domain());
    engine.add_custom_synonyms("customer", ["client"]);
    let msg = "save client phone 555";
    factory.tagger.with(
        msg,
        &[("save", "VERB"), ("client", "NOUN"), ("phone", "NOUN"), ("555", "NUM")],
    );
    factory.qa.respond(|_, _| Ok("555".to_string()));

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();
    assert_eq!(attributes, vec!["phone", "555"]);
}

#[tokio::test]
async fn missing_class_mention_yields_no_attributes() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "save product price 10";
    factory.tagger.with(
        msg,
        &[("save", "VERB"), ("product", "NOUN"), ("price", "NOUN"), ("10", "NUM")],
    );

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();

    assert!(attributes.is_empty());
    assert_eq!(factory.qa.calls(), 0);
}

#[tokio::test]
async fn unlocatable_answers_still_terminate() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "customer name age city";
    factory.tagger.with(
        msg,
        &[("customer", "NOUN"), ("name", "NOUN"), ("age", "NOUN"), ("city", "NOUN")],
    );
    // Neither answer occurs in the message.
    factory.qa.respond(|_, _| Ok("unknown value".to_string()));

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();

    assert_eq!(
        attributes,
        vec!["name", "unknown value", "age", "unknown value", "city", "unknown value"]
    );
    assert_eq!(factory.qa.calls(), 3);
}

#[tokio::test]
async fn answers_located_before_the_noun_still_terminate() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "customer email customer";
    factory.tagger.with(
        msg,
        &[("customer", "NOUN"), ("email", "NOUN"), ("customer", "NOUN")],
    );
    factory.qa.respond(|_, _| Ok("customer".to_string()));

    let attributes = engine.attributes_from_msg(msg, "customer").await.unwrap();

    assert_eq!(attributes, vec!["email", "customer", "customer", "customer"]);
}

#[tokio::test]
async fn qa_failures_propagate() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "create a customer named John with email john@x.com";
    customer_message_tags(&factory, msg);
    factory
        .qa
        .respond(|_, _| Err(NlpError::service("question-answering", "model offline")));

    let err = engine.attributes_from_msg(msg, "customer").await.unwrap_err();
    assert!(matches!(err, NlpError::Service { ref reason, .. } if reason == "model offline"));
}

// ═══════════════════════════════════════════════════════════════════════
//  End to end
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn resolve_command_chains_every_step() {
    let (mut engine, factory) = engine_with(customer_domain());
    let msg = "create a customer named John with email john@x.com";
    customer_message_tags(&factory, msg);
    *factory.classifier.top.lock().unwrap() = "save".into();
    factory.qa.respond(|question, _| {
        Ok(match question {
            text2system_nlp::CLASS_QUESTION => "customer",
            "What is the name of the customer?" => "John",
            _ => "john@x.com",
        }
        .to_string())
    });

    let command = engine.resolve_command(msg).await.unwrap();

    // "create" is not an intent label, so the classifier decided.
    assert_eq!(command.intent, Intent::Save);
    assert_eq!(command.source, ResolutionSource::ZeroShot);
    assert_eq!(command.entity_class.as_deref(), Some("customer"));
    assert_eq!(command.attributes.len(), 2);
    assert_eq!(command.attributes[0].name, "name");
    assert_eq!(command.attributes[0].value, "John");
    // Tags were computed once and reused.
    assert_eq!(factory.tagger.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn conversational_intents_skip_class_resolution() {
    let (mut engine, factory) = engine_with(customer_domain());
    factory.tagger.with("help", &[("help", "NOUN")]);

    let command = engine.resolve_command("help").await.unwrap();

    assert_eq!(command.intent, Intent::Help);
    assert!(command.entity_class.is_none());
    assert!(command.attributes.is_empty());
    assert_eq!(factory.created(PipelineKind::QuestionAnswering), 0);
}

// ═══════════════════════════════════════════════════════════════════════
//  NLU and sentiment checks
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn nlu_greeting_and_goodbye_checks() {
    let (engine, _) = engine_with(customer_domain());
    let engine = engine.with_nlu(Arc::new(StubNlu {
        body: r#"{"intents": [{"name": "wit$greeting", "confidence": 0.98}], "entities": {}}"#,
    }));

    assert!(engine.msg_is_greeting("hi there").await.unwrap());
    assert!(!engine.msg_is_goodbye("hi there").await.unwrap());
}

#[tokio::test]
async fn nlu_checks_require_a_service() {
    let (engine, _) = engine_with(customer_domain());
    let err = engine.msg_is_goodbye("bye").await.unwrap_err();
    assert!(matches!(err, NlpError::Config { .. }));
}

#[tokio::test]
async fn sentiment_check() {
    let (mut engine, _) = engine_with(customer_domain());
    assert!(engine.msg_is_positive("that was great").await.unwrap());
    assert!(!engine.msg_is_positive("that was awful").await.unwrap());
}
