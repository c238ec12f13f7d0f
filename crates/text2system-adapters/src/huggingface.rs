//! Hugging Face Inference API pipelines.
//!
//! Every pipeline is a `POST {base}/models/{model}` with a JSON body; only
//! the payload and the response shape differ.  [`HfInferenceClient`] owns the
//! HTTP client and hands out one lightweight handle per pipeline, each
//! implementing the matching trait of `text2system-nlp`.
//!
//! Response parsing lives in the `parse_*` functions so that it can be tested
//! without a network.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use text2system_nlp::{
    Answer, LabelScore, QuestionAnswerer, Sentiment, SentimentAnalyzer, SentimentLabel, Tagger,
    TextEmbedder, Token, ZeroShotClassifier,
};

use crate::error::{AdapterError, Result};

/// Service name reported in errors and logs.
const SERVICE: &str = "huggingface";

/// Request timeout.  Cold models can take a while to load.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the Hugging Face Inference API.
#[derive(Debug, Clone)]
pub struct HfInferenceClient {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl HfInferenceClient {
    /// Create a client for `base_url`.  Anonymous access works for public
    /// models but is heavily rate limited.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{trimmed}/")).map_err(|e| AdapterError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Endpoint serving `model`.  Model ids keep their `owner/name` slash.
    pub fn model_url(&self, model: &str) -> Result<Url> {
        self.base_url
            .join(&format!("models/{model}"))
            .map_err(|e| AdapterError::InvalidUrl {
                url: format!("{}models/{model}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Run `model` on `payload` and return the raw JSON answer.
    pub async fn infer(&self, model: &str, payload: &Value) -> Result<Value> {
        let url = self.model_url(model)?;
        let started = Instant::now();

        let mut request = self.http.post(url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout {
                    service: SERVICE.into(),
                    seconds: DEFAULT_TIMEOUT_SECS,
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

        debug!(
            model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inference call finished"
        );

        if !status.is_success() {
            return Err(AdapterError::Status {
                service: SERVICE.into(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    // -- Handles ---------------------------------------------------------------

    pub fn tagger(&self, model: impl Into<String>) -> HfTagger {
        HfTagger {
            client: self.clone(),
            model: model.into(),
        }
    }

    pub fn zero_shot(&self, model: impl Into<String>) -> HfZeroShot {
        HfZeroShot {
            client: self.clone(),
            model: model.into(),
        }
    }

    pub fn question_answerer(&self, model: impl Into<String>) -> HfQuestionAnswerer {
        HfQuestionAnswerer {
            client: self.clone(),
            model: model.into(),
        }
    }

    pub fn sentiment(&self, model: impl Into<String>) -> HfSentiment {
        HfSentiment {
            client: self.clone(),
            model: model.into(),
        }
    }

    pub fn embedder(&self, model: impl Into<String>) -> HfEmbedder {
        HfEmbedder {
            client: self.clone(),
            model: model.into(),
        }
    }
}

/// The `error` field of an API error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Pipeline handles
// ---------------------------------------------------------------------------

/// Token classification, one token per word.
///
/// Aggregation is disabled: grouping by label would fuse adjacent words that
/// share a POS tag into one token.  Word pieces are merged in
/// [`parse_tokens`] instead.
#[derive(Debug, Clone)]
pub struct HfTagger {
    client: HfInferenceClient,
    model: String,
}

#[async_trait]
impl Tagger for HfTagger {
    async fn tag(&self, text: &str) -> text2system_nlp::Result<Vec<Token>> {
        let payload = json!({
            "inputs": text,
            "parameters": { "aggregation_strategy": "none" },
        });
        let body = self.client.infer(&self.model, &payload).await?;
        Ok(parse_tokens(body)?)
    }
}

#[derive(Debug, Clone)]
pub struct HfZeroShot {
    client: HfInferenceClient,
    model: String,
}

#[async_trait]
impl ZeroShotClassifier for HfZeroShot {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> text2system_nlp::Result<Vec<LabelScore>> {
        let payload = json!({
            "inputs": text,
            "parameters": { "candidate_labels": candidate_labels },
        });
        let body = self.client.infer(&self.model, &payload).await?;
        Ok(parse_zero_shot(body)?)
    }
}

#[derive(Debug, Clone)]
pub struct HfQuestionAnswerer {
    client: HfInferenceClient,
    model: String,
}

#[async_trait]
impl QuestionAnswerer for HfQuestionAnswerer {
    async fn answer(&self, question: &str, context: &str) -> text2system_nlp::Result<Answer> {
        let payload = json!({
            "inputs": { "question": question, "context": context },
        });
        let body = self.client.infer(&self.model, &payload).await?;
        Ok(parse_answer(body)?)
    }
}

#[derive(Debug, Clone)]
pub struct HfSentiment {
    client: HfInferenceClient,
    model: String,
}

#[async_trait]
impl SentimentAnalyzer for HfSentiment {
    async fn sentiment(&self, text: &str) -> text2system_nlp::Result<Sentiment> {
        let body = self.client.infer(&self.model, &json!({ "inputs": text })).await?;
        Ok(parse_sentiment(body)?)
    }
}

/// Feature extraction, mean pooled into one sentence vector.
#[derive(Debug, Clone)]
pub struct HfEmbedder {
    client: HfInferenceClient,
    model: String,
}

#[async_trait]
impl TextEmbedder for HfEmbedder {
    async fn embed(&self, text: &str) -> text2system_nlp::Result<Vec<f32>> {
        let body = self.client.infer(&self.model, &json!({ "inputs": text })).await?;
        Ok(parse_embedding(body)?)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawToken {
    #[serde(default)]
    entity_group: Option<String>,
    #[serde(default)]
    entity: Option<String>,
    word: String,
    start: usize,
    end: usize,
    score: f32,
}

/// Marker of a word piece continuing the previous one.
const WORD_PIECE_PREFIX: &str = "##";

/// Parse a token-classification answer.  Aggregated results carry the tag in
/// `entity_group`, raw ones in `entity`.
///
/// A `##` word piece is appended to the token before it, which keeps its tag
/// and score.
pub fn parse_tokens(body: Value) -> Result<Vec<Token>> {
    let raw: Vec<RawToken> = serde_json::from_value(body)?;
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    for t in raw {
        if let Some(piece) = t.word.strip_prefix(WORD_PIECE_PREFIX)
            && let Some(previous) = tokens.last_mut()
        {
            previous.word.push_str(piece);
            previous.end = t.end;
            continue;
        }
        let tag = t.entity_group.or(t.entity).ok_or_else(|| {
            AdapterError::invalid_response(SERVICE, format!("token `{}` has no tag", t.word))
        })?;
        tokens.push(Token::new(t.word, tag, t.start, t.end, t.score));
    }
    Ok(tokens)
}

#[derive(Debug, Deserialize)]
struct RawZeroShot {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// Parse a zero-shot answer into a ranking, best first.
pub fn parse_zero_shot(body: Value) -> Result<Vec<LabelScore>> {
    let raw: RawZeroShot = serde_json::from_value(body)?;
    if raw.labels.len() != raw.scores.len() {
        return Err(AdapterError::invalid_response(
            SERVICE,
            format!("{} labels but {} scores", raw.labels.len(), raw.scores.len()),
        ));
    }

    let mut ranking: Vec<LabelScore> = raw
        .labels
        .into_iter()
        .zip(raw.scores)
        .map(|(label, score)| LabelScore { label, score })
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranking)
}

/// Parse a question-answering answer.
pub fn parse_answer(body: Value) -> Result<Answer> {
    // Some deployments wrap the single answer in a list.
    let body = match body {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    Ok(serde_json::from_value(body)?)
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSentiment {
    Nested(Vec<Vec<RawLabel>>),
    Flat(Vec<RawLabel>),
}

/// Parse a sentiment answer, keeping the highest scoring label.
pub fn parse_sentiment(body: Value) -> Result<Sentiment> {
    let labels = match serde_json::from_value(body)? {
        RawSentiment::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        RawSentiment::Flat(labels) => labels,
    };

    let best = labels
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| AdapterError::invalid_response(SERVICE, "empty sentiment answer"))?;

    let label = match best.label.to_uppercase().as_str() {
        "POSITIVE" | "POS" | "LABEL_1" => SentimentLabel::Positive,
        "NEGATIVE" | "NEG" | "LABEL_0" => SentimentLabel::Negative,
        other => {
            return Err(AdapterError::invalid_response(
                SERVICE,
                format!("unknown sentiment label `{other}`"),
            ));
        }
    };
    Ok(Sentiment {
        label,
        score: best.score,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEmbedding {
    Sentence(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
    Batched(Vec<Vec<Vec<f32>>>),
}

/// Parse a feature-extraction answer.  Per-token vectors are mean pooled.
pub fn parse_embedding(body: Value) -> Result<Vec<f32>> {
    let vector = match serde_json::from_value(body)? {
        RawEmbedding::Sentence(vector) => vector,
        RawEmbedding::Tokens(tokens) => mean_pool(&tokens),
        RawEmbedding::Batched(batches) => {
            mean_pool(batches.first().map(Vec::as_slice).unwrap_or_default())
        }
    };
    if vector.is_empty() {
        return Err(AdapterError::invalid_response(SERVICE, "empty embedding"));
    }
    Ok(vector)
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(width) = tokens.first().map(Vec::len) else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; width];
    for token in tokens.iter().filter(|t| t.len() == width) {
        for (acc, x) in sum.iter_mut().zip(token) {
            *acc += x;
        }
    }
    let count = tokens.iter().filter(|t| t.len() == width).count() as f32;
    sum.into_iter().map(|x| x / count).collect()
}
