//! Intent parser: turns a tagged user message into exactly one [`Intent`].
//!
//! Resolution is layered, first success wins:
//!
//! 1. **Verb match**: the first `VERB` token's word equals an intent label.
//! 2. **Direct command**: no verb at all, a single meaningful (non-`PUNCT`)
//!    token, and the *first* token's word equals one of the remaining labels.
//!    `save` and `read` are removed from the candidates first: a verbless
//!    message is never a save or read command.
//! 3. **Zero-shot fallback**: the classifier ranks the candidate labels and
//!    the top one is mapped back to an [`Intent`].
//!
//! Steps 1 and 2 are the pure [`match_rules`]; step 3 is [`classify_intent`].
//! The engine only builds the zero-shot pipeline when the rules give up.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NlpError, Result};
use crate::services::{LabelScore, ZeroShotClassifier};
use crate::types::{Intent, Token, pos};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which strategy produced the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The first verb matched an intent label.
    Verb,
    /// A verbless single-word message matched an intent label.
    DirectCommand,
    /// Ranked by the zero-shot classifier.
    ZeroShot,
}

/// Outcome of the rule-based strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Resolved {
        intent: Intent,
        source: ResolutionSource,
    },
    /// No rule applied; the classifier must choose among `candidates`.
    Unresolved { candidates: Vec<String> },
}

/// An immutable, fully resolved message.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedMessage {
    text: String,
    tokens: Vec<Token>,
    intent: Intent,
    source: ResolutionSource,
    classification: Option<Vec<LabelScore>>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Apply the verb and direct-command strategies to `tokens`.
pub fn match_rules(tokens: &[Token]) -> RuleOutcome {
    let mut candidates: Vec<Intent> = Intent::ALL.to_vec();

    if let Some(verb) = tokens.iter().find(|t| t.is(pos::VERB)) {
        if let Some(intent) = candidates.iter().copied().find(|i| verb.word == i.label()) {
            debug!(verb = %verb.word, intent = %intent, "intent resolved by verb");
            return RuleOutcome::Resolved {
                intent,
                source: ResolutionSource::Verb,
            };
        }
    } else {
        candidates.retain(|i| !matches!(i, Intent::Save | Intent::Read));

        let meaningful = tokens.iter().filter(|t| !t.is(pos::PUNCT)).count();
        if meaningful == 1
            && let Some(first) = tokens.first()
            && let Some(intent) = candidates.iter().copied().find(|i| first.word == i.label())
        {
            debug!(word = %first.word, intent = %intent, "intent resolved as direct command");
            return RuleOutcome::Resolved {
                intent,
                source: ResolutionSource::DirectCommand,
            };
        }
    }

    RuleOutcome::Unresolved {
        candidates: candidates.iter().map(|i| i.label().to_string()).collect(),
    }
}

/// Rank `candidates` with the zero-shot classifier and map the winner.
///
/// A winning label outside [`Intent`] is [`NlpError::UnknownIntent`].
pub async fn classify_intent(
    classifier: &dyn ZeroShotClassifier,
    text: &str,
    candidates: &[String],
) -> Result<(Intent, Vec<LabelScore>)> {
    let ranking = classifier.classify(text, candidates).await?;
    let top = ranking
        .first()
        .ok_or_else(|| NlpError::EmptyClassification {
            text: text.to_string(),
        })?;

    let intent = Intent::from_name(&top.label.to_uppercase())?;
    debug!(label = %top.label, score = top.score, intent = %intent, "intent resolved by zero-shot");
    Ok((intent, ranking))
}

// ---------------------------------------------------------------------------
// Parsed message
// ---------------------------------------------------------------------------

impl ParsedMessage {
    pub fn new(
        text: impl Into<String>,
        tokens: Vec<Token>,
        intent: Intent,
        source: ResolutionSource,
        classification: Option<Vec<LabelScore>>,
    ) -> Self {
        Self {
            text: text.into(),
            tokens,
            intent,
            source,
            classification,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn source(&self) -> ResolutionSource {
        self.source
    }

    /// Classifier ranking, present only when the zero-shot fallback ran.
    pub fn classification(&self) -> Option<&[LabelScore]> {
        self.classification.as_deref()
    }

    /// Tokens carrying `tag`, in message order.
    pub fn tokens_by_type(&self, tag: &str) -> Vec<&Token> {
        self.tokens.iter().filter(|t| t.is(tag)).collect()
    }

    pub fn first_token_by_type(&self, tag: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.is(tag))
    }

    pub fn intent_is(&self, intent: Intent) -> bool {
        self.intent == intent
    }

    pub fn intent_is_greet(&self) -> bool {
        self.intent_is(Intent::Greeting)
    }

    pub fn intent_is_save(&self) -> bool {
        self.intent_is(Intent::Save)
    }

    pub fn intent_is_delete(&self) -> bool {
        self.intent_is(Intent::Delete)
    }

    pub fn intent_is_read(&self) -> bool {
        self.intent_is(Intent::Read)
    }

    pub fn intent_is_say_goodbye(&self) -> bool {
        self.intent_is(Intent::Goodbye)
    }

    pub fn intent_is_help(&self) -> bool {
        self.intent_is(Intent::Help)
    }

    pub fn intent_is_cancel(&self) -> bool {
        self.intent_is(Intent::Cancelation)
    }

    pub fn intent_is_confirm(&self) -> bool {
        self.intent_is(Intent::Confirmation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
