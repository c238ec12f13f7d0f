//! Attribute extraction.
//!
//! Starting right after the mention of the entity class, every noun is taken
//! as an attribute name and the QA model is asked for its value within the
//! message.  The scan then skips the tokens covered by the answer.
//!
//! The answer text is located by its first occurrence in the message, which
//! may be missing or lie before the noun.  Its span is measured in
//! characters, the unit of [`Token::start`].  [`TokenCursor::advance_past`]
//! therefore always moves beyond the noun just consumed, so the scan ends
//! after at most one QA call per token.

use tracing::debug;

use crate::engine::{AttributePair, CommandEngine};
use crate::error::Result;
use crate::types::{Token, pos};

/// Forward-only scan position over a token sequence.
#[derive(Debug)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token], pos: usize) -> Self {
        Self { tokens, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to the next token tagged `tag` (possibly the current one) and
    /// return its index.  `None` once the tokens are exhausted.
    pub fn seek(&mut self, tag: &str) -> Option<usize> {
        while self.pos < self.tokens.len() && !self.tokens[self.pos].is(tag) {
            self.pos += 1;
        }
        (self.pos < self.tokens.len()).then_some(self.pos)
    }

    /// Skip every token starting before `span_end`, and in any case move past
    /// the token at `consumed`.
    pub fn advance_past(&mut self, consumed: usize, span_end: Option<usize>) {
        if let Some(end) = span_end {
            while self.pos < self.tokens.len() && self.tokens[self.pos].start < end {
                self.pos += 1;
            }
        }
        self.pos = self.pos.max(consumed + 1);
    }
}

/// Pair up a flat `[name, value, name, value, ...]` list.
///
/// A trailing unpaired name is dropped.
pub fn attribute_pairs(flat: &[String]) -> Vec<AttributePair> {
    flat.chunks_exact(2)
        .map(|pair| AttributePair {
            name: pair[0].clone(),
            value: pair[1].clone(),
        })
        .collect()
}

/// Character offset just past the first occurrence of `answer` in `msg`.
fn answer_span_end(msg: &str, answer: &str) -> Option<usize> {
    msg.find(answer)
        .map(|byte_start| msg[..byte_start].chars().count() + answer.chars().count())
}

impl CommandEngine {
    /// Extract the attributes of `entity_class` mentioned in `msg`.
    ///
    /// Returns a flat list alternating attribute name and value, in message
    /// order.  Empty when the class is not mentioned.
    pub async fn attributes_from_msg(&mut self, msg: &str, entity_class: &str) -> Result<Vec<String>> {
        let tokens = self.pos_tag_msg(msg).await?;
        self.attributes_from_tokens(msg, &tokens, entity_class).await
    }

    pub(crate) async fn attributes_from_tokens(
        &mut self,
        msg: &str,
        tokens: &[Token],
        entity_class: &str,
    ) -> Result<Vec<String>> {
        let synonyms = self.cache.synonyms(entity_class);
        let Some(mention) = tokens.iter().position(|t| synonyms.contains(&t.word)) else {
            debug!(entity_class, "entity class not mentioned, no attributes");
            return Ok(Vec::new());
        };

        let qa = self.question_answerer()?;
        let mut cursor = TokenCursor::new(tokens, mention + 1);
        let mut attributes = Vec::new();

        while let Some(noun) = cursor.seek(pos::NOUN) {
            let name = tokens[noun].word.clone();
            let question = format!("What is the {name} of the {entity_class}?");
            let value = qa.answer(&question, msg).await?.answer;

            cursor.advance_past(noun, answer_span_end(msg, &value));
            debug!(name = %name, value = %value, next = cursor.position(), "attribute extracted");

            attributes.push(name);
            attributes.push(value);
        }

        Ok(attributes)
    }
}
