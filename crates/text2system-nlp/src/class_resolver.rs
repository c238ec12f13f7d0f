//! Entity-class resolution.
//!
//! The QA model is asked which class the command refers to, over a context
//! that restates the message and its intent.  When the tags point at a single
//! noun right after the verb, that noun is offered as a hint; when the hint is
//! similar to a known class, the context simply asserts that class.

use tracing::debug;

use crate::engine::CommandEngine;
use crate::error::Result;
use crate::types::{Token, pos};

/// Question put to the QA model.
pub const CLASS_QUESTION: &str = "What is the entity class that the user command refers to?";

/// The first noun after the first verb that is not a known attribute name.
///
/// Messages without a verb have no candidate.
pub fn class_candidate<'a>(tokens: &'a [Token], attributes: &[String]) -> Option<&'a Token> {
    let verb = tokens.iter().position(|t| t.is(pos::VERB))?;
    tokens[verb + 1..]
        .iter()
        .find(|t| t.is(pos::NOUN) && !attributes.contains(&t.word))
}

impl CommandEngine {
    /// Resolve the class `msg` targets, given the name of its intent.
    ///
    /// Returns `None` when the model answers with the intent itself: the user
    /// most likely left the class out and should be asked for it.
    pub async fn entity_class_from_msg(&mut self, msg: &str, intent_name: &str) -> Result<Option<String>> {
        let tokens = self.pos_tag_msg(msg).await?;
        self.entity_class_from_tokens(msg, &tokens, intent_name).await
    }

    pub(crate) async fn entity_class_from_tokens(
        &mut self,
        msg: &str,
        tokens: &[Token],
        intent_name: &str,
    ) -> Result<Option<String>> {
        let context = self.entity_class_context(msg, tokens, intent_name).await?;
        let qa = self.question_answerer()?;
        let answer = qa.answer(CLASS_QUESTION, &context).await?.answer;

        if let Some(canonical) = self.cache.canonical(&answer) {
            debug!(answer = %answer, canonical, "entity class resolved from cache");
            return Ok(Some(canonical.to_string()));
        }
        if answer == intent_name {
            debug!(intent = intent_name, "entity class answer is the intent, class missing");
            return Ok(None);
        }

        debug!(answer = %answer, "entity class resolved");
        Ok(Some(answer))
    }

    /// Build the disambiguation context for the QA model.
    pub async fn entity_class_context(
        &mut self,
        msg: &str,
        tokens: &[Token],
        intent_name: &str,
    ) -> Result<String> {
        let mut context = format!(
            "This is the user command: {msg}. \nThe intent of the user command is {intent_name}. "
        );

        let attributes = self.domain.all_attributes();
        if let Some(candidate) = class_candidate(tokens, &attributes) {
            context.push_str(&format!(
                "\nPerhaps the entity class may be this: {}. ",
                candidate.word
            ));

            for class in self.domain.classes() {
                if self.texts_are_similar(&class.name, &candidate.word).await? {
                    context = format!("The entity class is definitely this: {}", class.name);
                    break;
                }
            }
        }

        debug!(context = %context, "entity class context");
        Ok(context)
    }
}
