//! Core vocabulary of the pipeline: intents, entity types, entities and
//! part-of-speech tokens.
//!
//! Names arriving from external models are mapped into the closed
//! enumerations through explicit `match` tables.  Anything outside the table
//! is a typed error, never a silent default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NlpError, Result};

/// Role marking an NLU entity as the *name* of a domain attribute.
pub const ATTRIBUTE_NAME_ROLE: &str = "attribute_name";

/// Part-of-speech tags the resolvers look at.
pub mod pos {
    pub const VERB: &str = "VERB";
    pub const NOUN: &str = "NOUN";
    pub const PUNCT: &str = "PUNCT";
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// The action a user message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Greeting,
    Goodbye,
    Help,
    Cancelation,
    Confirmation,
    Save,
    Delete,
    Read,
}

impl Intent {
    /// Every intent, in declaration order.  Rule matching iterates this.
    pub const ALL: [Intent; 8] = [
        Intent::Greeting,
        Intent::Goodbye,
        Intent::Help,
        Intent::Cancelation,
        Intent::Confirmation,
        Intent::Save,
        Intent::Delete,
        Intent::Read,
    ];

    /// Canonical lowercase label, as matched against message words and sent
    /// to the zero-shot classifier.
    pub fn label(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Goodbye => "goodbye",
            Self::Help => "help",
            Self::Cancelation => "cancelation",
            Self::Confirmation => "confirmation",
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Read => "read",
        }
    }

    /// Upper-case name, the form produced by upper-casing a label.
    pub fn name(self) -> &'static str {
        match self {
            Self::Greeting => "GREETING",
            Self::Goodbye => "GOODBYE",
            Self::Help => "HELP",
            Self::Cancelation => "CANCELATION",
            Self::Confirmation => "CONFIRMATION",
            Self::Save => "SAVE",
            Self::Delete => "DELETE",
            Self::Read => "READ",
        }
    }

    /// Map an upper-case name to an intent.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "GREETING" => Ok(Self::Greeting),
            "GOODBYE" => Ok(Self::Goodbye),
            "HELP" => Ok(Self::Help),
            "CANCELATION" => Ok(Self::Cancelation),
            "CONFIRMATION" => Ok(Self::Confirmation),
            "SAVE" => Ok(Self::Save),
            "DELETE" => Ok(Self::Delete),
            "READ" => Ok(Self::Read),
            other => Err(NlpError::UnknownIntent {
                name: other.to_string(),
            }),
        }
    }

    /// Whether this intent is one of the CRUD commands that target a class.
    pub fn is_crud(self) -> bool {
        matches!(self, Self::Save | Self::Delete | Self::Read)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// What a decoded NLU entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Attribute,
    Class,
    Contact,
    Email,
    Location,
}

impl EntityType {
    /// Map an upper-case entity name to an entity type.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "ATTRIBUTE" => Ok(Self::Attribute),
            "CLASS" => Ok(Self::Class),
            "CONTACT" => Ok(Self::Contact),
            "EMAIL" => Ok(Self::Email),
            "LOCATION" => Ok(Self::Location),
            other => Err(NlpError::UnknownEntityType {
                name: other.to_string(),
            }),
        }
    }
}

/// An entity reported by the NLU service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    /// Surface text.  Normalized when `role` is [`ATTRIBUTE_NAME_ROLE`].
    pub body: String,
    pub role: Option<String>,
    /// Character offset of the entity in the message.
    pub start: usize,
}

impl Entity {
    /// Create an entity, normalizing the body of attribute names.
    pub fn new(
        entity_type: EntityType,
        body: impl Into<String>,
        role: Option<String>,
        start: usize,
    ) -> Self {
        let mut body = body.into();
        if role.as_deref() == Some(ATTRIBUTE_NAME_ROLE) {
            body = normalize_attribute_name(&body);
        }
        Self {
            entity_type,
            body,
            role,
            start,
        }
    }
}

/// Lower-case, trim and replace inner spaces with underscores.
fn normalize_attribute_name(body: &str) -> String {
    body.to_lowercase().trim().replace(' ', "_")
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A part-of-speech tagged token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    /// POS label, e.g. `VERB`, `NOUN`, `PUNCT`.
    pub tag: String,
    /// Character (not byte) offset of the first character in the message.
    pub start: usize,
    /// Character offset just past the last character.
    pub end: usize,
    pub confidence: f32,
}

impl Token {
    pub fn new(
        word: impl Into<String>,
        tag: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f32,
    ) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
            start,
            end,
            confidence,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
