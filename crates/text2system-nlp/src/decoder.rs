//! Decoder for raw conversational-NLU responses.
//!
//! The NLU service answers with loosely typed intent and entity guesses.
//! [`DecodedMessage::decode`] keeps only the guesses whose confidence is
//! strictly above the configured threshold and maps their names into
//! [`Intent`] and [`EntityType`].  Names outside those enumerations are fatal:
//! they mean the service speaks a vocabulary this crate does not know.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::{Entity, EntityType, Intent};

/// Prefix the NLU service puts in front of its built-in names.
const BUILTIN_PREFIX: &str = "wit$";

// ---------------------------------------------------------------------------
// Raw response
// ---------------------------------------------------------------------------

/// Raw response of the NLU service's `message` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NluResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub intents: Vec<NluIntent>,
    /// Entities keyed by `"<name>:<role>"`, in the order the service lists them.
    #[serde(default, deserialize_with = "ordered_entities")]
    pub entities: Vec<(String, Vec<NluEntity>)>,
}

/// An intent guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluIntent {
    pub name: String,
    pub confidence: f64,
}

/// An entity guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluEntity {
    pub name: String,
    pub confidence: f64,
    pub body: String,
    #[serde(default)]
    pub role: Option<String>,
    pub start: usize,
}

/// Deserialize the `entities` object while keeping the key order of the
/// document, so ties on `start` resolve in discovery order.
fn ordered_entities<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, Vec<NluEntity>)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> serde::de::Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, Vec<NluEntity>)>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a map of entity lists")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, Vec<NluEntity>>()? {
                out.push((key, value));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

impl NluResponse {
    /// Parse a raw JSON response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

// ---------------------------------------------------------------------------
// Decoded message
// ---------------------------------------------------------------------------

/// Typed result of decoding one [`NluResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    intent: Option<Intent>,
    entities: Vec<Entity>,
}

impl DecodedMessage {
    /// Decode a response, dropping everything at or below `threshold`.
    pub fn decode(response: &NluResponse, threshold: f64) -> Result<Self> {
        let intent = match response.intents.first() {
            Some(top) if top.confidence > threshold => {
                Some(Intent::from_name(&builtin_name(&top.name))?)
            }
            _ => None,
        };

        let mut entities = Vec::new();
        for (_, reported) in &response.entities {
            for raw in reported.iter().filter(|e| e.confidence > threshold) {
                let entity_type = EntityType::from_name(&builtin_name(&raw.name))?;
                entities.push(Entity::new(
                    entity_type,
                    raw.body.clone(),
                    raw.role.clone(),
                    raw.start,
                ));
            }
        }
        // `sort_by_key` is stable: equal offsets keep discovery order.
        entities.sort_by_key(|e| e.start);

        debug!(
            intent = ?intent,
            entities = entities.len(),
            threshold,
            "nlu response decoded"
        );

        Ok(Self { intent, entities })
    }

    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    /// Entities ordered by their start offset.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    pub fn attribute_entities(&self) -> Vec<&Entity> {
        self.entities_by_type(EntityType::Attribute)
    }

    /// Entities grouped by type, each group still ordered by offset.
    pub fn entities_grouped(&self) -> BTreeMap<String, Vec<&Entity>> {
        let mut groups: BTreeMap<String, Vec<&Entity>> = BTreeMap::new();
        for entity in &self.entities {
            groups
                .entry(format!("{:?}", entity.entity_type).to_lowercase())
                .or_default()
                .push(entity);
        }
        groups
    }

    pub fn intent_is(&self, intent: Intent) -> bool {
        self.intent == Some(intent)
    }

    pub fn intent_is_greet(&self) -> bool {
        self.intent_is(Intent::Greeting)
    }

    pub fn intent_is_say_goodbye(&self) -> bool {
        self.intent_is(Intent::Goodbye)
    }
}

/// Strip the built-in prefix (any case) and upper-case the rest.
fn builtin_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let prefix = BUILTIN_PREFIX.to_uppercase();
    upper
        .strip_prefix(prefix.as_str())
        .unwrap_or(upper.as_str())
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
