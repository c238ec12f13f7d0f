//! Domain model registry: the classes a command can target and their
//! attributes.
//!
//! The pipeline only reads from it.  [`StaticDomain`] is the configuration
//! backed implementation used by the CLI.

use serde::{Deserialize, Serialize};

/// A class of the domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainClass {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Alternative names seeded into the similarity cache.
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl DomainClass {
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only view of the known classes, in a stable order.
pub trait DomainRegistry: Send + Sync {
    fn classes(&self) -> Vec<DomainClass>;

    /// Every attribute name of every class.
    fn all_attributes(&self) -> Vec<String> {
        self.classes()
            .into_iter()
            .flat_map(|class| class.attributes)
            .collect()
    }
}

/// A fixed list of classes.
#[derive(Debug, Clone, Default)]
pub struct StaticDomain {
    classes: Vec<DomainClass>,
}

impl StaticDomain {
    pub fn new(classes: Vec<DomainClass>) -> Self {
        Self { classes }
    }
}

impl DomainRegistry for StaticDomain {
    fn classes(&self) -> Vec<DomainClass> {
        self.classes.clone()
    }
}
