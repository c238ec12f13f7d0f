//! Synonym / similarity cache.
//!
//! Maps alternative surface strings to the canonical name of a domain class
//! or attribute.  Entries come from two places only: explicit synonym
//! registration and successful embedding-similarity tests performed by
//! [`crate::CommandEngine::texts_are_similar`].  Nothing is ever removed, so
//! every confirmed pair becomes a constant-time lookup for later messages.

use std::collections::BTreeMap;

/// Alternative name → canonical name.  Keys are case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct SimilarityCache {
    entries: BTreeMap<String, String>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `alternative` as another name for `canonical`.
    pub fn insert(&mut self, alternative: impl Into<String>, canonical: impl Into<String>) {
        let alternative = alternative.into();
        let canonical = canonical.into();
        tracing::debug!(alternative = %alternative, canonical = %canonical, "synonym cached");
        self.entries.insert(alternative, canonical);
    }

    /// Register every word in `alternatives` as a synonym of `canonical`.
    pub fn add_custom_synonyms<I, S>(&mut self, canonical: &str, alternatives: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alternative in alternatives {
            self.insert(alternative, canonical);
        }
    }

    /// Canonical name registered for `alternative`, if any.
    pub fn canonical(&self, alternative: &str) -> Option<&str> {
        self.entries.get(alternative).map(String::as_str)
    }

    pub fn contains(&self, alternative: &str) -> bool {
        self.entries.contains_key(alternative)
    }

    /// `name` followed by every alternative currently mapping to it.
    pub fn synonyms(&self, name: &str) -> Vec<String> {
        std::iter::once(name.to_string())
            .chain(
                self.entries
                    .iter()
                    .filter(|(_, canonical)| canonical.as_str() == name)
                    .map(|(alternative, _)| alternative.clone()),
            )
            .collect()
    }

    /// Whether either string is registered as an alternative of the other.
    pub fn related(&self, a: &str, b: &str) -> bool {
        self.canonical(b) == Some(a) || self.canonical(a) == Some(b)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cosine similarity of two embedding vectors.
///
/// Mismatched lengths and zero vectors score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
