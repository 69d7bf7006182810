//! Fact extraction: turn a block of free text into candidate key/value facts.
//!
//! Four independent rules run over the same text, in order:
//!
//! 1. **Equations**: `left = right`, both sides normalized
//! 2. **Copula**: `X is Y` → `FACT_X`
//! 3. **Quantity**: `X has|contains N` → `X_has` / `X_contains`
//! 4. **Definitions**: sentences with a trigger word → `DEF_<prefix>`
//!
//! Their outputs are merged into one ordered mapping. A later rule only
//! replaces an earlier value when the key strings are identical; the key
//! keeps its first position.

pub mod rules;
pub mod sentence;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ConcordConfig;
use crate::normalize::Normalizer;

/// Extracted facts, in discovery order.
pub type Facts = IndexMap<String, String>;

/// Key prefix of copula (attribute) facts.
pub const ATTRIBUTE_PREFIX: &str = "FACT_";
/// Key prefix of definition facts.
pub const DEFINITION_PREFIX: &str = "DEF_";

/// Which rule family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactFamily {
    Equation,
    Attribute,
    Quantity,
    Definition,
}

impl FactFamily {
    /// Classify a key by its shape.
    ///
    /// Keys are plain strings, so an equation whose left side happens to
    /// look like `word_has` classifies as a quantity. Only used for display.
    pub fn of_key(key: &str) -> Self {
        if key.starts_with(ATTRIBUTE_PREFIX) {
            Self::Attribute
        } else if key.starts_with(DEFINITION_PREFIX) {
            Self::Definition
        } else if key.ends_with("_has") || key.ends_with("_contains") {
            Self::Quantity
        } else {
            Self::Equation
        }
    }
}

impl std::fmt::Display for FactFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equation => write!(f, "equation"),
            Self::Attribute => write!(f, "attribute"),
            Self::Quantity => write!(f, "quantity"),
            Self::Definition => write!(f, "definition"),
        }
    }
}

/// Human-friendly rendering of a key: family prefix stripped, underscores
/// replaced with spaces.
pub fn readable_key(key: &str) -> String {
    let stripped = key
        .strip_prefix(ATTRIBUTE_PREFIX)
        .or_else(|| key.strip_prefix(DEFINITION_PREFIX))
        .unwrap_or(key);
    stripped.replace('_', " ").trim().to_string()
}

/// Configured fact extractor.
pub struct Extractor {
    normalizer: Normalizer,
    triggers: HashSet<String>,
    definition_key_chars: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ConcordConfig::default())
    }
}

impl Extractor {
    pub fn new(config: &ConcordConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            triggers: config
                .trigger_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            definition_key_chars: config.definition_key_chars,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Apply all four rules to `text` and merge their results.
    pub fn extract(&self, text: &str) -> Facts {
        let mut facts = rules::equation_facts(text, &self.normalizer);
        facts.extend(rules::copula_facts(text));
        facts.extend(rules::quantity_facts(text));
        facts.extend(rules::definition_facts(
            text,
            &self.triggers,
            self.definition_key_chars,
        ));
        facts
    }
}

/// Extract with the default configuration.
pub fn extract(text: &str) -> Facts {
    Extractor::default().extract(text)
}
