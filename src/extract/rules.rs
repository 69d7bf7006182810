//! The four independent extraction rules.
//!
//! Each rule is a pure function from text to an ordered fact mapping. Rules
//! know nothing about each other; [`super::Extractor`] merges their output.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::sentence::{char_prefix, contains_trigger, split_sentences};
use super::{ATTRIBUTE_PREFIX, DEFINITION_PREFIX, Facts};
use crate::normalize::Normalizer;

// ── Regex patterns ──────────────────────────────────────────────────────

/// `left = right` over identifier characters, whitespace and `^ * + / -`.
static RE_EQUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w\s^*+/\-]+)=([\w\s^*+/\-]+)").unwrap());

/// `subject is predicate`, single-token subject and predicate.
static RE_COPULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\b\w+\b) is (\b\w+\b)").unwrap());

/// `subject has|contains <integer>`.
static RE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\b\w+\b) (has|contains) (\d+)").unwrap());

// ── Rules ───────────────────────────────────────────────────────────────

/// Equations: key and value are the normalized left and right sides.
pub fn equation_facts(text: &str, normalizer: &Normalizer) -> Facts {
    let mut facts = Facts::new();
    for caps in RE_EQUATION.captures_iter(text) {
        let key = normalizer.normalize(&caps[1]);
        let value = normalizer.normalize(&caps[2]);
        tracing::debug!(%key, %value, "equation fact");
        facts.insert(key, value);
    }
    facts
}

/// Copula statements: `FACT_<subject>` → predicate.
pub fn copula_facts(text: &str) -> Facts {
    let mut facts = Facts::new();
    for caps in RE_COPULA.captures_iter(text) {
        let key = format!("{ATTRIBUTE_PREFIX}{}", caps[1].trim());
        let value = caps[2].trim().to_string();
        tracing::debug!(%key, %value, "copula fact");
        facts.insert(key, value);
    }
    facts
}

/// Quantity statements: `<subject>_<verb>` → the integer as written.
pub fn quantity_facts(text: &str) -> Facts {
    let mut facts = Facts::new();
    for caps in RE_QUANTITY.captures_iter(text) {
        let key = format!("{}_{}", caps[1].trim(), caps[2].trim());
        let value = caps[3].trim().to_string();
        tracing::debug!(%key, %value, "quantity fact");
        facts.insert(key, value);
    }
    facts
}

/// Definitional sentences: `DEF_<first key_chars chars>` → the sentence.
///
/// Distinct sentences with the same leading characters share a key; the
/// later one wins within a single call.
pub fn definition_facts(text: &str, triggers: &HashSet<String>, key_chars: usize) -> Facts {
    let mut facts = Facts::new();
    for sentence in split_sentences(text) {
        if !contains_trigger(&sentence, triggers) {
            continue;
        }
        let key = format!("{DEFINITION_PREFIX}{}", char_prefix(&sentence, key_chars));
        tracing::debug!(%key, "definition fact");
        facts.insert(key, sentence);
    }
    facts
}
