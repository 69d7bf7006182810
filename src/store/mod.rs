//! Knowledge base store: accumulated facts plus their conflict log.
//!
//! Merge semantics are first-write-wins. A key's first value is kept for the
//! whole batch; a later, different value from any document is logged as a
//! [`ConflictRecord`] and never replaces the stored one. Restating the same
//! value is a no-op.

pub mod conflict;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use conflict::{ConflictLog, ConflictRecord};

/// A stored fact and the text unit it was first seen in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbEntry {
    pub value: String,
    pub source_sentence: String,
}

/// What one [`KnowledgeBase::merge`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Keys seen for the first time.
    pub inserted: usize,
    /// Keys restated with the value already stored.
    pub restated: usize,
    /// Keys whose value disagreed with the store.
    pub conflicts: usize,
}

impl MergeOutcome {
    /// Add another merge's counts into this one.
    pub fn absorb(&mut self, other: MergeOutcome) {
        self.inserted += other.inserted;
        self.restated += other.restated;
        self.conflicts += other.conflicts;
    }
}

/// Batch-scoped fact store.
///
/// Owned by the caller and passed by `&mut` into ingestion, so a batch has
/// exclusive access for its duration. [`reset`](Self::reset) starts a new
/// batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    entries: IndexMap<String, KbEntry>,
    conflicts: ConflictLog,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all facts and conflicts.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.conflicts.clear();
    }

    /// Merge the facts extracted from one text unit of `doc_name`.
    pub fn merge<'a, I>(&mut self, doc_name: &str, text: &str, extracted: I) -> MergeOutcome
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut outcome = MergeOutcome::default();

        for (key, new_value) in extracted {
            match self.entries.get(key) {
                None => {
                    tracing::debug!(document = doc_name, %key, value = %new_value, "new fact");
                    self.entries.insert(
                        key.clone(),
                        KbEntry {
                            value: new_value.clone(),
                            source_sentence: text.to_string(),
                        },
                    );
                    outcome.inserted += 1;
                }
                Some(entry) if entry.value == *new_value => {
                    outcome.restated += 1;
                }
                Some(entry) => {
                    tracing::warn!(
                        document = doc_name,
                        %key,
                        stored = %entry.value,
                        new = %new_value,
                        "conflicting fact"
                    );
                    let record = ConflictRecord {
                        document: doc_name.to_string(),
                        key: key.clone(),
                        stored: entry.value.clone(),
                        new: new_value.clone(),
                        stored_sentence: entry.source_sentence.clone(),
                        new_sentence: text.to_string(),
                    };
                    self.conflicts.record(record);
                    outcome.conflicts += 1;
                }
            }
        }

        outcome
    }

    pub fn get(&self, key: &str) -> Option<&KbEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored facts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored facts as `(key, value, source_sentence)`, in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str(), e.source_sentence.as_str()))
    }

    pub fn conflict_log(&self) -> &ConflictLog {
        &self.conflicts
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &ConflictRecord> {
        self.conflicts.iter()
    }

    pub fn conflict(&self, key: &str) -> Option<&ConflictRecord> {
        self.conflicts.get(key)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
