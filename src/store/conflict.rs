//! Conflict log: one live record per disagreeing key.
//!
//! Conflicts are *reported*, not resolved. A record compares the value that
//! was stored first with the latest document that disagreed with it;
//! earlier disagreements for the same key are superseded in place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::extract::readable_key;

/// Two documents asserting different values for the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Name of the document whose assertion disagreed with the store.
    pub document: String,
    /// The contested fact key.
    pub key: String,
    /// The value already in the knowledge base.
    pub stored: String,
    /// The disagreeing value.
    pub new: String,
    /// Text unit the stored value came from.
    pub stored_sentence: String,
    /// Text unit the disagreeing value came from.
    pub new_sentence: String,
}

impl ConflictRecord {
    /// The key with its family prefix stripped and underscores spaced out.
    pub fn readable_key(&self) -> String {
        readable_key(&self.key)
    }

    /// One-line summary suitable for a warning list.
    pub fn summary(&self) -> String {
        format!(
            "{} conflict between stored '{}' and new '{}' from {}",
            self.key, self.stored, self.new, self.document
        )
    }

    /// Narrative form consumed by retrieval indexes.
    pub fn narrative(&self) -> String {
        format!(
            "The document '{}' contains a conflict about '{}': one source states: '{}', \
             while another states: '{}'.",
            self.document,
            self.readable_key(),
            self.stored_sentence,
            self.new_sentence
        )
    }
}

/// Conflict records keyed by fact key, in first-conflict order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictLog {
    records: IndexMap<String, ConflictRecord>,
}

impl ConflictLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or supersede the record for `record.key`.
    ///
    /// Returns the record it replaced, if any. A replaced key keeps its
    /// original position.
    pub fn record(&mut self, record: ConflictRecord) -> Option<ConflictRecord> {
        self.records.insert(record.key.clone(), record)
    }

    pub fn get(&self, key: &str) -> Option<&ConflictRecord> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConflictRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc: &str, key: &str, stored: &str, new: &str) -> ConflictRecord {
        ConflictRecord {
            document: doc.into(),
            key: key.into(),
            stored: stored.into(),
            new: new.into(),
            stored_sentence: format!("{key} was {stored}"),
            new_sentence: format!("{key} was {new}"),
        }
    }

    #[test]
    fn later_record_supersedes_in_place() {
        let mut log = ConflictLog::new();
        assert!(log.record(record("b.csv", "K", "A", "B")).is_none());
        log.record(record("z.csv", "Z", "1", "2"));
        let replaced = log.record(record("c.csv", "K", "A", "C")).unwrap();
        assert_eq!(replaced.document, "b.csv");

        assert_eq!(log.len(), 2);
        let first = log.iter().next().unwrap();
        assert_eq!(first.key, "K");
        assert_eq!(first.new, "C");
        assert_eq!(first.document, "c.csv");
    }

    #[test]
    fn narrative_uses_readable_key() {
        let r = ConflictRecord {
            document: "doc2.csv".into(),
            key: "FACT_sky".into(),
            stored: "blue".into(),
            new: "green".into(),
            stored_sentence: "The sky is blue".into(),
            new_sentence: "Our sky is green".into(),
        };
        assert_eq!(
            r.narrative(),
            "The document 'doc2.csv' contains a conflict about 'sky': one source states: \
             'The sky is blue', while another states: 'Our sky is green'."
        );
        assert_eq!(
            r.summary(),
            "FACT_sky conflict between stored 'blue' and new 'green' from doc2.csv"
        );
    }

    #[test]
    fn quantity_key_reads_as_words() {
        let r = record("d.csv", "basket_has", "5", "6");
        assert_eq!(r.readable_key(), "basket has");
    }
}
