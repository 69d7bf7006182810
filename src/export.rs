//! Export types for serializing knowledge-base state.
//!
//! Facts and conflicts are flattened into [`RetrievalRecord`]s, the unit a
//! downstream retrieval index consumes. A [`Snapshot`] bundles the raw
//! store contents with those records for JSON export.

use serde::{Deserialize, Serialize};

use crate::store::{ConflictRecord, KnowledgeBase};

/// What a retrieval record was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Fact,
    Conflict,
}

/// One indexable text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub kind: RecordKind,
    pub content: String,
}

/// Exported fact with its provenance sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactExport {
    pub key: String,
    pub value: String,
    pub source_sentence: String,
}

/// Serializable view of a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub facts: Vec<FactExport>,
    pub conflicts: Vec<ConflictRecord>,
    pub records: Vec<RetrievalRecord>,
}

impl Snapshot {
    pub fn of(kb: &KnowledgeBase) -> Self {
        Self {
            facts: kb
                .facts()
                .map(|(key, value, source)| FactExport {
                    key: key.to_string(),
                    value: value.to_string(),
                    source_sentence: source.to_string(),
                })
                .collect(),
            conflicts: kb.conflicts().cloned().collect(),
            records: retrieval_records(kb),
        }
    }
}

/// `"<key> = <value>"` per stored fact, in store order.
pub fn fact_records(kb: &KnowledgeBase) -> Vec<RetrievalRecord> {
    kb.facts()
        .map(|(key, value, _)| RetrievalRecord {
            kind: RecordKind::Fact,
            content: format!("{key} = {value}"),
        })
        .collect()
}

/// Narrative record per live conflict.
pub fn conflict_records(kb: &KnowledgeBase) -> Vec<RetrievalRecord> {
    kb.conflicts()
        .map(|c| RetrievalRecord {
            kind: RecordKind::Conflict,
            content: c.narrative(),
        })
        .collect()
}

/// Fact records followed by conflict records.
pub fn retrieval_records(kb: &KnowledgeBase) -> Vec<RetrievalRecord> {
    let mut records = fact_records(kb);
    records.extend(conflict_records(kb));
    records
}

/// Pretty-printed JSON [`Snapshot`] of `kb`.
pub fn to_json(kb: &KnowledgeBase) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Snapshot::of(kb))
}
