//! Document ingestion: rows of text into the knowledge base.
//!
//! Each document contributes one text column, chosen from the configured
//! candidates in priority order. Every non-empty cell of that column is
//! extracted and merged with the document name as provenance. Documents
//! without any candidate column are skipped with a [`SkipDiagnostic`];
//! they never abort a batch.

use std::path::Path;

use serde::Serialize;

use crate::config::ConcordConfig;
use crate::document::Document;
use crate::error::ConcordResult;
use crate::extract::Extractor;
use crate::store::{ConflictRecord, KnowledgeBase, MergeOutcome};

/// Why a document contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipDiagnostic {
    pub document: String,
    /// The columns the document did have.
    pub columns: Vec<String>,
    /// The columns that were looked for.
    pub expected: Vec<String>,
}

impl std::fmt::Display for SkipDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has no text column (expected one of: {}; found: {})",
            self.document,
            self.expected.join(", "),
            if self.columns.is_empty() {
                "none".to_string()
            } else {
                self.columns.join(", ")
            }
        )
    }
}

/// Counters for one ingested document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub document: String,
    pub text_column: String,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub facts_extracted: usize,
    pub new_facts: usize,
    /// Facts that repeated the value already stored.
    pub restated_facts: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    Ingested(IngestStats),
    Skipped(SkipDiagnostic),
}

impl IngestOutcome {
    pub fn stats(&self) -> Option<&IngestStats> {
        match self {
            Self::Ingested(stats) => Some(stats),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip(&self) -> Option<&SkipDiagnostic> {
        match self {
            Self::Skipped(diag) => Some(diag),
            Self::Ingested(_) => None,
        }
    }
}

/// Per-document outcomes of one batch, in ingestion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<IngestOutcome>,
}

impl BatchReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SkipDiagnostic> {
        self.outcomes.iter().filter_map(IngestOutcome::skip)
    }

    pub fn ingested(&self) -> impl Iterator<Item = &IngestStats> {
        self.outcomes.iter().filter_map(IngestOutcome::stats)
    }

    /// Conflict merges across the batch. A key that conflicts repeatedly
    /// counts each time; the store keeps only the latest record.
    pub fn conflict_events(&self) -> usize {
        self.ingested().map(|s| s.conflicts).sum()
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflict_events() > 0
    }
}

/// Drives extraction and merging for whole documents.
pub struct Ingestor {
    extractor: Extractor,
    text_columns: Vec<String>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(&ConcordConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: &ConcordConfig) -> Self {
        Self {
            extractor: Extractor::new(config),
            text_columns: config.text_columns.clone(),
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// First configured candidate that the document actually has.
    pub fn resolve_text_column<'a>(&'a self, doc: &Document) -> Option<&'a str> {
        self.text_columns
            .iter()
            .map(String::as_str)
            .find(|candidate| doc.has_column(candidate))
    }

    /// Ingest one document into `kb`.
    pub fn ingest(&self, kb: &mut KnowledgeBase, doc: &Document) -> IngestOutcome {
        let Some(column) = self.resolve_text_column(doc) else {
            let diag = SkipDiagnostic {
                document: doc.name.clone(),
                columns: doc.columns.clone(),
                expected: self.text_columns.clone(),
            };
            tracing::warn!(
                document = %doc.name,
                columns = ?doc.columns,
                "no text column, skipping document"
            );
            return IngestOutcome::Skipped(diag);
        };

        let mut stats = IngestStats {
            document: doc.name.clone(),
            text_column: column.to_string(),
            ..Default::default()
        };

        let mut merged = MergeOutcome::default();
        for row in &doc.rows {
            let text = match row.get(column) {
                Some(text) if !text.is_empty() => text,
                _ => {
                    stats.rows_skipped += 1;
                    continue;
                }
            };

            let facts = self.extractor.extract(text);
            merged.absorb(kb.merge(&doc.name, text, &facts));

            stats.rows_processed += 1;
            stats.facts_extracted += facts.len();
        }
        stats.new_facts = merged.inserted;
        stats.restated_facts = merged.restated;
        stats.conflicts = merged.conflicts;

        tracing::info!(
            document = %doc.name,
            column,
            rows = stats.rows_processed,
            skipped = stats.rows_skipped,
            facts = stats.facts_extracted,
            new = stats.new_facts,
            restated = stats.restated_facts,
            conflicts = stats.conflicts,
            "ingested document"
        );

        IngestOutcome::Ingested(stats)
    }

    /// Reset `kb` and ingest `docs` strictly in order.
    pub fn run_batch(&self, kb: &mut KnowledgeBase, docs: &[Document]) -> BatchReport {
        kb.reset();

        let outcomes: Vec<IngestOutcome> = docs.iter().map(|doc| self.ingest(kb, doc)).collect();
        let report = BatchReport { outcomes };

        tracing::info!(
            documents = docs.len(),
            skipped = report.skipped().count(),
            facts = kb.len(),
            conflicts = kb.conflict_log().len(),
            "batch complete"
        );

        report
    }

    /// Load CSV files and run them as one batch, in the order given.
    ///
    /// Every file is read before `kb` is touched, so an unreadable or
    /// malformed file leaves the store as it was.
    pub fn run_files<P: AsRef<Path>>(
        &self,
        kb: &mut KnowledgeBase,
        paths: &[P],
    ) -> ConcordResult<BatchReport> {
        let docs = paths
            .iter()
            .map(|path| Document::from_csv_path(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.run_batch(kb, &docs))
    }
}

/// Conflict summary lines for display, one per live record.
pub fn conflict_summaries(kb: &KnowledgeBase) -> Vec<String> {
    kb.conflicts().map(ConflictRecord::summary).collect()
}
