// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # concord
//!
//! Fact extraction and cross-document conflict detection over
//! semi-structured text.
//!
//! ## Architecture
//!
//! - **Normalizer** (`normalize`): algebraic canonical forms via `egg` saturation
//!   and an exact rational polynomial normal form
//! - **Extractor** (`extract`): four regex and sentence rules producing key/value facts
//! - **Knowledge base** (`store`): first-write-wins fact store plus conflict log
//! - **Ingestion** (`ingest`): per-document text column resolution and batch runs
//! - **Documents** (`document`): quote-aware CSV loading
//! - **Export** (`export`): retrieval records and JSON snapshots
//!
//! ## Library usage
//!
//! ```no_run
//! use concord::config::ConcordConfig;
//! use concord::document::Document;
//! use concord::ingest::Ingestor;
//! use concord::store::KnowledgeBase;
//!
//! let mut a = Document::new("a.csv", vec!["fact".into()]);
//! a.push_row([("fact", "The sky is blue.")]);
//! let mut b = Document::new("b.csv", vec!["fact".into()]);
//! b.push_row([("fact", "The sky is green.")]);
//!
//! let ingestor = Ingestor::new(&ConcordConfig::default());
//! let mut kb = KnowledgeBase::new();
//! let report = ingestor.run_batch(&mut kb, &[a, b]);
//! assert!(report.has_conflicts());
//! for conflict in kb.conflicts() {
//!     println!("{}", conflict.summary());
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod normalize;
pub mod store;
