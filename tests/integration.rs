//! End-to-end integration tests for concord.
//!
//! These tests exercise the full pipeline from CSV files on disk through
//! extraction, merging and export, validating that documents, the store
//! and the conflict log all work together.

use std::path::{Path, PathBuf};

use concord::config::ConcordConfig;
use concord::document::Document;
use concord::export::{self, RecordKind};
use concord::ingest::Ingestor;
use concord::normalize::normalize;
use concord::store::KnowledgeBase;

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn load(paths: &[PathBuf]) -> Vec<Document> {
    paths
        .iter()
        .map(|p| Document::from_csv_path(p).unwrap())
        .collect()
}

#[test]
fn end_to_end_conflict_between_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = write_csv(
        dir.path(),
        "doc1.csv",
        "id,fact\n1,The sky is blue.\n2,basket has 5\n3,x + 1 = 2\n",
    );
    let b = write_csv(
        dir.path(),
        "doc2.csv",
        "id,fact\n1,The sky is green.\n2,basket has 5\n3,1 + x = 2\n",
    );

    let docs = load(&[a, b]);
    let mut kb = KnowledgeBase::new();
    let report = Ingestor::default().run_batch(&mut kb, &docs);

    // Commutative restatement and identical quantity do not conflict.
    assert_eq!(kb.conflict_log().len(), 1);
    assert!(report.has_conflicts());

    let c = kb.conflict("FACT_sky").unwrap();
    assert_eq!(c.stored, "blue");
    assert_eq!(c.new, "green");
    assert_eq!(c.document, "doc2.csv");
    assert_eq!(c.stored_sentence, "The sky is blue.");
    assert_eq!(c.new_sentence, "The sky is green.");

    assert_eq!(kb.get(&normalize("x + 1")).unwrap().value, "2");
    assert_eq!(kb.get("basket_has").unwrap().value, "5");
}

#[test]
fn three_documents_keep_first_value_and_last_conflict() {
    let mut docs = Vec::new();
    for (name, value) in [("a.csv", "A"), ("b.csv", "B"), ("c.csv", "C")] {
        let mut d = Document::new(name, vec!["text".into()]);
        d.push_row([("text", format!("K is {value}"))]);
        docs.push(d);
    }

    let mut kb = KnowledgeBase::new();
    Ingestor::default().run_batch(&mut kb, &docs);

    assert_eq!(kb.get("FACT_K").unwrap().value, "A");
    assert_eq!(kb.conflict_log().len(), 1);
    let c = kb.conflict("FACT_K").unwrap();
    assert_eq!((c.stored.as_str(), c.new.as_str()), ("A", "C"));
    assert_eq!(c.document, "c.csv");
}

#[test]
fn document_without_text_column_is_reported_not_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let bad = write_csv(dir.path(), "bad.csv", "title,body\nhello,sky is red\n");
    let good = write_csv(dir.path(), "good.csv", "Fact\nsky is blue\n");

    let docs = load(&[bad, good]);
    let mut kb = KnowledgeBase::new();
    let report = Ingestor::default().run_batch(&mut kb, &docs);

    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].document, "bad.csv");
    assert_eq!(skipped[0].columns, vec!["title", "body"]);

    assert_eq!(kb.len(), 1);
    assert!(!kb.has_conflicts());
}

#[test]
fn new_batch_replaces_previous_state() {
    let ingestor = Ingestor::default();
    let mut kb = KnowledgeBase::new();

    let mut first = Document::new("one.csv", vec!["fact".into()]);
    first.push_row([("fact", "sky is blue")]);
    let mut second = Document::new("two.csv", vec!["fact".into()]);
    second.push_row([("fact", "sky is green")]);

    ingestor.run_batch(&mut kb, &[first, second.clone()]);
    assert!(kb.has_conflicts());

    // A fresh batch sees green first and keeps nothing from the last run.
    ingestor.run_batch(&mut kb, &[second]);
    assert_eq!(kb.get("FACT_sky").unwrap().value, "green");
    assert!(!kb.has_conflicts());
    assert_eq!(kb.len(), 1);
}

#[test]
fn custom_text_columns_from_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join("concord.toml");
    std::fs::write(&config_path, "text_columns = [\"statement\"]\n").unwrap();
    let config = ConcordConfig::load(&config_path).unwrap();

    let csv = write_csv(dir.path(), "s.csv", "statement,fact\nsky is blue,sky is red\n");
    let docs = load(&[csv]);

    let mut kb = KnowledgeBase::new();
    Ingestor::new(&config).run_batch(&mut kb, &docs);
    assert_eq!(kb.get("FACT_sky").unwrap().value, "blue");
}

#[test]
fn export_records_follow_store_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = write_csv(dir.path(), "a.csv", "fact\n\"Water is wet, and box has 3\"\n");
    let b = write_csv(dir.path(), "b.csv", "fact\nbox has 4\n");

    let mut kb = KnowledgeBase::new();
    Ingestor::default().run_batch(&mut kb, &load(&[a, b]));

    let records = export::retrieval_records(&kb);
    let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents[0], "FACT_Water = wet");
    assert_eq!(contents[1], "box_has = 3");
    assert_eq!(records.last().unwrap().kind, RecordKind::Conflict);
    assert_eq!(
        contents[2],
        "The document 'b.csv' contains a conflict about 'box has': one source states: \
         'Water is wet, and box has 3', while another states: 'box has 4'."
    );

    let json = export::to_json(&kb).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["facts"].as_array().unwrap().len(), 2);
    assert_eq!(value["conflicts"][0]["document"], "b.csv");
}

#[test]
fn equivalent_fractions_and_decimal_definitions_agree_across_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = write_csv(
        dir.path(),
        "doc1.csv",
        "fact\ny = 1/x + 1/x\nPi means approximately 3.14 in this text.\n",
    );
    let b = write_csv(
        dir.path(),
        "doc2.csv",
        "fact\ny = 2/x\nPi means approximately 3.14 in this text.\n",
    );

    let mut kb = KnowledgeBase::new();
    let report = Ingestor::default().run_files(&mut kb, &[a, b]).unwrap();

    assert!(!report.has_conflicts());
    assert_eq!(kb.get("y").unwrap().value, "2/x");
    let definition = kb.get("DEF_Pi means approximately 3.14 in").unwrap();
    assert_eq!(definition.value, "Pi means approximately 3.14 in this text.");
}
