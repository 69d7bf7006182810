//! Named documents: an ordered column list plus rows of cells.
//!
//! Documents are usually loaded from CSV. The reader is quote-aware: a
//! field wrapped in `"` may contain commas and newlines, and `""` inside it
//! is a literal quote. Blank lines are ignored. Rows shorter than the header
//! simply lack the trailing cells; extra cells beyond the header are dropped.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Result type for document loading.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// One row: column name to cell text.
pub type Row = IndexMap<String, String>;

/// A named table of text rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Document {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row given as `(column, cell)` pairs.
    pub fn push_row<K, V, I>(&mut self, cells: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.rows
            .push(cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Parse CSV content. The first record is the header.
    pub fn from_csv_str(name: impl Into<String>, content: &str) -> DocumentResult<Self> {
        let name = name.into();
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut records = parse_records(&name, content)?.into_iter();

        let columns: Vec<String> = match records.next() {
            Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(DocumentError::NoHeader { name }),
        };

        let mut doc = Document::new(name, columns);
        for record in records {
            let row: Row = doc
                .columns
                .iter()
                .cloned()
                .zip(record)
                .collect();
            doc.rows.push(row);
        }

        tracing::debug!(
            document = %doc.name,
            columns = doc.columns.len(),
            rows = doc.rows.len(),
            "loaded CSV document"
        );
        Ok(doc)
    }

    /// Read a CSV file. The document is named after the file name.
    pub fn from_csv_path(path: &Path) -> DocumentResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_csv_str(name, &content)
    }
}

/// Split CSV content into records of raw fields.
fn parse_records(name: &str, content: &str) -> DocumentResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                finish_record(&mut records, &mut record, &mut field);
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(DocumentError::UnterminatedQuote {
            name: name.to_string(),
            line: quote_line,
        });
    }
    finish_record(&mut records, &mut record, &mut field);

    Ok(records)
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    if record.is_empty() && field.trim().is_empty() {
        field.clear();
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let doc = Document::from_csv_str("a.csv", "id,fact\n1,sky is blue\n2,x = 1\n").unwrap();
        assert_eq!(doc.name, "a.csv");
        assert_eq!(doc.columns, vec!["id", "fact"]);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[0]["fact"], "sky is blue");
        assert_eq!(doc.rows[1]["id"], "2");
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let content = "fact\n\"a, b\"\n\"say \"\"hi\"\"\"\n\"two\nlines\"\n";
        let doc = Document::from_csv_str("q.csv", content).unwrap();
        let cells: Vec<&str> = doc.rows.iter().map(|r| r["fact"].as_str()).collect();
        assert_eq!(cells, vec!["a, b", "say \"hi\"", "two\nlines"]);
    }

    #[test]
    fn short_rows_lack_trailing_cells() {
        let doc = Document::from_csv_str("s.csv", "id,fact,text\n1\n2,x\n").unwrap();
        assert_eq!(doc.rows[0].len(), 1);
        assert!(!doc.rows[0].contains_key("fact"));
        assert_eq!(doc.rows[1]["fact"], "x");
    }

    #[test]
    fn bom_and_crlf_are_handled() {
        let doc = Document::from_csv_str("w.csv", "\u{feff}fact\r\nsky is blue\r\n\r\n").unwrap();
        assert_eq!(doc.columns, vec!["fact"]);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0]["fact"], "sky is blue");
    }

    #[test]
    fn empty_content_has_no_header() {
        let err = Document::from_csv_str("e.csv", "\n\n").unwrap_err();
        assert!(matches!(err, DocumentError::NoHeader { .. }));
    }

    #[test]
    fn unterminated_quote_reports_start_line() {
        let err = Document::from_csv_str("u.csv", "fact\nok\n\"never closed\n").unwrap_err();
        match err {
            DocumentError::UnterminatedQuote { name, line } => {
                assert_eq!(name, "u.csv");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_path_uses_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "text\nbasket has 5\n").unwrap();

        let doc = Document::from_csv_path(&path).unwrap();
        assert_eq!(doc.name, "notes.csv");
        assert_eq!(doc.rows[0]["text"], "basket has 5");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Document::from_csv_path(Path::new("/nonexistent/facts.csv")).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
    }

    #[test]
    fn programmatic_rows() {
        let mut doc = Document::new("mem", vec!["fact".into()]);
        doc.push_row([("fact", "Socrates is mortal")]);
        assert!(doc.has_column("fact"));
        assert!(!doc.has_column("text"));
        assert_eq!(doc.rows[0]["fact"], "Socrates is mortal");
    }
}
