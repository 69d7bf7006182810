//! Rich diagnostic error types for concord.
//!
//! The engine itself never fails on malformed input: unparseable expressions
//! fall back to trimmed text, documents without a text column are skipped
//! with a diagnostic, and conflicts are recorded rather than raised. The
//! errors below come from the edges of the system: loading documents and
//! reading configuration.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for concord.
///
/// Each variant wraps a subsystem-specific error, preserving its diagnostic
/// code and help text through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ConcordError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("failed to read document: {path}")]
    #[diagnostic(
        code(concord::document::read),
        help("Check that the file exists and is readable, and that it is UTF-8 encoded.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated quoted field in \"{name}\" starting on line {line}")]
    #[diagnostic(
        code(concord::document::unterminated_quote),
        help(
            "A field opened with a double quote never closed. Quotes inside \
             a quoted field must be doubled (\"\")."
        )
    )]
    UnterminatedQuote { name: String, line: usize },

    #[error("document \"{name}\" has no header row")]
    #[diagnostic(
        code(concord::document::no_header),
        help("The first non-empty line of a CSV document must name its columns.")
    )]
    NoHeader { name: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(concord::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(concord::config::parse),
        help("Check the TOML syntax. {message}")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(concord::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(concord::config::invalid),
        help("Check the ConcordConfig fields. {message}")
    )]
    Invalid { message: String },
}

/// Convenience alias for functions returning concord results.
pub type ConcordResult<T> = std::result::Result<T, ConcordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_converts_to_concord_error() {
        let err = DocumentError::NoHeader {
            name: "facts.csv".into(),
        };
        let top: ConcordError = err.into();
        assert!(matches!(
            top,
            ConcordError::Document(DocumentError::NoHeader { .. })
        ));
    }

    #[test]
    fn config_error_converts_to_concord_error() {
        let err = ConfigError::Invalid {
            message: "text_columns must not be empty".into(),
        };
        let top: ConcordError = err.into();
        assert!(matches!(top, ConcordError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = DocumentError::UnterminatedQuote {
            name: "doc.csv".into(),
            line: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("doc.csv"));
        assert!(msg.contains('4'));
    }
}
