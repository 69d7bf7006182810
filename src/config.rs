//! Engine configuration, persisted as TOML.
//!
//! Every field has a serde default, so a config file only needs to name the
//! settings it overrides. An empty file yields [`ConcordConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration for extraction and ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordConfig {
    /// Candidate text column names, checked in order. First match wins.
    #[serde(default = "default_text_columns")]
    pub text_columns: Vec<String>,
    /// Whole-word triggers (matched case-insensitively) for the definition rule.
    #[serde(default = "default_trigger_words")]
    pub trigger_words: Vec<String>,
    /// Number of leading sentence characters kept in a `DEF_` key.
    ///
    /// Distinct sentences sharing this prefix collide under one key.
    #[serde(default = "default_definition_key_chars")]
    pub definition_key_chars: usize,
    /// Limits for the expression normalizer.
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

/// Bounds on the work the normalizer may do for one expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Maximum equality-saturation iterations.
    #[serde(default = "default_iter_limit")]
    pub iter_limit: usize,
    /// Maximum e-graph nodes before saturation stops.
    #[serde(default = "default_node_limit")]
    pub node_limit: usize,
    /// Maximum number of terms while expanding into polynomial form.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

fn default_text_columns() -> Vec<String> {
    vec!["fact".into(), "Fact".into(), "text".into()]
}
fn default_trigger_words() -> Vec<String> {
    ["define", "definition", "means", "implies", "denote"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_definition_key_chars() -> usize {
    30
}
fn default_iter_limit() -> usize {
    8
}
fn default_node_limit() -> usize {
    10_000
}
fn default_max_terms() -> usize {
    256
}

impl Default for ConcordConfig {
    fn default() -> Self {
        Self {
            text_columns: default_text_columns(),
            trigger_words: default_trigger_words(),
            definition_key_chars: default_definition_key_chars(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            iter_limit: default_iter_limit(),
            node_limit: default_node_limit(),
            max_terms: default_max_terms(),
        }
    }
}

impl ConcordConfig {
    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.text_columns.is_empty() {
            return Err(ConfigError::Invalid {
                message: "text_columns must name at least one column".into(),
            });
        }
        if self.definition_key_chars == 0 {
            return Err(ConfigError::Invalid {
                message: "definition_key_chars must be > 0".into(),
            });
        }
        if self.normalizer.max_terms == 0 {
            return Err(ConfigError::Invalid {
                message: "normalizer.max_terms must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML string. `origin` labels errors.
    pub fn from_toml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<memory>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_columns() {
        let config = ConcordConfig::default();
        assert_eq!(config.text_columns, vec!["fact", "Fact", "text"]);
        assert_eq!(config.definition_key_chars, 30);
        assert_eq!(config.trigger_words.len(), 5);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ConcordConfig::from_toml_str("", "inline").unwrap();
        assert_eq!(config, ConcordConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let toml = r#"
            text_columns = ["body", "text"]

            [normalizer]
            max_terms = 32
        "#;
        let config = ConcordConfig::from_toml_str(toml, "inline").unwrap();
        assert_eq!(config.text_columns, vec!["body", "text"]);
        assert_eq!(config.normalizer.max_terms, 32);
        assert_eq!(config.normalizer.iter_limit, 8);
        assert_eq!(config.definition_key_chars, 30);
    }

    #[test]
    fn empty_text_columns_rejected() {
        let err = ConcordConfig::from_toml_str("text_columns = []", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ConcordConfig::from_toml_str("text_columns = [", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("concord.toml");
        let mut config = ConcordConfig::default();
        config.definition_key_chars = 40;
        config.save(&path).unwrap();

        let loaded = ConcordConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ConcordConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
