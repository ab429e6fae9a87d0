//! Pattern files.
//!
//! A pattern file lists the patterns to register, in order:
//!
//! ```yaml
//! patterns:
//!   - GET/api/v1/user
//!   - GET/api/*/info
//!   - VIEW/docs/**
//! ```
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use urltable::{Table, TableError};

/// Errors produced while loading a pattern file into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid YAML for a pattern file.
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    /// The file is not valid JSON for a pattern file.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    /// A pattern was rejected by the table.
    #[error("pattern #{index} '{pattern}': {source}")]
    Pattern {
        /// Zero-based position in the file.
        index: usize,
        pattern: String,
        source: TableError,
    },
}

/// Deserialized contents of a pattern file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternFile {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl PatternFile {
    /// Register every pattern in order. The first rejected pattern aborts the
    /// whole build.
    pub fn build(&self) -> Result<Table, LoadError> {
        let mut table = Table::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            table
                .append(pattern)
                .map_err(|source| LoadError::Pattern {
                    index,
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        Ok(table)
    }
}

/// Read and deserialize a pattern file.
pub fn load_patterns(path: &Path) -> Result<PatternFile, LoadError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: display,
            source,
        })
    } else {
        serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
            path: display,
            source,
        })
    }
}

/// Load a pattern file and build a fresh table from it.
pub fn build_table(path: &Path) -> Result<Table, LoadError> {
    let file = load_patterns(path)?;
    let table = file.build()?;

    urltable_telemetry::log_patterns_loaded!(
        path = %path.display(),
        declared = file.patterns.len(),
        size = table.size(),
        "pattern file loaded"
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_yaml_file() {
        let file = write_temp(
            ".yaml",
            "patterns:\n  - GET/api/v1/user\n  - GET/api/*/info\n",
        );
        let loaded = load_patterns(file.path()).unwrap();
        assert_eq!(loaded.patterns, vec!["GET/api/v1/user", "GET/api/*/info"]);
    }

    #[test]
    fn load_json_file() {
        let file = write_temp(".json", r#"{"patterns": ["POST/orders", "VIEW/docs/**"]}"#);
        let loaded = load_patterns(file.path()).unwrap();
        assert_eq!(loaded.patterns, vec!["POST/orders", "VIEW/docs/**"]);
    }

    #[test]
    fn missing_patterns_key_is_empty() {
        let file = write_temp(".yaml", "{}\n");
        let loaded = load_patterns(file.path()).unwrap();
        assert!(loaded.patterns.is_empty());
        assert!(loaded.build().unwrap().is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_temp(".yaml", "routes:\n  - GET/api\n");
        let err = load_patterns(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }), "got {:?}", err);
    }

    #[test]
    fn invalid_json_is_reported() {
        let file = write_temp(".json", "{ not json");
        let err = load_patterns(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }), "got {:?}", err);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_patterns(Path::new("does-not-exist.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("does-not-exist.yaml"));
    }

    #[test]
    fn build_names_the_rejected_pattern() {
        let file = PatternFile {
            patterns: vec![
                "GET/api/*/info".to_string(),
                "GET/api/**".to_string(),
            ],
        };
        let err = file.build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "pattern #1 'GET/api/**': conflict at GET/api"
        );
    }

    #[test]
    fn build_reports_validation_errors() {
        let file = PatternFile {
            patterns: vec!["GET/api//user".to_string()],
        };
        match file.build().unwrap_err() {
            LoadError::Pattern { index, source, .. } => {
                assert_eq!(index, 0);
                assert!(!source.is_conflict());
            }
            other => panic!("expected Pattern error, got {:?}", other),
        }
    }

    #[test]
    fn build_table_from_file() {
        let file = write_temp(
            ".yml",
            "patterns:\n  - GET/api/v1/user\n  - GET/api/v1/user\n  - GET/static/**\n",
        );
        let table = build_table(file.path()).unwrap();
        assert_eq!(table.size(), 2);
        assert_eq!(
            table.mapping("GET/static/js/app.js").unwrap().as_deref(),
            Some("GET/static/**")
        );
    }
}
