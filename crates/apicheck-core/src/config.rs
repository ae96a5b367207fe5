//! Project configuration for response auditing

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API schema: local file path or http(s) URL
    pub schema: String,

    /// JSONL interaction log to audit
    pub interactions: PathBuf,

    /// Checks to run, by registry name. Empty means the default set;
    /// the single entry "all" selects the full catalog.
    #[serde(default)]
    pub checks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: "openapi.yaml".to_string(),
            interactions: PathBuf::from(".apicheck/interactions.jsonl"),
            checks: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apicheck.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apicheck.toml", ".apicheck.json", "apicheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apicheck configuration

# API schema (local YAML/JSON file, or http(s) URL)
schema = "openapi.yaml"

# Recorded interactions to audit (one JSON object per line)
interactions = ".apicheck/interactions.jsonl"

# Checks to run. Omit for the default set, or list names:
# checks = ["not_a_server_error", "status_code_conformance"]
# checks = ["all"]
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
