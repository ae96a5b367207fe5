//! Recorded-interaction interchange format
//!
//! The request-execution driver (out of scope here) captures every
//! generated `(case, response)` pair as one JSON object per line. This
//! module defines those types, reads JSONL logs, and exports a JSON Schema
//! for the format so drivers in other languages can validate their output.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{BodyError, ResponseView, header_lookup};

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("{0}:{1}: invalid interaction record: {2}")]
    Record(PathBuf, usize, String),
}

/// A test case as recorded by the driver.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordedCase {
    /// HTTP method, uppercase
    pub method: String,
    /// Operation path template, e.g. "/users/{user_id}"
    pub path: String,
    /// Case ID for reproduction
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_parameters: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl RecordedCase {
    /// Operation label: "GET /users"
    #[must_use]
    pub fn operation(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A response as recorded by the driver, body already parsed to JSON.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordedResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Pre-parsed body; a non-JSON body is recorded as a JSON string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed: f64,
}

impl ResponseView for RecordedResponse {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    fn json_body(&self) -> Result<Value, BodyError> {
        self.body.clone().ok_or(BodyError::Empty)
    }
}

/// One captured interaction: the generated case and its response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordedInteraction {
    pub case: RecordedCase,
    pub response: RecordedResponse,
}

/// Read a JSONL interaction log. Blank lines are skipped; a malformed line
/// is an error carrying its line number.
///
/// # Errors
///
/// Returns error if the file cannot be opened or a line fails to parse.
pub fn read_jsonl(path: &Path) -> Result<Vec<RecordedInteraction>, InterchangeError> {
    let file = std::fs::File::open(path)
        .map_err(|e| InterchangeError::Io(path.to_path_buf(), e.to_string()))?;
    let reader = std::io::BufReader::new(file);

    let mut interactions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| InterchangeError::Io(path.to_path_buf(), e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let interaction = serde_json::from_str(&line)
            .map_err(|e| InterchangeError::Record(path.to_path_buf(), index + 1, e.to_string()))?;
        interactions.push(interaction);
    }
    Ok(interactions)
}

/// Generate the JSON Schema for the interchange format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RecordedInteraction);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
