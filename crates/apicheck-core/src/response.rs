//! Response views — one narrow interface over two transports
//!
//! Checks never see a concrete client type. They get `&dyn ResponseView`:
//! integer status, case-insensitive header lookup, and a fallible JSON body
//! accessor. `HttpResponse` adapts a network client capture (body kept as
//! text, parsed on demand); the recorded-interaction adapter lives in
//! [`crate::interchange`] and carries a pre-parsed body.

use std::collections::HashMap;

use serde_json::Value;

/// Why a JSON body could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("response has no body")]
    Empty,
    #[error("response body is not valid JSON: {0}")]
    Parse(String),
}

/// Read-only view of a captured HTTP response.
pub trait ResponseView {
    fn status_code(&self) -> u16;

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str>;

    /// Parse (or fetch the pre-parsed) response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `BodyError` when the body is absent or not valid JSON.
    fn json_body(&self) -> Result<Value, BodyError>;
}

/// Case-insensitive lookup into a plain header map.
pub(crate) fn header_lookup<'a>(
    headers: &'a HashMap<String, String>,
    name: &str,
) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A response captured from a network client, body held as text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Capture a blocking `reqwest` response, consuming it.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be read. Headers with non-UTF-8
    /// values are skipped.
    pub fn from_blocking(response: reqwest::blocking::Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text()?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Raw body text as received.
    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.body
    }
}

impl ResponseView for HttpResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    fn json_body(&self) -> Result<Value, BodyError> {
        if self.body.trim().is_empty() {
            return Err(BodyError::Empty);
        }
        serde_json::from_str(&self.body).map_err(|e| BodyError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(headers: &[(&str, &str)], body: &str) -> HttpResponse {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HttpResponse::new(200, headers, body)
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = response_with(&[("Content-Type", "application/json")], "{}");

        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn json_body_parses_on_demand() {
        let response = response_with(&[], r#"{"id": 1}"#);
        assert_eq!(response.json_body().unwrap()["id"], 1);
    }

    #[test]
    fn json_body_empty() {
        let response = response_with(&[], "  ");
        assert_eq!(response.json_body().unwrap_err(), BodyError::Empty);
    }

    #[test]
    fn json_body_invalid() {
        let response = response_with(&[], "<html>oops</html>");
        assert!(matches!(
            response.json_body().unwrap_err(),
            BodyError::Parse(_)
        ));
    }
}
