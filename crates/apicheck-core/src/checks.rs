//! Response conformance checks
//!
//! Each check is a pure function over a `(response, case)` pair: returning
//! `Ok(())` means the contract holds, `Err(CheckFailure)` carries a
//! human-readable mismatch description. No I/O, no shared state, no
//! ordering dependency between checks — they can run concurrently across
//! independent pairs.
//!
//! Missing schema data (no declared responses, no `produces`, no response
//! schema) means "nothing to check" and passes; absence of a contract is
//! not a violation.

use serde_json::Value;

use crate::response::ResponseView;
use crate::schema::Case;

/// The single failure kind a check can signal: an assertion failure with a
/// descriptive message. Never retried or suppressed here; the caller
/// aggregates failures across checks and cases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CheckFailure(String);

impl CheckFailure {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

pub type CheckResult = Result<(), CheckFailure>;

/// Signature shared by every check.
pub type CheckFn = fn(&dyn ResponseView, &Case) -> CheckResult;

/// A named check, as discovered by the runner/CLI.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub name: &'static str,
    pub run: CheckFn,
}

/// Checks that run unless explicitly disabled.
pub const DEFAULT_CHECKS: &[Check] = &[Check {
    name: "not_a_server_error",
    run: not_a_server_error,
}];

/// Opt-in checks.
pub const OPTIONAL_CHECKS: &[Check] = &[
    Check {
        name: "status_code_conformance",
        run: status_code_conformance,
    },
    Check {
        name: "content_type_conformance",
        run: content_type_conformance,
    },
    Check {
        name: "response_schema_conformance",
        run: response_schema_conformance,
    },
];

/// Full catalog: `DEFAULT_CHECKS` followed by `OPTIONAL_CHECKS`, in order.
pub const ALL_CHECKS: &[Check] = &[
    Check {
        name: "not_a_server_error",
        run: not_a_server_error,
    },
    Check {
        name: "status_code_conformance",
        run: status_code_conformance,
    },
    Check {
        name: "content_type_conformance",
        run: content_type_conformance,
    },
    Check {
        name: "response_schema_conformance",
        run: response_schema_conformance,
    },
];

/// Look up a check in the catalog by its registered name.
#[must_use]
pub fn find_check(name: &str) -> Option<&'static Check> {
    ALL_CHECKS.iter().find(|check| check.name == name)
}

/// Fails on any 5xx (or higher) status code.
pub fn not_a_server_error(response: &dyn ResponseView, _case: &Case) -> CheckResult {
    let status = response.status_code();
    if status >= 500 {
        return Err(CheckFailure::new(format!(
            "Received a response with 5xx status code: {status}"
        )));
    }
    Ok(())
}

/// Fails when the status code is not among the declared response codes,
/// after wildcard expansion. A declared `"default"` matches everything.
pub fn status_code_conformance(response: &dyn ResponseView, case: &Case) -> CheckResult {
    let Some(responses) = case.endpoint().declared_responses() else {
        return Ok(());
    };
    if responses.is_empty() || responses.contains_key("default") {
        return Ok(());
    }
    let status = response.status_code();
    if responses
        .keys()
        .flat_map(|pattern| expand_status_pattern(pattern))
        .any(|allowed| allowed == status)
    {
        return Ok(());
    }
    let declared = responses.keys().cloned().collect::<Vec<_>>().join(", ");
    Err(CheckFailure::new(format!(
        "Received a response with a status code, which is not defined in the schema: {status}\n\n\
         Declared status codes: {declared}"
    )))
}

/// Expand a declared status-code pattern into the concrete codes it matches.
///
/// Each character position is either a literal digit or `X` (case
/// insensitive) meaning any digit; the match set is the Cartesian product
/// read left-to-right. `"4XX"` → 400..=499, `"20X"` → 200..=209,
/// `"404"` → {404}. Combinations that do not parse as a status code
/// (non-digit literals) are skipped.
#[must_use]
pub fn expand_status_pattern(pattern: &str) -> Vec<u16> {
    let mut prefixes = vec![String::new()];
    for ch in pattern.chars() {
        let choices: Vec<char> = if ch.eq_ignore_ascii_case(&'x') {
            ('0'..='9').collect()
        } else {
            vec![ch]
        };
        prefixes = prefixes
            .iter()
            .flat_map(|prefix| {
                choices.iter().map(move |digit| {
                    let mut next = prefix.clone();
                    next.push(*digit);
                    next
                })
            })
            .collect();
    }
    prefixes
        .into_iter()
        .filter_map(|code| code.parse().ok())
        .collect()
}

/// Fails when the response `Content-Type` does not match any declared media
/// type. The schema-wide `produces` wins over the endpoint-level list
/// whenever it is non-empty; no declaration at either level passes.
pub fn content_type_conformance(response: &dyn ResponseView, case: &Case) -> CheckResult {
    let produces = case.endpoint().produces();
    if produces.is_empty() {
        return Ok(());
    }
    let declared = produces.join(", ");
    let Some(content_type) = response.header("Content-Type") else {
        return Err(CheckFailure::new(format!(
            "Received a response without a Content-Type header.\n\n\
             Defined content types: {declared}"
        )));
    };
    if produces
        .iter()
        .any(|option| media_types_equal(option, content_type))
    {
        return Ok(());
    }
    Err(CheckFailure::new(format!(
        "Received a response with '{content_type}' Content-Type, \
         but it is not declared in the schema.\n\n\
         Defined content types: {declared}"
    )))
}

/// Compare two media types, ignoring parameters (`;charset=...`) and case.
#[must_use]
pub fn media_types_equal(left: &str, right: &str) -> bool {
    let strip = |value: &str| -> String {
        value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    };
    strip(left) == strip(right)
}

/// Validates a JSON response body against the schema declared for its
/// status code (falling back to `"default"`). Non-JSON content types and
/// undeclared status codes pass trivially.
pub fn response_schema_conformance(response: &dyn ResponseView, case: &Case) -> CheckResult {
    let is_json = response
        .header("Content-Type")
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return Ok(());
    }
    let Some(responses) = case.endpoint().declared_responses() else {
        return Ok(());
    };
    let status = response.status_code().to_string();
    let Some(definition) = responses
        .get(status.as_str())
        .or_else(|| responses.get("default"))
    else {
        // No response defined for the received status code
        return Ok(());
    };
    let Some(schema) = case.endpoint().schema().response_schema(definition) else {
        return Ok(());
    };
    let body = response.json_body().map_err(|e| {
        CheckFailure::new(format!(
            "The received response body could not be parsed as JSON: {e}"
        ))
    })?;
    validate_against(&schema, &body)
}

fn validate_against(schema: &Value, body: &Value) -> CheckResult {
    // A schema that cannot be compiled is a spec defect, not a response
    // defect; skip rather than fail the response.
    let Ok(validator) = jsonschema::validator_for(schema) else {
        return Ok(());
    };
    let details: Vec<String> = validator.iter_errors(body).map(|e| e.to_string()).collect();
    if details.is_empty() {
        return Ok(());
    }
    Err(CheckFailure::new(format!(
        "The received response does not conform to the defined schema!\n\n\
         Details:\n\n{}",
        details.join("\n")
    )))
}
