//! Audit loop — replay recorded interactions through the check registries
//!
//! The driver that generated the requests is external; this loop only binds
//! each recorded case back to its endpoint in the loaded schema and runs
//! the selected checks against the recorded response.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use apicheck_core::checks::Check;
use apicheck_core::schema::{ApiSchema, Case, Endpoint};
use apicheck_core::{RecordedInteraction, ResponseView};

/// One check failure, attributed to its operation and case.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub operation: String,
    pub check: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub status_code: u16,
}

/// Aggregated result of one audit run.
#[derive(Debug, Serialize)]
pub struct AuditOutcome {
    /// Interactions audited (matched to an endpoint)
    pub total: u64,
    /// Interactions with no check failures
    pub passed: u64,
    pub failures: Vec<FailureRecord>,
    /// Interactions that could not be audited (unknown operation)
    pub errors: Vec<String>,
}

impl AuditOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.total == 0 {
            3
        } else if self.failures.is_empty() {
            0
        } else {
            1
        }
    }

    /// Render a terminal report.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        let verdict = if self.failures.is_empty() && self.total > 0 {
            "PASS"
        } else {
            "FAIL"
        };
        out.push_str(&format!(
            "{verdict}: {} interactions, {} passed, {} failures\n",
            self.total,
            self.passed,
            self.failures.len()
        ));

        if !self.failures.is_empty() {
            out.push_str(&format!("\nFailures ({}):\n", self.failures.len()));
            for f in &self.failures {
                out.push_str(&format!(
                    "  [{}] {} -> {}\n",
                    f.check, f.operation, f.status_code
                ));
                for line in f.message.lines().filter(|l| !l.is_empty()) {
                    out.push_str(&format!("         {line}\n"));
                }
                if let Some(id) = &f.case_id {
                    out.push_str(&format!("         case: {id}\n"));
                }
            }
        }

        if !self.errors.is_empty() {
            out.push_str(&format!("\nErrors ({}):\n", self.errors.len()));
            for e in &self.errors {
                out.push_str(&format!("  - {e}\n"));
            }
        }

        out
    }
}

/// Run the selected checks over every recorded interaction.
///
/// Interactions whose operation is not documented in the schema are
/// reported as errors, not failures — the schema carries no contract for
/// them.
#[must_use]
pub fn run(
    schema: &Arc<ApiSchema>,
    interactions: &[RecordedInteraction],
    checks: &[Check],
) -> AuditOutcome {
    let endpoints: HashMap<String, Arc<Endpoint>> = ApiSchema::endpoints(schema)
        .into_iter()
        .map(|endpoint| (endpoint.label(), endpoint))
        .collect();

    let mut outcome = AuditOutcome {
        total: 0,
        passed: 0,
        failures: Vec::new(),
        errors: Vec::new(),
    };

    for interaction in interactions {
        let operation = interaction.case.operation();
        let Some(endpoint) = endpoints.get(&operation) else {
            outcome
                .errors
                .push(format!("{operation}: operation not found in schema"));
            continue;
        };

        let mut case = Case::new(Arc::clone(endpoint));
        if let Some(id) = &interaction.case.id {
            case = case.with_id(id.clone());
        }

        outcome.total += 1;
        let mut failed = false;
        for check in checks {
            if let Err(failure) = (check.run)(&interaction.response, &case) {
                failed = true;
                outcome.failures.push(FailureRecord {
                    operation: operation.clone(),
                    check: check.name,
                    message: failure.message().to_string(),
                    case_id: case.id().map(str::to_string),
                    status_code: interaction.response.status_code(),
                });
            }
        }
        if !failed {
            outcome.passed += 1;
        }
    }

    outcome
}
