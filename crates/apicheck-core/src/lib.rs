//! apicheck-core: Schema model and response conformance checks
//!
//! This crate provides the read-only schema/case model, the narrow response
//! view used by the checks, the checks themselves with their registries,
//! and the recorded-interaction interchange format consumed by the CLI.

pub mod checks;
pub mod config;
pub mod interchange;
pub mod response;
pub mod schema;

pub use checks::{
    ALL_CHECKS, Check, CheckFailure, CheckResult, DEFAULT_CHECKS, OPTIONAL_CHECKS, find_check,
};
pub use config::{Config, ConfigError};
pub use interchange::{InterchangeError, RecordedCase, RecordedInteraction, RecordedResponse};
pub use response::{BodyError, HttpResponse, ResponseView};
pub use schema::{ApiSchema, Case, Endpoint, SchemaError};
