//! API schema model — the read-only data the checks consume
//!
//! `ApiSchema` wraps the raw parsed document (Swagger 2.0 or OpenAPI 3.x)
//! without imposing a typed model on it; the checks only need a handful of
//! fields (`responses`, `produces`, response schemas), so everything else
//! stays opaque `serde_json::Value`. Endpoints hold a shared read-only
//! reference back to their schema, never a copy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

/// `$ref` resolution recursion limit (circular refs are left unresolved).
const MAX_REF_DEPTH: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Cannot parse schema document: {0}")]
    Parse(String),
}

/// A parsed API schema document.
///
/// Construct once, wrap in `Arc`, and hand shared references to every
/// `Endpoint` derived from it. Nothing in this crate mutates the document.
#[derive(Debug)]
pub struct ApiSchema {
    raw: Value,
}

impl ApiSchema {
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// Parse a schema document from text. Tries JSON first, then YAML.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Parse` if the text is neither valid JSON nor
    /// valid YAML, or if the top level is not an object.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let raw: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => serde_yml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?,
        };
        if !raw.is_object() {
            return Err(SchemaError::Parse(
                "top-level schema document must be an object".into(),
            ));
        }
        Ok(Self::from_value(raw))
    }

    /// Load a schema document from a local file (JSON or YAML).
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(&text)
    }

    /// The raw schema document, for top-level fields such as `produces`.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Schema-wide `produces` list (Swagger 2.0). Empty list means absent.
    #[must_use]
    pub fn global_produces(&self) -> Vec<String> {
        string_list(self.raw.get("produces"))
    }

    /// Extract one `Endpoint` per documented path + method.
    ///
    /// Takes the schema behind `Arc` so every endpoint can hold a shared
    /// back-reference to its document.
    #[must_use]
    pub fn endpoints(schema: &Arc<Self>) -> Vec<Arc<Endpoint>> {
        let mut endpoints = Vec::new();
        let Some(paths) = schema.raw.get("paths").and_then(Value::as_object) else {
            return endpoints;
        };

        for (path, path_item) in paths {
            for method in &["get", "post", "put", "delete", "patch", "head", "options"] {
                if let Some(operation) = path_item.get(*method) {
                    endpoints.push(Arc::new(Endpoint {
                        method: method.to_uppercase(),
                        path: path.clone(),
                        definition: operation.clone(),
                        schema: Arc::clone(schema),
                    }));
                }
            }
        }

        endpoints
    }

    /// Resolve a response definition into a self-contained JSON Schema.
    ///
    /// Returns `None` when the definition declares no schema — absence of a
    /// contract, not an error. Handles both the Swagger 2.0 shape
    /// (`{"schema": ...}`) and the OpenAPI 3.x shape
    /// (`{"content": {"application/json": {"schema": ...}}}`), inlining
    /// `$ref`s against the enclosing document.
    #[must_use]
    pub fn response_schema(&self, definition: &Value) -> Option<Value> {
        let fragment = definition.get("schema").or_else(|| {
            definition
                .get("content")
                .and_then(|c| c.get("application/json"))
                .and_then(|ct| ct.get("schema"))
        })?;
        Some(self.resolve_refs(fragment, 0))
    }

    /// Recursively inline `#/...` refs against the raw document.
    fn resolve_refs(&self, schema: &Value, depth: u32) -> Value {
        if depth > MAX_REF_DEPTH {
            return schema.clone();
        }
        match schema {
            Value::Object(obj) => {
                if let Some(ref_str) = obj.get("$ref").and_then(Value::as_str) {
                    if let Some(target) = ref_str
                        .strip_prefix('#')
                        .and_then(|pointer| self.raw.pointer(pointer))
                    {
                        let target = target.clone();
                        return self.resolve_refs(&target, depth + 1);
                    }
                    // External or dangling ref, leave as-is
                    return schema.clone();
                }
                Value::Object(
                    obj.iter()
                        .map(|(k, v)| (k.clone(), self.resolve_refs(v, depth + 1)))
                        .collect(),
                )
            }
            Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(|v| self.resolve_refs(v, depth + 1))
                    .collect(),
            ),
            _ => schema.clone(),
        }
    }
}

/// One documented operation: path + method + its raw definition.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: String,
    path: String,
    definition: Value,
    schema: Arc<ApiSchema>,
}

impl Endpoint {
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        definition: Value,
        schema: Arc<ApiSchema>,
    ) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            definition,
            schema,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Operation label: "GET /users"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// The raw operation object (`responses`, optional `produces`, ...).
    #[must_use]
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<ApiSchema> {
        &self.schema
    }

    /// Declared `responses` mapping: status-code pattern → response object.
    #[must_use]
    pub fn declared_responses(&self) -> Option<&serde_json::Map<String, Value>> {
        self.definition.get("responses").and_then(Value::as_object)
    }

    /// Effective media-type declarations for responses (Swagger 2.0 lookup).
    ///
    /// The schema-wide `produces` wins whenever it is non-empty, falling back
    /// to the operation-level list. An empty list is treated as absent at
    /// both levels — intentional, matching the upstream override rule.
    #[must_use]
    pub fn produces(&self) -> Vec<String> {
        let global = self.schema.global_produces();
        if !global.is_empty() {
            return global;
        }
        string_list(self.definition.get("produces"))
    }
}

/// One generated test request, bound to the endpoint it came from.
///
/// Checks receive a `Case` alongside the captured response; they read the
/// endpoint and schema through it and never mutate anything.
#[derive(Debug, Clone)]
pub struct Case {
    id: Option<String>,
    endpoint: Arc<Endpoint>,
}

impl Case {
    #[must_use]
    pub fn new(endpoint: Arc<Endpoint>) -> Self {
        Self { id: None, endpoint }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Operation label of the originating endpoint, e.g. "POST /users".
    #[must_use]
    pub fn operation(&self) -> String {
        self.endpoint.label()
    }
}

/// Coerce an optional JSON array into a list of strings, skipping non-strings.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_swagger() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Sample API", "version": "1.0.0"},
            "produces": ["application/json"],
            "paths": {
                "/users": {
                    "get": {
                        "responses": {"200": {"description": "OK"}}
                    },
                    "post": {
                        "produces": ["text/plain"],
                        "responses": {
                            "201": {
                                "description": "Created",
                                "schema": {"$ref": "#/definitions/User"}
                            }
                        }
                    }
                }
            },
            "definitions": {
                "User": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "integer"}}
                }
            }
        })
    }

    #[test]
    fn extract_endpoints() {
        let schema = Arc::new(ApiSchema::from_value(sample_swagger()));
        let endpoints = ApiSchema::endpoints(&schema);

        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].label(), "GET /users");
        assert_eq!(endpoints[1].label(), "POST /users");
    }

    #[test]
    fn declared_responses_keys() {
        let schema = Arc::new(ApiSchema::from_value(sample_swagger()));
        let endpoints = ApiSchema::endpoints(&schema);
        let responses = endpoints[0].declared_responses().unwrap();

        assert!(responses.contains_key("200"));
    }

    #[test]
    fn global_produces_overrides_endpoint_level() {
        let schema = Arc::new(ApiSchema::from_value(sample_swagger()));
        let endpoints = ApiSchema::endpoints(&schema);

        // POST declares text/plain, but the global list wins
        assert_eq!(endpoints[1].produces(), vec!["application/json"]);
    }

    #[test]
    fn endpoint_produces_used_when_global_absent() {
        let mut raw = sample_swagger();
        raw.as_object_mut().unwrap().remove("produces");
        let schema = Arc::new(ApiSchema::from_value(raw));
        let endpoints = ApiSchema::endpoints(&schema);

        assert_eq!(endpoints[1].produces(), vec!["text/plain"]);
        assert!(endpoints[0].produces().is_empty());
    }

    #[test]
    fn empty_global_produces_treated_as_absent() {
        let mut raw = sample_swagger();
        raw["produces"] = json!([]);
        let schema = Arc::new(ApiSchema::from_value(raw));
        let endpoints = ApiSchema::endpoints(&schema);

        assert_eq!(endpoints[1].produces(), vec!["text/plain"]);
    }

    #[test]
    fn response_schema_resolves_definitions_ref() {
        let schema = Arc::new(ApiSchema::from_value(sample_swagger()));
        let endpoints = ApiSchema::endpoints(&schema);
        let definition = &endpoints[1].definition()["responses"]["201"];

        let resolved = schema.response_schema(definition).unwrap();
        assert_eq!(resolved["type"], "object");
        assert_eq!(resolved["required"][0], "id");
    }

    #[test]
    fn response_schema_none_when_not_declared() {
        let schema = ApiSchema::from_value(sample_swagger());
        assert!(
            schema
                .response_schema(&json!({"description": "OK"}))
                .is_none()
        );
    }

    #[test]
    fn response_schema_openapi3_content_shape() {
        let raw = json!({
            "openapi": "3.0.0",
            "components": {
                "schemas": {"Pet": {"type": "object"}}
            }
        });
        let schema = ApiSchema::from_value(raw);
        let definition = json!({
            "description": "OK",
            "content": {
                "application/json": {
                    "schema": {"$ref": "#/components/schemas/Pet"}
                }
            }
        });

        let resolved = schema.response_schema(&definition).unwrap();
        assert_eq!(resolved["type"], "object");
    }

    #[test]
    fn circular_ref_terminates() {
        let raw = json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {"next": {"$ref": "#/definitions/Node"}}
                }
            }
        });
        let schema = ApiSchema::from_value(raw);
        let definition = json!({"schema": {"$ref": "#/definitions/Node"}});

        // Must not hang; the depth limit leaves the innermost ref in place
        let resolved = schema.response_schema(&definition).unwrap();
        assert_eq!(resolved["type"], "object");
    }

    #[test]
    fn parse_yaml_document() {
        let text = "swagger: \"2.0\"\npaths:\n  /health:\n    get:\n      responses:\n        \"200\":\n          description: OK\n";
        let schema = Arc::new(ApiSchema::parse(text).unwrap());
        assert_eq!(ApiSchema::endpoints(&schema).len(), 1);
    }

    #[test]
    fn parse_json_document() {
        let schema = ApiSchema::parse(r#"{"swagger": "2.0", "paths": {}}"#).unwrap();
        assert!(schema.raw().get("swagger").is_some());
    }

    #[test]
    fn parse_rejects_scalar_document() {
        assert!(ApiSchema::parse("42").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swagger.json");
        std::fs::write(&path, sample_swagger().to_string()).unwrap();

        let schema = Arc::new(ApiSchema::load(&path).unwrap());
        assert_eq!(ApiSchema::endpoints(&schema).len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ApiSchema::load(Path::new("/nonexistent/spec.yaml")).unwrap_err();
        assert!(matches!(err, SchemaError::Io(..)));
    }

    #[test]
    fn case_carries_endpoint_reference() {
        let schema = Arc::new(ApiSchema::from_value(sample_swagger()));
        let endpoint = ApiSchema::endpoints(&schema).remove(0);
        let case = Case::new(endpoint).with_id("c1");

        assert_eq!(case.operation(), "GET /users");
        assert_eq!(case.id(), Some("c1"));
    }
}
