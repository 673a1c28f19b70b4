//! Direction-aware transformation pipeline.
//!
//! Inbound (query and body) requests run
//! extract → coerce → validate (wire keys in, domain keys out) → decode.
//! Inbound failures reject closed: params are empty and the issues are
//! returned as a [`PipelineError::Invalid`].
//!
//! Outbound responses run encode → rename to wire keys → coerce → validate.
//! Outbound validation failures keep the original data and log a warning,
//! since that data is produced by the server itself.
//!
//! # Example
//! ```rust
//! use contract_rs::ir::{Field, ParamDefinition};
//! use contract_rs::pipeline::{Direction, KeyCase, NamespaceConfig, Pipeline};
//! use contract_rs::registry::{Scope, TypeRegistry};
//! use serde_json::json;
//!
//! let registry = TypeRegistry::new();
//! let scope = Scope::api("billing");
//! let pipeline = Pipeline::new(&registry, &scope, NamespaceConfig::new("billing").with_key_case(KeyCase::Camel));
//!
//! let def = ParamDefinition::object(vec![Field::new("per_page", ParamDefinition::integer())]);
//! let params = pipeline.parse(Direction::Query, json!({ "perPage": "25" }), &def).unwrap();
//! assert_eq!(params, json!({ "per_page": 25 }));
//! ```

pub mod keys;
mod transformers;

pub use keys::{KeyCase, KeyMapper};
pub use transformers::{TransformFn, Transformers};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::coerce::Coercer;
use crate::error::{ConfigResult, PipelineError, SerializationError};
use crate::ir::{ArrayItems, ObjectShape, ParamDefinition, TypeKind};
use crate::issue::IssueCollection;
use crate::registry::{Scope, ScopedRegistry, TypeRegistry};
use crate::validate::Validator;

use keys::MAX_DEPTH;

// =============================================================================
// Direction and configuration
// =============================================================================

/// Which side of a request is being processed. Fixed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Query,
    Body,
    ResponseBody,
}

impl Direction {
    pub fn is_inbound(&self) -> bool {
        !matches!(self, Self::ResponseBody)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::ResponseBody => "response_body",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-namespace wire conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Namespace (API) name
    pub name: String,
    /// Wire key case for both directions
    pub key_case: KeyCase,
    /// Overrides `key_case` for query and body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_key_case: Option<KeyCase>,
    /// Overrides `key_case` for responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key_case: Option<KeyCase>,
    pub locale: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            key_case: KeyCase::Preserve,
            input_key_case: None,
            output_key_case: None,
            locale: "en".to_string(),
        }
    }
}

impl NamespaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    pub fn with_input_key_case(mut self, key_case: KeyCase) -> Self {
        self.input_key_case = Some(key_case);
        self
    }

    pub fn with_output_key_case(mut self, key_case: KeyCase) -> Self {
        self.output_key_case = Some(key_case);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Key case in effect for `direction`.
    pub fn key_case_for(&self, direction: Direction) -> KeyCase {
        let overridden = if direction.is_inbound() {
            self.input_key_case
        } else {
            self.output_key_case
        };
        overridden.unwrap_or(self.key_case)
    }
}

/// Params and issues produced for one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Empty object when `issues` is non-empty
    pub params: Value,
    pub issues: IssueCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Decode,
    Encode,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Request/response processing for one namespace.
pub struct Pipeline<'a> {
    view: ScopedRegistry<'a>,
    config: NamespaceConfig,
    transformers: Transformers,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a TypeRegistry, scope: &'a Scope, config: NamespaceConfig) -> Self {
        Self {
            view: registry.scoped(scope),
            config,
            transformers: Transformers::with_builtins(),
        }
    }

    pub fn with_transformers(mut self, transformers: Transformers) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Run the inbound stages and report params plus issues.
    ///
    /// Only configuration problems (such as an unknown decode transformer)
    /// are returned as errors.
    pub fn process(
        &self,
        direction: Direction,
        raw: Value,
        def: &'a ParamDefinition,
    ) -> Result<PipelineOutcome, PipelineError> {
        let key_case = self.config.key_case_for(direction);

        let extracted = match direction {
            Direction::Query => self.extract_query(raw, def, key_case, 0),
            _ => raw,
        };
        let coerced = Coercer::new(self.view, key_case).coerce(extracted, def);
        let outcome = Validator::new(self.view, key_case).validate(&coerced, def);

        if !outcome.is_valid() {
            debug!(
                namespace = %self.config.name,
                direction = %direction,
                issue_count = outcome.issues.len(),
                "Rejected request params"
            );
            return Ok(PipelineOutcome {
                params: Value::Object(Map::new()),
                issues: outcome.issues,
            });
        }

        let params = self.transform(outcome.params, def, Stage::Decode, 0)?;
        debug!(namespace = %self.config.name, direction = %direction, "Parsed request params");
        Ok(PipelineOutcome {
            params,
            issues: IssueCollection::new(),
        })
    }

    /// Run the inbound stages, failing with the issue collection on invalid input.
    pub fn parse(
        &self,
        direction: Direction,
        raw: Value,
        def: &'a ParamDefinition,
    ) -> Result<Value, PipelineError> {
        let outcome = self.process(direction, raw, def)?;
        if outcome.issues.is_empty() {
            Ok(outcome.params)
        } else {
            Err(PipelineError::Invalid(outcome.issues))
        }
    }

    /// Query-string specific normalisation.
    ///
    /// Comma separated strings become arrays for array fields; empty
    /// strings for optional fields are treated as absent.
    fn extract_query(
        &self,
        raw: Value,
        def: &'a ParamDefinition,
        key_case: KeyCase,
        depth: usize,
    ) -> Value {
        if depth > MAX_DEPTH {
            return raw;
        }
        let target = match self.view.deref(def) {
            Ok((target, _)) => target,
            Err(_) => return raw,
        };
        let Some(shape) = target.shape() else {
            return raw;
        };
        let Value::Object(mut map) = raw else {
            return raw;
        };

        for field in &shape.fields {
            let wire = key_case.wire_name(field);
            let Some(value) = map.remove(&wire) else {
                continue;
            };
            if value.as_str() == Some("") && field.definition.optional {
                continue;
            }
            let field_target = self
                .view
                .deref(&field.definition)
                .map(|(t, _)| t)
                .unwrap_or(&field.definition);
            let value = match (&field_target.kind, value) {
                (TypeKind::Array { .. }, Value::String(s)) => Value::Array(
                    s.split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                ),
                (TypeKind::Object { .. }, value @ Value::Object(_)) => {
                    self.extract_query(value, &field.definition, key_case, depth + 1)
                }
                (_, value) => value,
            };
            map.insert(wire, value);
        }
        Value::Object(map)
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Shape one record for the response body.
    pub fn serialize_record(
        &self,
        record: Value,
        def: &'a ParamDefinition,
        type_name: &str,
    ) -> Result<Value, PipelineError> {
        let key_case = self.config.key_case_for(Direction::ResponseBody);

        let encoded = self
            .transform(record, def, Stage::Encode, 0)
            .map_err(|err| SerializationError::new(type_name, err.to_string()))?;
        let wire = KeyMapper::new(self.view, key_case).to_wire(encoded, def);
        let coerced = Coercer::new(self.view, key_case).coerce(wire.clone(), def);
        let outcome = Validator::new(self.view, key_case).validate(&coerced, def);

        if outcome.is_valid() {
            Ok(coerced)
        } else {
            warn!(
                namespace = %self.config.name,
                record = %type_name,
                issue_count = outcome.issues.len(),
                issues = %outcome.issues,
                "Response does not match its contract, sending original data"
            );
            Ok(wire)
        }
    }

    /// Serialize a typed record, then shape it like [`serialize_record`](Self::serialize_record).
    pub fn serialize<T: Serialize>(
        &self,
        record: &T,
        def: &'a ParamDefinition,
        type_name: &str,
    ) -> Result<Value, PipelineError> {
        let value = serde_json::to_value(record)
            .map_err(|err| SerializationError::new(type_name, err.to_string()))?;
        self.serialize_record(value, def, type_name)
    }

    /// Wrap one record under its singular root key.
    pub fn serialize_member(
        &self,
        root_key: &str,
        record: Value,
        def: &'a ParamDefinition,
        type_name: &str,
    ) -> Result<Value, PipelineError> {
        let key_case = self.config.key_case_for(Direction::ResponseBody);
        let mut body = Map::new();
        body.insert(
            key_case.apply(root_key),
            self.serialize_record(record, def, type_name)?,
        );
        Ok(Value::Object(body))
    }

    /// Wrap records under their plural root key, with optional metadata.
    ///
    /// Metadata keys go through their own deep key-case transform.
    pub fn serialize_collection(
        &self,
        root_key: &str,
        records: Vec<Value>,
        def: &'a ParamDefinition,
        type_name: &str,
        meta: Option<Value>,
    ) -> Result<Value, PipelineError> {
        let key_case = self.config.key_case_for(Direction::ResponseBody);
        let items = records
            .into_iter()
            .map(|record| self.serialize_record(record, def, type_name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut body = Map::new();
        body.insert(key_case.apply(root_key), Value::Array(items));
        if let Some(meta) = meta {
            body.insert("meta".to_string(), key_case.transform_keys_deep(meta));
        }
        Ok(Value::Object(body))
    }

    // =========================================================================
    // Transformers
    // =========================================================================

    /// Apply decode or encode transformers over domain-keyed data.
    fn transform(
        &self,
        value: Value,
        def: &ParamDefinition,
        stage: Stage,
        depth: usize,
    ) -> ConfigResult<Value> {
        if depth > MAX_DEPTH || value.is_null() {
            return Ok(value);
        }

        let value = match (&def.kind, value) {
            (TypeKind::Reference { to }, value) => {
                let target = self.view.resolve(to)?;
                self.transform(value, &target.definition, stage, depth + 1)?
            }
            (TypeKind::Object { shape }, Value::Object(map)) => {
                Value::Object(self.transform_shape(map, shape, stage, depth)?)
            }
            (TypeKind::Array { items }, Value::Array(elements)) => Value::Array(
                elements
                    .into_iter()
                    .map(|element| match (items, element) {
                        (ArrayItems::Of(of), element) => {
                            self.transform(element, of, stage, depth + 1)
                        }
                        (ArrayItems::Shape(shape), Value::Object(map)) => self
                            .transform_shape(map, shape, stage, depth + 1)
                            .map(Value::Object),
                        (_, other) => Ok(other),
                    })
                    .collect::<ConfigResult<Vec<_>>>()?,
            ),
            (
                TypeKind::Union {
                    discriminator: Some(key),
                    variants,
                },
                value,
            ) => {
                let chosen = value
                    .get(key)
                    .and_then(Value::as_str)
                    .and_then(|tag| variants.iter().find(|v| v.tag.as_deref() == Some(tag)));
                match chosen {
                    Some(variant) => self.transform(value, &variant.definition, stage, depth + 1)?,
                    None => value,
                }
            }
            (
                TypeKind::Union {
                    discriminator: None,
                    variants,
                },
                value,
            ) => {
                // Domain keys at this point, so shapes are checked uncased.
                let validator = Validator::new(self.view, KeyCase::Preserve);
                let chosen = variants
                    .iter()
                    .find(|v| validator.validate(&value, &v.definition).is_valid());
                match chosen {
                    Some(variant) => self.transform(value, &variant.definition, stage, depth + 1)?,
                    None => value,
                }
            }
            (_, value) => value,
        };

        let name = match stage {
            Stage::Decode => def.decode.as_deref(),
            Stage::Encode => def.encode.as_deref(),
        };
        match name {
            Some(name) => self.transformers.apply(name, value),
            None => Ok(value),
        }
    }

    fn transform_shape(
        &self,
        mut map: Map<String, Value>,
        shape: &ObjectShape,
        stage: Stage,
        depth: usize,
    ) -> ConfigResult<Map<String, Value>> {
        for field in &shape.fields {
            if let Some(value) = map.remove(&field.name) {
                let transformed = self.transform(value, &field.definition, stage, depth + 1)?;
                map.insert(field.name.clone(), transformed);
            }
        }
        Ok(map)
    }
}
