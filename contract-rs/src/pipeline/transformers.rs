//! Named decode/encode transformers.
//!
//! Definitions refer to transformers by name so the IR stays plain data.
//! The pipeline looks names up here when decoding inbound params and
//! encoding outbound records.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigResult, ConfigurationError};

/// A value-to-value transformation.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Registry of named transformers.
#[derive(Clone)]
pub struct Transformers {
    functions: BTreeMap<String, TransformFn>,
}

impl fmt::Debug for Transformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformers")
            .field("names", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Transformers {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Transformers {
    /// An empty registry without built-ins.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// A registry with `trim`, `downcase`, `upcase` and `blank_to_null`.
    pub fn with_builtins() -> Self {
        Self::empty()
            .with("trim", map_str(|s| s.trim().to_string()))
            .with("downcase", map_str(|s| s.to_lowercase()))
            .with("upcase", map_str(|s| s.to_uppercase()))
            .with("blank_to_null", |value: Value| match value {
                Value::String(s) if s.trim().is_empty() => Value::Null,
                other => other,
            })
    }

    /// Add or replace a transformer.
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Apply the transformer called `name`.
    pub fn apply(&self, name: &str, value: Value) -> ConfigResult<Value> {
        match self.functions.get(name) {
            Some(f) => Ok(f(value)),
            None => Err(ConfigurationError::UnknownTransformer {
                name: name.to_string(),
            }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Lift a string function; non-string values pass through.
fn map_str(
    f: impl Fn(&str) -> String + Send + Sync + 'static,
) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    move |value| match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}
