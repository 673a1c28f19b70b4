//! Coercion of loosely-typed wire values into declared scalar types.
//!
//! [`coerce_scalar`] is a pure per-kind function returning `None` when the
//! input cannot be converted. It never panics and never returns an error.
//!
//! [`Coercer`] applies it across a whole payload, following object shapes,
//! array elements, references and union variants. A leaf that fails to
//! coerce is left unchanged so validation reports it.
//!
//! # Example
//! ```rust
//! use contract_rs::coerce::coerce_scalar;
//! use contract_rs::ir::ScalarKind;
//! use serde_json::json;
//!
//! assert_eq!(coerce_scalar(ScalarKind::Integer, &json!("007")), Some(json!(7)));
//! assert_eq!(coerce_scalar(ScalarKind::Integer, &json!("abc")), None);
//! assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!("")), None);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::ir::{ArrayItems, ObjectShape, ParamDefinition, ScalarKind, TypeKind};
use crate::pipeline::keys::MAX_DEPTH;
use crate::pipeline::KeyCase;
use crate::registry::ScopedRegistry;
use crate::validate::Validator;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("static regex"));

/// ISO 8601 datetime with a mandatory offset: `Z`, `+HH`, `+HHMM` or `+HH:MM`.
static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?)(Z|[+-]\d{2}(?::?\d{2})?)$")
        .expect("static regex")
});

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").expect("static regex"));

pub(crate) static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("static regex")
});

// =============================================================================
// Scalar coercion
// =============================================================================

/// Convert `value` to `kind`, or `None` if it cannot be converted.
///
/// `null` never coerces.
pub fn coerce_scalar(kind: ScalarKind, value: &Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    match kind {
        ScalarKind::String => Some(match value {
            Value::String(_) => value.clone(),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => Value::String(other.to_string()),
        }),
        ScalarKind::Integer => coerce_integer(value),
        ScalarKind::Float | ScalarKind::Decimal => coerce_float(value),
        ScalarKind::Boolean => coerce_boolean(value),
        ScalarKind::Date => value
            .as_str()
            .filter(|s| parse_date(s))
            .map(|_| value.clone()),
        ScalarKind::Datetime => value.as_str().and_then(coerce_datetime).map(Value::String),
        ScalarKind::Time => value.as_str().and_then(coerce_time).map(Value::String),
        ScalarKind::Uuid => value
            .as_str()
            .filter(|s| is_uuid(s))
            .map(|_| value.clone()),
        ScalarKind::Unknown => Some(value.clone()),
    }
}

fn coerce_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::String(s) if INTEGER.is_match(s) => s.parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if INTEGER.is_match(trimmed) {
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Some(Value::from(n));
                }
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(Value::Bool(true)),
            Some(0) => Some(Value::Bool(false)),
            _ => None,
        },
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(Value::Bool(true)),
            "false" | "0" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn parse_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Strict check: a datetime with an offset.
pub(crate) fn parse_datetime(s: &str) -> bool {
    let Some(caps) = DATETIME.captures(s) else {
        return false;
    };
    let offset = &caps[2];
    let offset = match offset.len() {
        3 => format!("{offset}:00"),
        5 => format!("{}:{}", &offset[..3], &offset[3..]),
        _ => offset.to_string(),
    };
    DateTime::parse_from_rfc3339(&format!("{}{offset}", &caps[1])).is_ok()
}

/// Strict check: `HH:MM:SS` with optional fraction.
pub(crate) fn parse_time(s: &str) -> bool {
    TIME.is_match(s) && NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok()
}

/// Offset-less datetimes are read as UTC.
fn coerce_datetime(s: &str) -> Option<String> {
    if parse_datetime(s) {
        return Some(s.to_string());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn coerce_time(s: &str) -> Option<String> {
    if parse_time(s) {
        return Some(s.to_string());
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .ok()
        .map(|time| time.format("%H:%M:%S").to_string())
}

pub(crate) fn is_uuid(s: &str) -> bool {
    UUID.is_match(s) && uuid::Uuid::parse_str(s).is_ok()
}

// =============================================================================
// Tree coercion
// =============================================================================

/// Coerces whole payloads against a definition.
///
/// Object keys are looked up by their wire names.
pub struct Coercer<'a> {
    view: ScopedRegistry<'a>,
    key_case: KeyCase,
}

impl<'a> Coercer<'a> {
    pub fn new(view: ScopedRegistry<'a>, key_case: KeyCase) -> Self {
        Self { view, key_case }
    }

    /// Coerce every leaf of `value` that `def` describes.
    pub fn coerce(&self, value: Value, def: &'a ParamDefinition) -> Value {
        self.walk(value, def, 0)
    }

    fn walk(&self, value: Value, def: &'a ParamDefinition, depth: usize) -> Value {
        if value.is_null() || depth > MAX_DEPTH {
            return value;
        }

        match &def.kind {
            TypeKind::Reference { to } => match self.view.resolve(to) {
                Ok(target) => self.walk(value, &target.definition, depth + 1),
                Err(_) => value,
            },
            TypeKind::Object { shape } => match value {
                Value::Object(map) => Value::Object(self.walk_shape(map, shape, depth)),
                other => other,
            },
            TypeKind::Array { items } => match value {
                Value::Array(elements) => Value::Array(
                    elements
                        .into_iter()
                        .map(|element| match items {
                            ArrayItems::Of(of) => self.walk(element, of, depth + 1),
                            ArrayItems::Shape(shape) => match element {
                                Value::Object(map) => {
                                    Value::Object(self.walk_shape(map, shape, depth + 1))
                                }
                                other => other,
                            },
                        })
                        .collect(),
                ),
                other => other,
            },
            TypeKind::Union {
                discriminator,
                variants,
            } => {
                if let Some(key) = discriminator {
                    let chosen = value
                        .get(self.key_case.apply(key))
                        .and_then(Value::as_str)
                        .and_then(|tag| variants.iter().find(|v| v.tag.as_deref() == Some(tag)));
                    return match chosen {
                        Some(variant) => self.walk(value, &variant.definition, depth + 1),
                        None => value,
                    };
                }

                if variants
                    .iter()
                    .any(|v| v.definition.scalar_kind() == Some(ScalarKind::Boolean))
                {
                    if let Some(coerced) = coerce_scalar(ScalarKind::Boolean, &value) {
                        return coerced;
                    }
                }

                let validator = Validator::new(self.view, self.key_case);
                for variant in variants {
                    let candidate = self.walk(value.clone(), &variant.definition, depth + 1);
                    if validator.validate(&candidate, &variant.definition).is_valid() {
                        trace!(kind = variant.definition.kind.name(), "Union variant matched");
                        return candidate;
                    }
                }
                value
            }
            TypeKind::Literal { value: expected } => {
                let kind = match expected {
                    Value::Bool(_) => Some(ScalarKind::Boolean),
                    Value::Number(n) if n.is_i64() || n.is_u64() => Some(ScalarKind::Integer),
                    Value::Number(_) => Some(ScalarKind::Float),
                    _ => None,
                };
                kind.and_then(|k| coerce_scalar(k, &value)).unwrap_or(value)
            }
            kind => match kind.scalar() {
                Some(scalar) => coerce_scalar(scalar, &value).unwrap_or(value),
                None => value,
            },
        }
    }

    fn walk_shape(
        &self,
        mut map: Map<String, Value>,
        shape: &'a ObjectShape,
        depth: usize,
    ) -> Map<String, Value> {
        for field in &shape.fields {
            let wire = self.key_case.wire_name(field);
            if let Some(value) = map.remove(&wire) {
                let coerced = self.walk(value, &field.definition, depth + 1);
                map.insert(wire, coerced);
            }
        }
        map
    }
}
