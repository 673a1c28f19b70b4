//! Key casing between wire and domain representation.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::ir::{ArrayItems, Field, ObjectShape, ParamDefinition, TypeKind};
use crate::registry::ScopedRegistry;

/// Maximum nesting followed by the key walkers.
pub(crate) const MAX_DEPTH: usize = 128;

/// Case convention applied to object keys on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Keys are used as declared
    #[default]
    Preserve,
    /// camelCase
    Camel,
    /// snake_case
    Snake,
    /// kebab-case
    Kebab,
}

impl KeyCase {
    /// Convert one key. Leading underscores are kept as-is.
    pub fn apply(&self, key: &str) -> String {
        let case = match self {
            Self::Preserve => return key.to_string(),
            Self::Camel => Case::Camel,
            Self::Snake => Case::Snake,
            Self::Kebab => Case::Kebab,
        };
        let body = key.trim_start_matches('_');
        let prefix = &key[..key.len() - body.len()];
        if body.is_empty() {
            return key.to_string();
        }
        format!("{prefix}{}", body.to_case(case))
    }

    /// Wire name of a declared field. An explicit rename wins.
    pub fn wire_name(&self, field: &Field) -> String {
        match &field.rename {
            Some(rename) => rename.clone(),
            None => self.apply(&field.name),
        }
    }

    /// Convert every object key at every depth, without consulting a definition.
    ///
    /// Used for metadata attached outside the described payload.
    pub fn transform_keys_deep(&self, value: Value) -> Value {
        if *self == Self::Preserve {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (self.apply(&k), self.transform_keys_deep(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| self.transform_keys_deep(v))
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Camel => "camel",
            Self::Snake => "snake",
            Self::Kebab => "kebab",
        }
    }
}

impl std::str::FromStr for KeyCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "source" => Ok(Self::Preserve),
            "camel" | "camelcase" => Ok(Self::Camel),
            "snake" | "snake_case" => Ok(Self::Snake),
            "kebab" | "kebab-case" => Ok(Self::Kebab),
            other => Err(format!("unknown key case `{other}`")),
        }
    }
}

/// Renames internal keys to wire keys following a definition.
///
/// Undeclared keys pass through verbatim.
pub struct KeyMapper<'a> {
    view: ScopedRegistry<'a>,
    case: KeyCase,
}

impl<'a> KeyMapper<'a> {
    pub fn new(view: ScopedRegistry<'a>, case: KeyCase) -> Self {
        Self { view, case }
    }

    /// Rename domain keys of `value` to their wire form.
    pub fn to_wire(&self, value: Value, def: &'a ParamDefinition) -> Value {
        self.walk(value, def, 0)
    }

    fn walk(&self, value: Value, def: &'a ParamDefinition, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match (&def.kind, value) {
            (TypeKind::Reference { to }, value) => match self.view.resolve(to) {
                Ok(target) => self.walk(value, &target.definition, depth + 1),
                Err(err) => {
                    warn!(error = %err, "Cannot rename keys through unresolved reference");
                    value
                }
            },
            (TypeKind::Object { shape }, Value::Object(map)) => {
                Value::Object(self.walk_shape(map, shape, depth))
            }
            (TypeKind::Array { items }, Value::Array(elements)) => Value::Array(
                elements
                    .into_iter()
                    .map(|element| match items {
                        ArrayItems::Of(of) => self.walk(element, of, depth + 1),
                        ArrayItems::Shape(shape) => match element {
                            Value::Object(map) => Value::Object(self.walk_shape(map, shape, depth)),
                            other => other,
                        },
                    })
                    .collect(),
            ),
            (
                TypeKind::Union {
                    discriminator,
                    variants,
                },
                value,
            ) => {
                let chosen = match discriminator {
                    Some(key) => value
                        .get(key)
                        .and_then(Value::as_str)
                        .and_then(|tag| variants.iter().find(|v| v.tag.as_deref() == Some(tag))),
                    None => variants.iter().find(|v| {
                        matches!(
                            (&v.definition.kind, &value),
                            (TypeKind::Object { .. }, Value::Object(_))
                                | (TypeKind::Reference { .. }, Value::Object(_))
                                | (TypeKind::Array { .. }, Value::Array(_))
                        )
                    }),
                };
                let walked = match chosen {
                    Some(variant) => self.walk(value, &variant.definition, depth + 1),
                    None => value,
                };
                match (discriminator, walked) {
                    // Variants may leave the tag undeclared; it still goes out cased.
                    (Some(key), Value::Object(mut map)) => {
                        let wire = self.case.apply(key);
                        if wire != *key && !map.contains_key(&wire) {
                            if let Some(tag) = map.remove(key) {
                                map.insert(wire, tag);
                            }
                        }
                        Value::Object(map)
                    }
                    (_, walked) => walked,
                }
            }
            (_, value) => value,
        }
    }

    fn walk_shape(
        &self,
        mut map: Map<String, Value>,
        shape: &'a ObjectShape,
        depth: usize,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for field in &shape.fields {
            if let Some(value) = map.remove(&field.name) {
                out.insert(
                    self.case.wire_name(field),
                    self.walk(value, &field.definition, depth + 1),
                );
            }
        }
        out.extend(map);
        out
    }
}
