//! Attribute declarations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ir::{EnumValues, ParamDefinition};

/// Request kind in which a field may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteContext {
    Create,
    Update,
}

impl WriteContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Writability of an attribute or association.
///
/// Authored as `true`/`false` or `{ "on": ["update"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Writable {
    Flag(bool),
    On { on: BTreeSet<WriteContext> },
}

impl Default for Writable {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl Writable {
    pub fn allows(&self, context: WriteContext) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::On { on } => on.contains(&context),
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::On { on } => !on.is_empty(),
        }
    }
}

/// One attribute of a resource.
///
/// Declared once; the read type, write payloads, filters and sort fields
/// are all derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,

    #[serde(flatten)]
    pub definition: ParamDefinition,

    #[serde(default)]
    pub writable: Writable,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filterable: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, definition: ParamDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
            writable: Writable::default(),
            filterable: false,
            sortable: false,
        }
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Writable::Flag(writable);
        self
    }

    /// Writable only in the given contexts.
    pub fn writable_on(mut self, contexts: impl IntoIterator<Item = WriteContext>) -> Self {
        self.writable = Writable::On {
            on: contexts.into_iter().collect(),
        };
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.definition.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.definition.optional = true;
        self
    }

    pub fn decode(mut self, transformer: impl Into<String>) -> Self {
        self.definition.decode = Some(transformer.into());
        self
    }

    pub fn encode(mut self, transformer: impl Into<String>) -> Self {
        self.definition.encode = Some(transformer.into());
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.enum_values = Some(EnumValues::Inline(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.definition.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.metadata.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.definition.metadata.example = Some(example.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.definition.metadata.deprecated = true;
        self
    }

    pub fn writable_for(&self, context: WriteContext) -> bool {
        self.writable.allows(context)
    }

    /// Definition as rendered in the read type.
    ///
    /// Read types carry no transformers or defaults; every attribute is
    /// present in responses.
    pub fn read_definition(&self) -> ParamDefinition {
        let mut def = self.definition.clone();
        def.default = None;
        def.decode = None;
        def.encode = None;
        def.optional = false;
        def
    }

    /// Definition as rendered in a write payload for `context`.
    ///
    /// Update payloads make every field optional.
    pub fn write_definition(&self, context: WriteContext) -> ParamDefinition {
        let mut def = self.definition.clone();
        def.encode = None;
        if context == WriteContext::Update {
            def.optional = true;
            def.default = None;
        }
        def
    }

    /// Definition as rendered in a filter: optional, without transformers or defaults.
    pub fn filter_definition(&self) -> ParamDefinition {
        let mut def = self.read_definition();
        def.optional = true;
        def
    }
}
