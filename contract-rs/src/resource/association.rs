//! Association declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attribute::{Writable, WriteContext};

/// Default discriminator key of polymorphic and STI associations.
pub const DEFAULT_DISCRIMINATOR: &str = "type";

fn default_discriminator() -> String {
    DEFAULT_DISCRIMINATOR.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
    BelongsTo,
}

impl Cardinality {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }
}

/// What an association points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssociationTarget {
    /// One resource. Without an explicit name the target is found by convention.
    Direct {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
    },
    /// Independent resources selected by a tag value.
    Polymorphic { resources: BTreeMap<String, String> },
    /// A subset of the variants of a single-table resource.
    Sti {
        resource: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
    },
}

impl Default for AssociationTarget {
    fn default() -> Self {
        Self::Direct { resource: None }
    }
}

/// One association of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDefinition {
    pub name: String,

    pub cardinality: Cardinality,

    #[serde(default)]
    pub target: AssociationTarget,

    #[serde(default)]
    pub writable: Writable,

    /// Writes carry full child payloads instead of ids
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nested: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    /// Only present in responses when requested
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    #[serde(default = "default_discriminator")]
    pub discriminator: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AssociationDefinition {
    pub fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            cardinality,
            target: AssociationTarget::default(),
            writable: Writable::default(),
            nested: false,
            nullable: false,
            optional: false,
            discriminator: default_discriminator(),
            description: None,
        }
    }

    pub fn has_one(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::One)
    }

    pub fn has_many(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::Many)
    }

    pub fn belongs_to(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::BelongsTo)
    }

    /// Point at a named resource instead of the naming convention.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.target = AssociationTarget::Direct {
            resource: Some(resource.into()),
        };
        self
    }

    pub fn polymorphic<I, T, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = (T, R)>,
        T: Into<String>,
        R: Into<String>,
    {
        self.target = AssociationTarget::Polymorphic {
            resources: resources
                .into_iter()
                .map(|(tag, resource)| (tag.into(), resource.into()))
                .collect(),
        };
        self
    }

    /// Point at variants of a single-table resource. No tags means all variants.
    pub fn sti<I, S>(mut self, resource: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = AssociationTarget::Sti {
            resource: resource.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Writable::Flag(writable);
        self
    }

    pub fn writable_on(mut self, contexts: impl IntoIterator<Item = WriteContext>) -> Self {
        self.writable = Writable::On {
            on: contexts.into_iter().collect(),
        };
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn discriminator(mut self, key: impl Into<String>) -> Self {
        self.discriminator = key.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn writable_for(&self, context: WriteContext) -> bool {
        self.writable.allows(context)
    }
}
