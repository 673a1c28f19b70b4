//! Metadata IR definitions.
//!
//! Metadata does not affect validation or coercion. Generators render it
//! as documentation (JSDoc, `.describe()`, OpenAPI keywords).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Documentation metadata attached to a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Example value for documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Whether the field or type is deprecated
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl FieldMetadata {
    /// Create metadata with a description.
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the example value.
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Mark as deprecated.
    #[allow(clippy::wrong_self_convention)]
    pub fn as_deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Check if this metadata has any content.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.example.is_none() && !self.deprecated
    }

    /// Merge another metadata into this one, preferring values from other.
    pub fn merge(&mut self, other: &FieldMetadata) {
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        if other.example.is_some() {
            self.example = other.example.clone();
        }
        if other.deprecated {
            self.deprecated = true;
        }
    }
}
