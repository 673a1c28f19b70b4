//! Named type definitions.
//!
//! A [`TypeDef`] is what gets registered: a PascalCase name bound to a
//! root [`ParamDefinition`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::param::ParamDefinition;
use crate::error::ConfigurationError;

/// Root IR for one named type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name in generated output
    pub name: String,

    #[serde(flatten)]
    pub definition: ParamDefinition,
}

impl TypeDef {
    /// Create a new named type.
    pub fn new(name: impl Into<String>, definition: ParamDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Names this type depends on.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.definition.references()
    }

    /// Whether this type only re-exports another registered type.
    pub fn alias_target(&self) -> Option<&str> {
        if self.definition.is_alias() {
            self.definition.reference_name()
        } else {
            None
        }
    }

    /// Enforce the model invariants on this type.
    ///
    /// Unions must have variants, tagged variants must carry unique tags,
    /// and object field names must be unique.
    pub fn validate_shape(&self) -> Result<(), ConfigurationError> {
        if self.name.is_empty() {
            return Err(ConfigurationError::InvalidDefinition {
                name: self.name.clone(),
                reason: "type name is empty".to_string(),
            });
        }

        let mut problems = Vec::new();
        self.definition.check(&self.name, &mut problems);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidDefinition {
                name: self.name.clone(),
                reason: problems.join("; "),
            })
        }
    }
}
