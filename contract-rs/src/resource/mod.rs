//! Resources: attributes and associations of one domain entity.
//!
//! A resource is declared once. Its read type, create/update payloads,
//! nested-operation union, filter, sort and response envelopes are all
//! derived from the same declarations and registered together, so they
//! cannot drift apart.
//!
//! # Example
//! ```rust
//! use contract_rs::ir::ParamDefinition;
//! use contract_rs::registry::{Scope, TypeRegistry};
//! use contract_rs::resource::{AttributeDefinition, ResourceCatalog, ResourceDefinition};
//!
//! let mut catalog = ResourceCatalog::new();
//! catalog.insert(
//!     ResourceDefinition::new("Customer")
//!         .attribute(AttributeDefinition::new("id", ParamDefinition::integer()))
//!         .attribute(AttributeDefinition::new("name", ParamDefinition::string()).writable(true)),
//! );
//!
//! let mut registry = TypeRegistry::new();
//! catalog.register_all(&mut registry, &Scope::api("billing")).unwrap();
//! assert!(registry.exists("CustomerCreatePayload", &Scope::api("billing")));
//! ```

mod association;
mod attribute;
mod payload;

pub use association::{AssociationDefinition, AssociationTarget, Cardinality, DEFAULT_DISCRIMINATOR};
pub use attribute::{AttributeDefinition, Writable, WriteContext};
pub use payload::{register_resource, NESTED_OPERATION_KEY, PAGINATION_META};

use std::collections::BTreeMap;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigResult;
use crate::registry::{Scope, TypeRegistry};

fn default_discriminator() -> String {
    DEFAULT_DISCRIMINATOR.to_string()
}

// =============================================================================
// Naming
// =============================================================================

/// PascalCase type name for an arbitrary identifier.
pub fn type_name(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// Singular form of a snake_case or PascalCase word.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !word.ends_with("ss") => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Plural form of a snake_case word.
pub fn pluralize(word: &str) -> String {
    let consonant_y = word.ends_with('y')
        && !word
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| "aeiou".contains(c));
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Keys wrapping members and collections in response bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootKey {
    pub singular: String,
    pub plural: String,
}

impl RootKey {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// Derive both keys from a type name: `LineItem` → `line_item` / `line_items`.
    pub fn from_type_name(name: &str) -> Self {
        let singular = name.to_case(Case::Snake);
        let plural = pluralize(&singular);
        Self { singular, plural }
    }
}

/// One subtype of a single-table resource: base fields plus its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceVariant {
    /// Discriminator value
    pub tag: String,
    /// Registered type name
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl ResourceVariant {
    pub fn new(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Declarations of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,

    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,

    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_key: Option<RootKey>,

    /// Whether parents may create/update/delete this resource inline
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub accepts_nested_writes: bool,

    /// Discriminator key of single-table variants
    #[serde(default = "default_discriminator")]
    pub discriminator: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ResourceVariant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            associations: Vec::new(),
            root_key: None,
            accepts_nested_writes: false,
            discriminator: default_discriminator(),
            variants: Vec::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn association(mut self, association: AssociationDefinition) -> Self {
        self.associations.push(association);
        self
    }

    pub fn with_root_key(mut self, root_key: RootKey) -> Self {
        self.root_key = Some(root_key);
        self
    }

    pub fn accepts_nested_writes(mut self) -> Self {
        self.accepts_nested_writes = true;
        self
    }

    pub fn variant(mut self, variant: ResourceVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Explicit root key, or one derived from the name.
    pub fn root_key(&self) -> RootKey {
        self.root_key
            .clone()
            .unwrap_or_else(|| RootKey::from_type_name(&self.name))
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn variant_for(&self, tag: &str) -> Option<&ResourceVariant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    pub fn create_payload_name(&self) -> String {
        format!("{}CreatePayload", self.name)
    }

    pub fn update_payload_name(&self) -> String {
        format!("{}UpdatePayload", self.name)
    }

    pub fn nested_operation_name(&self) -> String {
        format!("{}NestedOperation", self.name)
    }

    pub fn filter_name(&self) -> String {
        format!("{}Filter", self.name)
    }

    pub fn sort_field_name(&self) -> String {
        format!("{}SortField", self.name)
    }

    pub fn sort_name(&self) -> String {
        format!("{}Sort", self.name)
    }

    pub fn response_name(&self) -> String {
        format!("{}Response", self.name)
    }

    pub fn collection_response_name(&self) -> String {
        format!("{}CollectionResponse", self.name)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Resources of one namespace, by name.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: BTreeMap<String, ResourceDefinition>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResourceDefinition) {
        self.resources.insert(resource.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource an association points at.
    ///
    /// An explicit resource name wins, then the convention of the
    /// singularised, PascalCased association name. Polymorphic associations
    /// have no single target and yield `None`; see
    /// [`resolve_polymorphic`](Self::resolve_polymorphic).
    pub fn resolve_target(&self, association: &AssociationDefinition) -> Option<&ResourceDefinition> {
        match &association.target {
            AssociationTarget::Direct { resource } => resource
                .as_deref()
                .and_then(|name| self.get(name))
                .or_else(|| self.get(&type_name(&singularize(&association.name)))),
            AssociationTarget::Sti { resource, .. } => self.get(resource),
            AssociationTarget::Polymorphic { .. } => None,
        }
    }

    /// Tag → resource pairs of a polymorphic association, if all resolve.
    pub fn resolve_polymorphic<'a>(
        &'a self,
        association: &'a AssociationDefinition,
    ) -> Option<Vec<(&'a str, &'a ResourceDefinition)>> {
        match &association.target {
            AssociationTarget::Polymorphic { resources } => resources
                .iter()
                .map(|(tag, name)| self.get(name).map(|r| (tag.as_str(), r)))
                .collect(),
            _ => None,
        }
    }

    /// Register the derived types of every resource, in name order.
    pub fn register_all(&self, registry: &mut TypeRegistry, scope: &Scope) -> ConfigResult<()> {
        for resource in self.resources.values() {
            register_resource(registry, scope, self, resource)?;
        }
        debug!(scope = %scope, resources = self.resources.len(), "Registered resources");
        Ok(())
    }
}

impl FromIterator<ResourceDefinition> for ResourceCatalog {
    fn from_iter<I: IntoIterator<Item = ResourceDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for resource in iter {
            catalog.insert(resource);
        }
        catalog
    }
}
