//! Type registry for named, scoped type definitions.
//!
//! The registry stores definitions per [`Scope`], tracks the names each
//! definition references, and provides deterministic dependency ordering
//! and cycle detection for the generators.
//!
//! Registration is idempotent: registering an identical definition again is
//! a no-op, while a conflicting redefinition is a [`ConfigurationError`]
//! handled according to the process-wide [`ErrorPolicy`].
//!
//! Self-referential types use two-phase registration: [`TypeRegistry::reserve`]
//! allocates a named placeholder, [`TypeRegistry::define`] fills it in. All
//! consumers follow references by name, so nothing is ever inlined.
//!
//! # Example
//! ```rust
//! use contract_rs::ir::{Field, ParamDefinition, TypeDef};
//! use contract_rs::registry::{Scope, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let scope = Scope::api("billing");
//!
//! registry.reserve("Node", &scope);
//! registry
//!     .define(
//!         TypeDef::new(
//!             "Node",
//!             ParamDefinition::object(vec![Field::new(
//!                 "children",
//!                 ParamDefinition::array_of(ParamDefinition::reference("Node")),
//!             )]),
//!         ),
//!         &scope,
//!     )
//!     .unwrap();
//!
//! assert!(registry.recursive_names(&scope).contains("Node"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigResult, ConfigurationError, ErrorPolicy};
use crate::ir::{ParamDefinition, TypeDef, TypeKind};

/// Maximum alias hops followed before giving up.
const MAX_ALIAS_DEPTH: usize = 16;

// =============================================================================
// Scope
// =============================================================================

/// Visibility scope of a registered name.
///
/// Resolution walks contract, then API, then global. Distinct APIs never
/// see each other's names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Api(String),
    Contract { api: String, contract: String },
}

impl Scope {
    pub fn api(name: impl Into<String>) -> Self {
        Self::Api(name.into())
    }

    pub fn contract(api: impl Into<String>, contract: impl Into<String>) -> Self {
        Self::Contract {
            api: api.into(),
            contract: contract.into(),
        }
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<Scope> {
        match self {
            Self::Global => None,
            Self::Api(_) => Some(Self::Global),
            Self::Contract { api, .. } => Some(Self::Api(api.clone())),
        }
    }

    /// This scope followed by its ancestors, innermost first.
    pub fn chain(&self) -> Vec<Scope> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(scope) = current {
            current = scope.parent();
            chain.push(scope);
        }
        chain
    }

    /// The API (namespace) name, if this scope belongs to one.
    pub fn api_name(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Api(api) | Self::Contract { api, .. } => Some(api),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Api(api) => write!(f, "api:{api}"),
            Self::Contract { api, contract } => write!(f, "contract:{api}/{contract}"),
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// State of one registered name.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Name allocated, body not yet defined
    Placeholder,
    /// Fully defined type
    Defined(TypeDef),
    /// Re-export of a type registered elsewhere
    Alias { scope: Scope, name: String },
}

/// One step of a namespace traversal, in dependency order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedType<'a> {
    /// Name as emitted in the namespace
    pub name: String,
    pub kind: OrderedKind<'a>,
    /// Whether the name participates in a reference cycle
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderedKind<'a> {
    Defined(&'a TypeDef),
    /// `name = target`
    Alias(String),
}

// =============================================================================
// Scoped view
// =============================================================================

/// Read-only view of a registry from one scope.
///
/// Runtime consumers (coercion, validation, key transforms) resolve
/// references through this view.
#[derive(Debug, Clone, Copy)]
pub struct ScopedRegistry<'a> {
    pub registry: &'a TypeRegistry,
    pub scope: &'a Scope,
}

impl<'a> ScopedRegistry<'a> {
    pub fn resolve(&self, name: &str) -> ConfigResult<&'a TypeDef> {
        self.registry.resolve(name, self.scope)
    }

    /// Follow references until a non-reference definition is reached.
    ///
    /// Returns the target and whether any hop along the way was nullable.
    pub fn deref(&self, def: &'a ParamDefinition) -> ConfigResult<(&'a ParamDefinition, bool)> {
        let mut current = def;
        let mut nullable = def.nullable;
        for _ in 0..MAX_ALIAS_DEPTH {
            match &current.kind {
                TypeKind::Reference { to } => {
                    current = &self.resolve(to)?.definition;
                    nullable |= current.nullable;
                }
                _ => return Ok((current, nullable)),
            }
        }
        Err(ConfigurationError::InvalidDefinition {
            name: def.reference_name().unwrap_or_default().to_string(),
            reason: "reference chain does not terminate".to_string(),
        })
    }

    /// Allowed values of a named enum type.
    pub fn enum_values(&self, name: &str) -> ConfigResult<&'a [String]> {
        let def = self.resolve(name)?;
        def.definition
            .inline_enum()
            .ok_or_else(|| ConfigurationError::InvalidDefinition {
                name: name.to_string(),
                reason: "not an enum type".to_string(),
            })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Per-namespace store of named definitions.
///
/// Writes happen during load; afterwards the registry is read-only and may
/// be shared across request handlers without locking.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: BTreeMap<Scope, BTreeMap<String, Entry>>,
    /// Overrides the process-wide policy for this registry
    policy: Option<ErrorPolicy>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `policy` instead of the process-wide [`ErrorPolicy`].
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// The policy applied to configuration errors raised by this registry.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy.unwrap_or_else(ErrorPolicy::current)
    }

    fn fail(policy: Option<ErrorPolicy>, err: ConfigurationError) -> ConfigResult<()> {
        match policy {
            Some(policy) => policy.apply(err),
            None => ErrorPolicy::handle(err),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Allocate a placeholder for `name`.
    ///
    /// Returns `false` if the name already exists in this exact scope, which
    /// lets recursive builders stop instead of descending again.
    pub fn reserve(&mut self, name: &str, scope: &Scope) -> bool {
        let names = self.entries.entry(scope.clone()).or_default();
        if names.contains_key(name) {
            return false;
        }
        trace!(name = %name, scope = %scope, "Reserved type name");
        names.insert(name.to_string(), Entry::Placeholder);
        true
    }

    /// Populate a reserved placeholder.
    ///
    /// Defining an identical body twice is a no-op. Defining a name that
    /// was never reserved fails with [`ConfigurationError::UnknownType`].
    pub fn define(&mut self, def: TypeDef, scope: &Scope) -> ConfigResult<()> {
        if !self.exists_in(&def.name, scope) {
            return Self::fail(
                self.policy,
                ConfigurationError::UnknownType {
                    name: def.name,
                    scope: scope.to_string(),
                },
            );
        }
        self.insert(def, scope)
    }

    /// Register a type in one step. Idempotent for identical definitions.
    pub fn register(&mut self, def: TypeDef, scope: &Scope) -> ConfigResult<()> {
        self.insert(def, scope)
    }

    fn insert(&mut self, def: TypeDef, scope: &Scope) -> ConfigResult<()> {
        if let Err(err) = def.validate_shape() {
            return Self::fail(self.policy, err);
        }

        let policy = self.policy;
        let names = self.entries.entry(scope.clone()).or_default();
        match names.get(&def.name) {
            None | Some(Entry::Placeholder) => {
                debug!(
                    name = %def.name,
                    scope = %scope,
                    dependencies = def.dependencies().len(),
                    "Registered type"
                );
                names.insert(def.name.clone(), Entry::Defined(def));
                Ok(())
            }
            Some(Entry::Defined(existing)) if *existing == def => {
                trace!(name = %def.name, scope = %scope, "Identical re-registration ignored");
                Ok(())
            }
            Some(_) => Self::fail(
                policy,
                ConfigurationError::ConflictingDefinition {
                    name: def.name,
                    scope: scope.to_string(),
                },
            ),
        }
    }

    /// Make `name` in `scope` a re-export of `target` resolved from `target_scope`.
    pub fn alias(
        &mut self,
        name: &str,
        scope: &Scope,
        target: &str,
        target_scope: &Scope,
    ) -> ConfigResult<()> {
        let entry = Entry::Alias {
            scope: target_scope.clone(),
            name: target.to_string(),
        };
        let policy = self.policy;
        let names = self.entries.entry(scope.clone()).or_default();
        match names.get(name) {
            None | Some(Entry::Placeholder) => {
                debug!(
                    name = %name,
                    scope = %scope,
                    target = %target,
                    target_scope = %target_scope,
                    "Registered alias"
                );
                names.insert(name.to_string(), entry);
                Ok(())
            }
            Some(existing) if *existing == entry => Ok(()),
            Some(_) => Self::fail(
                policy,
                ConfigurationError::ConflictingDefinition {
                    name: name.to_string(),
                    scope: scope.to_string(),
                },
            ),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn exists_in(&self, name: &str, scope: &Scope) -> bool {
        self.entries
            .get(scope)
            .is_some_and(|names| names.contains_key(name))
    }

    /// Find the entry for `name`, walking the scope chain.
    pub fn lookup(&self, name: &str, scope: &Scope) -> Option<(Scope, &Entry)> {
        scope.chain().into_iter().find_map(|s| {
            let entry = self.entries.get(&s)?.get(name)?;
            Some((s, entry))
        })
    }

    /// Non-throwing existence check. Placeholders count as existing.
    pub fn exists(&self, name: &str, scope: &Scope) -> bool {
        self.lookup(name, scope).is_some()
    }

    /// Resolve `name` to its definition, following aliases.
    pub fn resolve(&self, name: &str, scope: &Scope) -> ConfigResult<&TypeDef> {
        let mut current_name = name.to_string();
        let mut current_scope = scope.clone();

        for _ in 0..MAX_ALIAS_DEPTH {
            match self.lookup(&current_name, &current_scope) {
                Some((_, Entry::Defined(def))) => return Ok(def),
                Some((found, Entry::Placeholder)) => {
                    return Err(ConfigurationError::UndefinedPlaceholder {
                        name: current_name,
                        scope: found.to_string(),
                    })
                }
                Some((_, Entry::Alias { scope, name })) => {
                    current_name = name.clone();
                    current_scope = scope.clone();
                }
                None => break,
            }
        }

        Err(ConfigurationError::UnknownType {
            name: current_name,
            scope: current_scope.to_string(),
        })
    }

    /// View this registry from `scope`.
    pub fn scoped<'a>(&'a self, scope: &'a Scope) -> ScopedRegistry<'a> {
        ScopedRegistry {
            registry: self,
            scope,
        }
    }

    /// Like [`resolve`](Self::resolve), returning `None` on failure.
    pub fn get(&self, name: &str, scope: &Scope) -> Option<&TypeDef> {
        self.resolve(name, scope).ok()
    }

    /// Names visible from `scope`; inner scopes shadow outer ones.
    pub fn visible_names(&self, scope: &Scope) -> BTreeMap<String, Scope> {
        let mut visible = BTreeMap::new();
        for s in scope.chain() {
            if let Some(names) = self.entries.get(&s) {
                for name in names.keys() {
                    visible.entry(name.clone()).or_insert_with(|| s.clone());
                }
            }
        }
        visible
    }

    /// All scopes that hold at least one entry.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.entries
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(scope, _)| scope)
    }

    /// Total number of entries across all scopes.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything. Used between tests and reloads.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // =========================================================================
    // Dependency analysis
    // =========================================================================

    /// Names `name` depends on, as seen from `scope`.
    fn dependencies(&self, name: &str, scope: &Scope) -> Vec<(String, Scope)> {
        match self.lookup(name, scope) {
            Some((found, Entry::Defined(def))) => def
                .dependencies()
                .into_iter()
                .map(|dep| (dep, found.clone()))
                .collect(),
            Some((_, Entry::Alias { scope, name })) => vec![(name.clone(), scope.clone())],
            _ => Vec::new(),
        }
    }

    /// References that resolve to nothing, as `(referencing type, missing name)`.
    pub fn unresolved_references(&self, scope: &Scope) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for (name, found) in self.visible_names(scope) {
            for (dep, dep_scope) in self.dependencies(&name, &found) {
                if self.resolve(&dep, &dep_scope).is_err() {
                    missing.push((name.clone(), dep));
                }
            }
        }
        missing
    }

    /// Names participating in at least one reference cycle.
    pub fn recursive_names(&self, scope: &Scope) -> BTreeSet<String> {
        let mut recursive = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = Vec::new();

        for (name, found) in self.visible_names(scope) {
            if !visited.contains(&name) {
                self.dfs_cycles(&name, &found, &mut visited, &mut stack, &mut recursive);
            }
        }

        recursive
    }

    fn dfs_cycles(
        &self,
        node: &str,
        scope: &Scope,
        visited: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
        recursive: &mut BTreeSet<String>,
    ) {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        for (dep, dep_scope) in self.dependencies(node, scope) {
            if !self.exists(&dep, &dep_scope) {
                continue;
            }
            if let Some(start) = stack.iter().position(|n| *n == dep) {
                recursive.extend(stack[start..].iter().cloned());
            } else if !visited.contains(&dep) {
                self.dfs_cycles(&dep, &dep_scope, visited, stack, recursive);
            } else if recursive.contains(&dep) && self.reaches(&dep, &dep_scope, stack) {
                recursive.extend(stack.iter().cloned());
            }
        }

        stack.pop();
    }

    /// Whether `from` can reach any name currently on `stack`.
    fn reaches(&self, from: &str, scope: &Scope, stack: &[String]) -> bool {
        let mut seen = BTreeSet::new();
        let mut pending = vec![(from.to_string(), scope.clone())];
        while let Some((name, scope)) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for (dep, dep_scope) in self.dependencies(&name, &scope) {
                if stack.contains(&dep) {
                    return true;
                }
                pending.push((dep, dep_scope));
            }
        }
        false
    }

    /// Every type visible from `scope`, dependencies before dependents.
    ///
    /// Depth-first over names in sorted order, so the result is identical for
    /// identical registry state. Alias targets living outside the scope chain
    /// are pulled in under their own names. Back edges of cycles are skipped;
    /// such references arrive before their target and generators must defer
    /// them.
    pub fn ordered(&self, scope: &Scope) -> ConfigResult<Vec<OrderedType<'_>>> {
        let recursive = self.recursive_names(scope);
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();

        for (name, found) in self.visible_names(scope) {
            self.visit(&name, &found, &recursive, &mut visited, &mut out)?;
        }

        debug!(scope = %scope, types = out.len(), "Ordered namespace types");
        Ok(out)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        scope: &Scope,
        recursive: &BTreeSet<String>,
        visited: &mut BTreeSet<String>,
        out: &mut Vec<OrderedType<'a>>,
    ) -> ConfigResult<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        for (dep, dep_scope) in self.dependencies(name, scope) {
            if self.exists(&dep, &dep_scope) {
                self.visit(&dep, &dep_scope, recursive, visited, out)?;
            }
        }

        let kind = match self.lookup(name, scope) {
            Some((_, Entry::Defined(def))) => OrderedKind::Defined(def),
            Some((_, Entry::Alias { name: target, .. })) => OrderedKind::Alias(target.clone()),
            Some((found, Entry::Placeholder)) => {
                return Err(ConfigurationError::UndefinedPlaceholder {
                    name: name.to_string(),
                    scope: found.to_string(),
                })
            }
            None => {
                return Err(ConfigurationError::UnknownType {
                    name: name.to_string(),
                    scope: scope.to_string(),
                })
            }
        };

        out.push(OrderedType {
            name: name.to_string(),
            kind,
            recursive: recursive.contains(name),
        });
        Ok(())
    }
}
