//! # contract-rs
//!
//! Declarative API contracts: one type description drives request parsing,
//! response shaping and TypeScript, Zod and OpenAPI generation, so clients
//! and server cannot disagree about the wire format.
//!
//! ## Overview
//!
//! Types are described once as a [`ParamDefinition`] tree and registered
//! under a name in a [`TypeRegistry`]. From there:
//!
//! - the [`Pipeline`] coerces, validates and decodes inbound query and body
//!   params, and encodes and checks outbound responses;
//! - [`validate`](validate::validate) reports every problem as an
//!   [`Issue`] with an RFC 6901 pointer into the payload;
//! - the [`generator`] module emits TypeScript declarations, Zod schemas
//!   and an OpenAPI 3.1 document from the same registry;
//! - the [`resource`] module derives read types, create/update payloads,
//!   nested operations, filters and sorts from attribute and association
//!   declarations.
//!
//! ## Quick Start
//!
//! ```rust
//! use contract_rs::generator::{generate_namespace, GeneratorConfig, ZodGenerator};
//! use contract_rs::ir::{Field, ParamDefinition, TypeDef};
//! use contract_rs::pipeline::{Direction, KeyCase, NamespaceConfig, Pipeline};
//! use contract_rs::registry::{Scope, TypeRegistry};
//! use serde_json::json;
//!
//! let mut registry = TypeRegistry::new();
//! let scope = Scope::api("billing");
//! let invoice = ParamDefinition::object(vec![
//!     Field::new("number", ParamDefinition::string().with_min(1.0)),
//!     Field::new("notes", ParamDefinition::string().nullable().optional()),
//! ]);
//! registry.register(TypeDef::new("Invoice", invoice.clone()), &scope).unwrap();
//!
//! // Requests
//! let pipeline = Pipeline::new(&registry, &scope, NamespaceConfig::new("billing"));
//! let params = pipeline.parse(Direction::Body, json!({ "number": "INV-1" }), &invoice).unwrap();
//! assert_eq!(params, json!({ "number": "INV-1" }));
//!
//! let err = pipeline.parse(Direction::Body, json!({ "notes": null }), &invoice).unwrap_err();
//! assert_eq!(err.status_code(), 400);
//!
//! // Clients
//! let config = GeneratorConfig::default().with_key_case(KeyCase::Camel);
//! let zod = generate_namespace(&ZodGenerator::new(), &registry, &scope, &config).unwrap();
//! assert!(zod.contains("export const InvoiceSchema = z.object({"));
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ir`] | Type descriptors |
//! | [`registry`] | Scoped, two-phase type registration |
//! | [`coerce`] | Lenient scalar coercion of wire values |
//! | [`validate`] | Strict validation producing issues |
//! | [`issue`] | Issue codes, pointers and collections |
//! | [`pipeline`] | Direction-aware request/response processing |
//! | [`generator`] | TypeScript, Zod and OpenAPI output |
//! | [`resource`] | Derived resource payloads |
//! | [`error`] | Error types and the configuration error policy |

pub mod coerce;
pub mod error;
pub mod generator;
pub mod ir;
pub mod issue;
pub mod pipeline;
pub mod registry;
pub mod resource;
pub mod validate;

pub use error::{ConfigurationError, ErrorPolicy, GeneratorError, PipelineError};
pub use generator::{
    generate_namespace, CodeGenerator, GeneratorConfig, OpenApiGenerator, TypeScriptGenerator,
    ZodGenerator,
};
pub use ir::{Field, ParamDefinition, TypeDef, TypeKind};
pub use issue::{Issue, IssueCode, IssueCollection};
pub use pipeline::{Direction, KeyCase, NamespaceConfig, Pipeline};
pub use registry::{Scope, TypeRegistry};
pub use resource::{ResourceCatalog, ResourceDefinition};
