//! Zod schema generator.
//!
//! # Components
//!
//! - [`ZodGenerator`] - The code generator implementing [`CodeGenerator`](crate::generator::CodeGenerator)
//! - [`ZodTypeMapper`] - Maps descriptors to Zod schema strings

pub mod emitter;
pub mod type_mapper;

pub use emitter::ZodGenerator;
pub use type_mapper::{schema_name, ZodTypeMapper};
