//! # contract-rs-cli
//!
//! CLI library for turning contract documents into TypeScript, Zod and
//! OpenAPI output.
//!
//! This crate provides the core functionality for the `contract-rs` CLI
//! tool: contract discovery, registry population, generation, drift checks
//! and file output.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`loader`] - Contract document discovery and parsing
//! - [`generator`] - Registry population and generator runs
//! - [`writer`] - File output and dry-run support
//! - [`error`] - Error types and handling

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod writer;

pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use generator::{ContractGenerator, ContractSet};
pub use loader::{ContractDocument, ContractLoader};
pub use writer::FileWriter;
