// src/config/mod.rs

//! Execution configuration.
//!
//! - [`model`] holds the raw (deserialized) and validated config types.
//! - [`loader`] reads TOML from a string or a file.
//! - [`validate`] turns a raw config into a checked [`ExecutionConfig`].

pub mod loader;
pub mod model;
pub mod validate;

pub use model::{ExecutionConfig, ExecutorSection, RawExecutionConfig};
