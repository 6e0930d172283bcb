// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ExecutionConfig, RawExecutionConfig};
use crate::errors::Result;

/// Parse TOML text into a `RawExecutionConfig` without validating it.
pub fn load_from_str(contents: &str) -> Result<RawExecutionConfig> {
    let config: RawExecutionConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Read and parse a config file. No semantic validation happens here; use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawExecutionConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading execution config");
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Read, parse and validate a config file.
///
/// Missing keys fall back to their defaults; `max_workers` must be at least
/// one.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExecutionConfig> {
    let raw = load_from_path(path)?;
    ExecutionConfig::try_from(raw)
}
