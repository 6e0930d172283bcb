// src/config/validate.rs

use crate::config::model::{ExecutionConfig, RawExecutionConfig};
use crate::errors::{GraphError, Result};

impl TryFrom<RawExecutionConfig> for ExecutionConfig {
    type Error = GraphError;

    fn try_from(raw: RawExecutionConfig) -> std::result::Result<Self, Self::Error> {
        validate_executor(&raw)?;
        let section = raw.executor;
        Ok(ExecutionConfig {
            strategy: section.strategy,
            max_workers: section.max_workers,
            cap_to_cpus: section.cap_to_cpus,
        })
    }
}

fn validate_executor(cfg: &RawExecutionConfig) -> Result<()> {
    if cfg.executor.max_workers == 0 {
        return Err(GraphError::ConfigError(
            "[executor].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
