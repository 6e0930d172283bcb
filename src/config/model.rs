// src/config/model.rs

use serde::Deserialize;

use crate::types::ExecutionStrategy;

pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Config file as deserialized, before any validation.
///
/// ```toml
/// [executor]
/// strategy = "parallel"
/// max_workers = 4
/// cap_to_cpus = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExecutionConfig {
    #[serde(default)]
    pub executor: ExecutorSection,
}

/// The `[executor]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    #[serde(default)]
    pub strategy: ExecutionStrategy,

    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Limit the pool to twice the number of available CPUs.
    #[serde(default = "default_cap_to_cpus")]
    pub cap_to_cpus: bool,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            max_workers: default_max_workers(),
            cap_to_cpus: default_cap_to_cpus(),
        }
    }
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_cap_to_cpus() -> bool {
    true
}

/// Validated execution settings.
///
/// Only obtainable through `TryFrom<RawExecutionConfig>` or
/// [`ExecutionConfig::new`], both of which guarantee `max_workers >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub strategy: ExecutionStrategy,
    pub max_workers: usize,
    pub cap_to_cpus: bool,
}

impl ExecutionConfig {
    /// Build a config directly. `max_workers` of zero is raised to one.
    pub fn new(strategy: ExecutionStrategy, max_workers: usize) -> Self {
        Self {
            strategy,
            max_workers: max_workers.max(1),
            cap_to_cpus: false,
        }
    }

    pub fn sequential() -> Self {
        Self::new(ExecutionStrategy::Sequential, 1)
    }

    pub fn with_cpu_cap(mut self, cap: bool) -> Self {
        self.cap_to_cpus = cap;
        self
    }

    /// Worker count the parallel strategy should use.
    pub fn effective_workers(&self) -> usize {
        if !self.cap_to_cpus {
            return self.max_workers;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.min(cpus * 2).max(1)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            cap_to_cpus: true,
        }
    }
}
