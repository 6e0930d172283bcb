// src/exec/mod.rs

//! Execution layer.
//!
//! This module drives the [`Work`] attached to each node of a
//! [`RequestGraph`] and reports back per-node [`ExecutionRecord`]s.
//!
//! - [`work`] defines the work contract and [`WorkResult`].
//! - [`results`] keeps the result history and resolves placeholders.
//! - [`node_runner`] hands a node's work out, invokes it and settles the
//!   outcome back into the graph.
//! - [`cascade`] skips the transitive dependents of a failure.
//! - [`sequential`] and [`parallel`] are the two strategies.

pub mod cascade;
pub mod node_runner;
pub mod parallel;
pub mod results;
pub mod sequential;
pub mod work;

use std::sync::Arc;

use tracing::info;

use crate::config::ExecutionConfig;
use crate::dag::{RequestGraph, RequestNode};
use crate::errors::Result;
use crate::types::{ExecutionStrategy, NodeStatus};

pub use results::ResultHistory;
pub use work::{Work, WorkResult};

/// Outcome of one node in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub node_id: String,
    pub status: NodeStatus,
    pub result: WorkResult,
}

impl ExecutionRecord {
    pub(crate) fn from_node<D>(node: &RequestNode<D>) -> Self {
        Self {
            node_id: node.id().to_string(),
            status: node.status(),
            result: node.result().cloned().unwrap_or_default(),
        }
    }

    pub(crate) fn skipped<D>(node: &RequestNode<D>) -> Self {
        Self {
            node_id: node.id().to_string(),
            status: NodeStatus::Skipped,
            result: WorkResult::skipped(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == NodeStatus::Completed
    }
}

impl<D> RequestGraph<D>
where
    D: Send + Sync + 'static,
{
    /// Execute the graph with the strategy and worker limit from `config`.
    pub async fn run(
        &mut self,
        driver: Arc<D>,
        config: &ExecutionConfig,
    ) -> Result<Vec<ExecutionRecord>> {
        info!(
            strategy = ?config.strategy,
            max_workers = config.max_workers,
            "running request graph"
        );
        match config.strategy {
            ExecutionStrategy::Sequential => self.execute_sequential_async(driver).await,
            ExecutionStrategy::Parallel => {
                self.execute_parallel(driver, config.effective_workers())
                    .await
            }
        }
    }
}
