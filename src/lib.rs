// src/lib.rs

//! Dependency-aware scheduling of request graphs.
//!
//! A [`RequestGraph`] holds opaque units of [`Work`] as nodes and typed
//! dependency edges between them. The graph can be checked for cycles,
//! ordered topologically, split into groups of mutually independent nodes,
//! and executed either sequentially or on a bounded worker pool. A failed
//! node causes its transitive dependents to be skipped unless its work
//! allows failure.
//!
//! ```no_run
//! use std::sync::Arc;
//! use reqgraph::{DependencyEdge, ExecutionConfig, RequestGraph, RequestNode, Work, WorkResult};
//!
//! struct Step(&'static str);
//!
//! impl Work<()> for Step {
//!     fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
//!         println!("{}", self.0);
//!         Ok(WorkResult::success())
//!     }
//! }
//!
//! # async fn demo() -> reqgraph::Result<()> {
//! let mut graph = RequestGraph::new();
//! graph.add_node(RequestNode::new("fetch", Step("fetch")));
//! graph.add_node(RequestNode::new("build", Step("build")));
//! graph.add_edge(DependencyEdge::order("fetch", "build"))?;
//!
//! let records = graph.run(Arc::new(()), &ExecutionConfig::default()).await?;
//! assert!(records.iter().all(|r| r.succeeded()));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

pub use config::ExecutionConfig;
pub use dag::{
    CycleInfo, CycleLink, DependencyEdge, NodeId, NodeResources, RequestGraph, RequestNode,
    is_parent_directory,
};
pub use errors::{GraphError, Result};
pub use exec::{ExecutionRecord, ResultHistory, Work, WorkResult};
pub use types::{DependencyKind, ExecutionStrategy, NodeStatus};
