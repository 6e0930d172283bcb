// src/dag/mod.rs

//! Request graph representation and the algorithms over it.
//!
//! - [`node`] and [`edge`] define the vertices and dependencies.
//! - [`graph`] holds the node registry and the adjacency index.
//! - [`cycles`] finds every cycle with a three-colour DFS.
//! - [`order`] produces the topological order and the parallel groups.
//! - [`infer`] derives edges from declared file/directory resources.
//! - [`report`] renders diagnostics (dumps, cycle errors, DOT).
//!
//! Execution lives in [`crate::exec`], which adds the running strategies on
//! top of [`RequestGraph`].

pub mod cycles;
pub mod edge;
pub mod graph;
pub mod infer;
pub mod node;
pub mod order;
pub mod report;

pub use edge::DependencyEdge;
pub use graph::RequestGraph;
pub use infer::is_parent_directory;
pub use node::{NodeId, NodeResources, RequestNode};
pub use report::{CycleInfo, CycleLink};
