// src/dag/edge.rs

use crate::dag::node::NodeId;
use crate::types::DependencyKind;

/// Directed dependency `from -> to`: `to` must not start before `from` has
/// finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: DependencyKind,
    /// Resource the two nodes contend for, if any.
    pub resource_path: Option<String>,
    /// Explanation shown in cycle reports.
    pub description: Option<String>,
}

impl DependencyEdge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, kind: DependencyKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            resource_path: None,
            description: None,
        }
    }

    /// Shorthand for an [`DependencyKind::ExecutionOrder`] edge.
    pub fn order(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::new(from, to, DependencyKind::ExecutionOrder)
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn connects(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}
