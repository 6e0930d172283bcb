// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::dag::edge::DependencyEdge;
use crate::dag::node::{NodeId, RequestNode};
use crate::errors::{GraphError, Result};
use crate::exec::results::ResultHistory;
use crate::exec::work::WorkResult;
use crate::types::NodeStatus;

/// Directed graph of requests for a single scheduling run.
///
/// Nodes live by value in an arena (`nodes`) in insertion order; `index`
/// maps ids to arena slots. Adjacency is kept per slot in both directions:
/// - `forward[i]`: slots that depend on `i`
/// - `reverse[i]`: slots that `i` depends on
///
/// Sets are ordered by slot so every neighbour listing comes out in
/// insertion order.
pub struct RequestGraph<D> {
    pub(crate) nodes: Vec<RequestNode<D>>,
    pub(crate) index: HashMap<NodeId, usize>,
    pub(crate) forward: Vec<BTreeSet<usize>>,
    pub(crate) reverse: Vec<BTreeSet<usize>>,
    pub(crate) edges: Vec<DependencyEdge>,
    pub(crate) history: ResultHistory,
}

impl<D> std::fmt::Debug for RequestGraph<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGraph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl<D> Default for RequestGraph<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> RequestGraph<D> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            forward: Vec::new(),
            reverse: Vec::new(),
            edges: Vec::new(),
            history: ResultHistory::new(),
        }
    }

    /// Register a node.
    ///
    /// If the id is already present the old node is replaced in place (last
    /// write wins); it keeps its insertion position and its edges.
    pub fn add_node(&mut self, node: RequestNode<D>) {
        if let Some(&slot) = self.index.get(node.id()) {
            debug!(node = %node.id(), "replacing existing node");
            self.nodes[slot] = node;
            return;
        }

        let slot = self.nodes.len();
        debug!(node = %node.id(), slot, "adding node");
        self.index.insert(node.id.clone(), slot);
        self.nodes.push(node);
        self.forward.push(BTreeSet::new());
        self.reverse.push(BTreeSet::new());
    }

    /// Register a dependency. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        let from = self.slot_of(&edge.from)?;
        let to = self.slot_of(&edge.to)?;

        debug!(
            from = %edge.from,
            to = %edge.to,
            kind = %edge.kind,
            "adding dependency"
        );

        self.forward[from].insert(to);
        self.reverse[to].insert(from);
        self.edges.push(edge);
        Ok(())
    }

    /// Remove every edge `from -> to`. Unknown ids or a missing edge are a
    /// no-op.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        let (Some(&f), Some(&t)) = (self.index.get(from), self.index.get(to)) else {
            return;
        };
        if !self.forward[f].remove(&t) {
            return;
        }
        self.reverse[t].remove(&f);
        self.edges.retain(|e| !e.connects(from, to));
        debug!(from, to, "removed dependency");
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.forward[f].contains(&t),
            _ => false,
        }
    }

    /// Nodes that `id` depends on. Unknown ids yield an empty list.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.index
            .get(id)
            .map(|&slot| self.ids_of(&self.reverse[slot]))
            .unwrap_or_default()
    }

    /// Nodes that depend on `id`. Unknown ids yield an empty list.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.index
            .get(id)
            .map(|&slot| self.ids_of(&self.forward[slot]))
            .unwrap_or_default()
    }

    pub fn node(&self, id: &str) -> Option<&RequestNode<D>> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn status_of(&self, id: &str) -> Option<NodeStatus> {
        self.node(id).map(RequestNode::status)
    }

    pub fn result_of(&self, id: &str) -> Option<&WorkResult> {
        self.node(id).and_then(RequestNode::result)
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(RequestNode::id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RequestNode<D>> {
        self.nodes.iter()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Results recorded so far in this run.
    pub fn history(&self) -> &ResultHistory {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn slot_of(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode { id: id.to_string() })
    }

    pub(crate) fn ids_of<'a>(&'a self, slots: impl IntoIterator<Item = &'a usize>) -> Vec<&'a str> {
        slots.into_iter().map(|&s| self.nodes[s].id()).collect()
    }

    pub(crate) fn owned_ids(&self, slots: &[usize]) -> Vec<String> {
        slots.iter().map(|&s| self.nodes[s].id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::work::Work;
    use crate::types::DependencyKind;

    struct Noop;

    impl Work<()> for Noop {
        fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
            Ok(WorkResult::success())
        }
    }

    fn graph(ids: &[&str]) -> RequestGraph<()> {
        let mut g = RequestGraph::new();
        for id in ids {
            g.add_node(RequestNode::new(*id, Noop));
        }
        g
    }

    #[test]
    fn adjacency_is_kept_in_both_directions() {
        let mut g = graph(&["A", "B", "C"]);
        g.add_edge(DependencyEdge::order("A", "C")).unwrap();
        g.add_edge(DependencyEdge::order("A", "B")).unwrap();
        g.add_edge(DependencyEdge::order("B", "C")).unwrap();

        assert_eq!(g.dependents_of("A"), vec!["B", "C"]);
        assert_eq!(g.dependencies_of("C"), vec!["A", "B"]);
        assert!(g.dependencies_of("A").is_empty());
        assert!(g.dependents_of("missing").is_empty());
        assert_eq!(g.edges().len(), 3);
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let mut g = graph(&["A"]);
        let err = g
            .add_edge(DependencyEdge::new("A", "ghost", DependencyKind::FileCreation))
            .unwrap_err();
        match err {
            GraphError::UnknownNode { id } => assert_eq!(id, "ghost"),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
        assert!(g.edges().is_empty());
        assert!(g.dependents_of("A").is_empty());
    }

    #[test]
    fn remove_edge_is_idempotent() {
        let mut g = graph(&["A", "B"]);
        g.add_edge(DependencyEdge::order("A", "B")).unwrap();

        g.remove_edge("B", "A");
        g.remove_edge("A", "nope");
        assert_eq!(g.edges().len(), 1);

        g.remove_edge("A", "B");
        g.remove_edge("A", "B");
        assert!(g.edges().is_empty());
        assert!(!g.has_edge("A", "B"));
        assert!(g.dependencies_of("B").is_empty());
    }

    #[test]
    fn re_adding_a_node_overwrites_in_place() {
        let mut g = graph(&["A", "B"]);
        g.add_edge(DependencyEdge::order("A", "B")).unwrap();

        g.add_node(RequestNode::new("A", Noop).with_metadata("v", "2"));

        assert_eq!(g.len(), 2);
        assert_eq!(g.node_ids().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(g.node("A").unwrap().metadata().get("v").map(String::as_str), Some("2"));
        assert!(g.has_edge("A", "B"));
    }
}
