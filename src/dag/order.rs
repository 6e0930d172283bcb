// src/dag/order.rs

//! Topological ordering (Kahn's algorithm) and parallel grouping.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::{debug, error};

use crate::dag::graph::RequestGraph;
use crate::errors::{GraphError, Result};

impl<D> RequestGraph<D> {
    /// Linear execution order respecting every edge.
    ///
    /// When several nodes are ready at the same time the one that was added
    /// first goes first, so the same graph always yields the same order.
    ///
    /// Fails with [`GraphError::CycleDetected`] if the graph has cycles.
    pub fn execution_order(&self) -> Result<Vec<String>> {
        let order = self.execution_order_slots()?;
        Ok(self.owned_ids(&order))
    }

    /// Ordered groups of mutually independent nodes.
    ///
    /// Running every member of group `i` before starting group `i + 1` is
    /// always safe; members of one group may run concurrently. Members are
    /// listed in insertion order.
    pub fn parallel_groups(&self) -> Result<Vec<Vec<String>>> {
        let groups = self.parallel_group_slots()?;
        Ok(groups.iter().map(|g| self.owned_ids(g)).collect())
    }

    pub(crate) fn ensure_acyclic(&self) -> Result<()> {
        let cycles = self.detect_cycle_slots();
        if cycles.is_empty() {
            return Ok(());
        }
        let report = self.format_cycle_error();
        Err(GraphError::CycleDetected {
            cycles: cycles.iter().map(|c| self.owned_ids(c)).collect(),
            report,
        })
    }

    pub(crate) fn execution_order_slots(&self) -> Result<Vec<usize>> {
        self.ensure_acyclic()?;

        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = vec![0; n];
        for targets in &self.forward {
            for &t in targets {
                in_degree[t] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&slot| in_degree[slot] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(slot)) = ready.pop() {
            order.push(slot);
            for &next in &self.forward[slot] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != n {
            let remaining: Vec<usize> = (0..n).filter(|&s| in_degree[s] > 0).collect();
            error!(
                ordered = order.len(),
                total = n,
                "topological sort left nodes unordered"
            );
            return Err(GraphError::DeadlockInternal {
                remaining: self.owned_ids(&remaining),
            });
        }

        debug!(order = ?self.owned_ids(&order), "computed execution order");
        Ok(order)
    }

    pub(crate) fn parallel_group_slots(&self) -> Result<Vec<Vec<usize>>> {
        self.ensure_acyclic()?;

        let mut completed = vec![false; self.nodes.len()];
        let mut remaining: Vec<usize> = (0..self.nodes.len()).collect();
        let mut groups = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<usize>, Vec<usize>) = remaining
                .iter()
                .partition(|&&slot| self.reverse[slot].iter().all(|&dep| completed[dep]));

            if ready.is_empty() {
                error!(
                    remaining = ?self.owned_ids(&blocked),
                    "no ready nodes while grouping; graph is not a DAG"
                );
                return Err(GraphError::DeadlockInternal {
                    remaining: self.owned_ids(&blocked),
                });
            }

            for &slot in &ready {
                completed[slot] = true;
            }
            debug!(group = groups.len(), members = ?self.owned_ids(&ready), "parallel group");
            groups.push(ready);
            remaining = blocked;
        }

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::{DependencyEdge, RequestGraph, RequestNode};
    use crate::errors::GraphError;
    use crate::exec::work::{Work, WorkResult};

    struct Noop;

    impl Work<()> for Noop {
        fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
            Ok(WorkResult::success())
        }
    }

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> RequestGraph<()> {
        let mut g = RequestGraph::new();
        for id in ids {
            g.add_node(RequestNode::new(*id, Noop));
        }
        for (from, to) in edges {
            g.add_edge(DependencyEdge::order(*from, *to)).unwrap();
        }
        g
    }

    #[test]
    fn ties_are_broken_by_insertion_order() {
        let g = graph(&["C", "A", "B", "D"], &[("B", "D"), ("C", "D")]);
        assert_eq!(g.execution_order().unwrap(), vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn later_inserted_node_can_come_first_when_it_unblocks_earlier_ones() {
        let g = graph(&["X", "Y", "Z"], &[("Z", "X")]);
        assert_eq!(g.execution_order().unwrap(), vec!["Y", "Z", "X"]);
    }

    #[test]
    fn groups_follow_dependency_levels() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert_eq!(
            g.parallel_groups().unwrap(),
            vec![vec!["A"], vec!["B", "C"], vec!["D"]]
        );
    }

    #[test]
    fn empty_graph_orders_to_nothing() {
        let g = graph(&[], &[]);
        assert!(g.execution_order().unwrap().is_empty());
        assert!(g.parallel_groups().unwrap().is_empty());
    }

    #[test]
    fn cyclic_graph_cannot_be_grouped() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        match g.parallel_groups() {
            Err(GraphError::CycleDetected { cycles, report }) => {
                assert_eq!(cycles, vec![vec!["A".to_string(), "B".to_string()]]);
                assert!(report.contains("A -> B -> A"));
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }
}
