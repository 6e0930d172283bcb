// src/dag/cycles.rs

//! Cycle detection using a three-colour depth-first search.

use tracing::debug;

use crate::dag::graph::RequestGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    /// Not visited yet.
    White,
    /// On the current DFS path.
    Gray,
    /// Fully explored.
    Black,
}

impl<D> RequestGraph<D> {
    /// Find every cycle in the graph.
    ///
    /// Each cycle is the list of node ids along the ring, starting at the node
    /// the search re-entered; the edge from the last id back to the first
    /// closes it. A self loop is reported as a one-node cycle. Returns an
    /// empty list for an acyclic graph.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        self.detect_cycle_slots()
            .iter()
            .map(|cycle| self.owned_ids(cycle))
            .collect()
    }

    pub fn has_cycles(&self) -> bool {
        !self.detect_cycle_slots().is_empty()
    }

    /// Slot-based search shared by the sorter and the grouper.
    ///
    /// Iterative rather than recursive so that very deep chains cannot
    /// exhaust the call stack. Roots and neighbours are visited in insertion
    /// order, which makes the output deterministic.
    pub(crate) fn detect_cycle_slots(&self) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let mut colour = vec![Colour::White; n];
        // Position of a gray slot within `path`.
        let mut path_pos: Vec<Option<usize>> = vec![None; n];
        let mut cycles = Vec::new();

        for root in 0..n {
            if colour[root] != Colour::White {
                continue;
            }

            let mut path: Vec<usize> = Vec::new();
            // (slot, neighbours of that slot still to visit)
            let mut stack: Vec<(usize, std::collections::btree_set::Iter<'_, usize>)> = Vec::new();

            colour[root] = Colour::Gray;
            path_pos[root] = Some(path.len());
            path.push(root);
            stack.push((root, self.forward[root].iter()));

            while let Some((slot, neighbours)) = stack.last_mut() {
                match neighbours.next() {
                    Some(&next) => match colour[next] {
                        Colour::Gray => {
                            let start = path_pos[next].unwrap_or(0);
                            let cycle = path[start..].to_vec();
                            debug!(
                                cycle = ?self.owned_ids(&cycle),
                                "cycle detected"
                            );
                            cycles.push(cycle);
                        }
                        Colour::White => {
                            colour[next] = Colour::Gray;
                            path_pos[next] = Some(path.len());
                            path.push(next);
                            stack.push((next, self.forward[next].iter()));
                        }
                        Colour::Black => {}
                    },
                    None => {
                        let done = *slot;
                        colour[done] = Colour::Black;
                        path_pos[done] = None;
                        path.pop();
                        stack.pop();
                    }
                }
            }
        }

        cycles
    }
}
