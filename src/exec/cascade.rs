// src/exec/cascade.rs

//! Failure cascading: skipping everything downstream of a failed node.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::RequestGraph;
use crate::types::NodeStatus;

impl<D> RequestGraph<D> {
    /// Mark every transitive dependent of `failed` that is still `pending`
    /// as `skipped`.
    ///
    /// Uses an explicit worklist so arbitrarily deep graphs are fine. Returns
    /// the slots that were newly skipped.
    pub(crate) fn mark_dependents_skipped(&mut self, failed: usize) -> Vec<usize> {
        let mut stack: Vec<usize> = self.forward[failed].iter().copied().collect();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut skipped = Vec::new();

        while let Some(slot) = stack.pop() {
            if !visited.insert(slot) {
                continue;
            }

            let node = &mut self.nodes[slot];
            if node.status != NodeStatus::Pending {
                continue;
            }
            node.transition(NodeStatus::Skipped);
            debug!(node = %node.id, "skipping dependent of failed request");
            skipped.push(slot);
            stack.extend(self.forward[slot].iter().copied());
        }

        skipped
    }
}
