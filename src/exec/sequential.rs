// src/exec/sequential.rs

//! Sequential strategy: one node at a time in topological order.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dag::RequestGraph;
use crate::errors::Result;
use crate::exec::node_runner::invoke_lease;
use crate::exec::ExecutionRecord;
use crate::types::NodeStatus;

impl<D> RequestGraph<D> {
    /// Execute every node in [`execution_order`](Self::execution_order) on
    /// the calling thread.
    ///
    /// A failure that is not allowed marks all transitive dependents
    /// `skipped` and stops the run right away; nodes never reached stay
    /// `pending`. The returned records cover exactly the nodes that ran, in
    /// the order they ran.
    pub fn execute_sequential(&mut self, driver: &D) -> Result<Vec<ExecutionRecord>> {
        let order = self.sequential_order()?;
        let mut records = Vec::with_capacity(order.len());

        for slot in order {
            if self.nodes[slot].status != NodeStatus::Pending {
                continue;
            }

            let lease = self.begin(slot);
            let result = invoke_lease(&self.nodes[slot].id, &lease, driver);
            let blocks_dependents = self.settle(slot, lease, result);
            if self.finish_step(slot, blocks_dependents, &mut records) {
                break;
            }
        }

        info!(executed = records.len(), "sequential execution finished");
        Ok(records)
    }

    fn sequential_order(&self) -> Result<Vec<usize>> {
        let order = self.execution_order_slots()?;
        info!(nodes = order.len(), "starting sequential execution");
        Ok(order)
    }

    /// Record a settled node. Returns `true` when the run has to stop.
    fn finish_step(
        &mut self,
        slot: usize,
        blocks_dependents: bool,
        records: &mut Vec<ExecutionRecord>,
    ) -> bool {
        records.push(ExecutionRecord::from_node(&self.nodes[slot]));
        if !blocks_dependents {
            return false;
        }

        let skipped = self.mark_dependents_skipped(slot);
        warn!(
            node = %self.nodes[slot].id,
            skipped = ?self.owned_ids(&skipped),
            "stopping sequential execution after failure"
        );
        true
    }
}

impl<D> RequestGraph<D>
where
    D: Send + Sync + 'static,
{
    /// Same semantics as [`execute_sequential`](Self::execute_sequential),
    /// but each node executes on Tokio's blocking pool so the coordinating
    /// task never blocks the runtime.
    pub async fn execute_sequential_async(
        &mut self,
        driver: Arc<D>,
    ) -> Result<Vec<ExecutionRecord>> {
        let order = self.sequential_order()?;
        let mut records = Vec::with_capacity(order.len());

        for slot in order {
            if self.nodes[slot].status != NodeStatus::Pending {
                continue;
            }

            let blocks_dependents = self.run_blocking(slot, &driver).await;
            if self.finish_step(slot, blocks_dependents, &mut records) {
                break;
            }
        }

        info!(executed = records.len(), "sequential execution finished");
        Ok(records)
    }
}
