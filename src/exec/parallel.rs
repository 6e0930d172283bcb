// src/exec/parallel.rs

//! Parallel strategy: group by group, members of a group on a bounded pool.
//!
//! `Work::execute` is blocking, so every member runs on Tokio's blocking
//! threads, a lone member included. The coordinator keeps at most `workers`
//! of them in flight and refills the pool as members finish; completions fan
//! back in through a [`JoinSet`].

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::dag::RequestGraph;
use crate::errors::Result;
use crate::exec::node_runner::{invoke_lease, Lease, WORKER_LOST};
use crate::exec::work::WorkResult;
use crate::exec::ExecutionRecord;
use crate::types::NodeStatus;

/// What a pool worker hands back: the slot it ran, the work it borrowed and
/// the outcome.
type Completion<D> = (usize, Lease<D>, WorkResult);

impl<D> RequestGraph<D>
where
    D: Send + Sync + 'static,
{
    /// Execute the graph group by group with at most `max_workers` requests
    /// running at once.
    ///
    /// Nodes depending on a failed (or skipped) node are skipped without
    /// running. Only `pending` nodes are dispatched, so calling this again on
    /// a finished graph runs nothing. The returned records follow the
    /// topological order and include a synthetic "skipped" result for every
    /// skipped node.
    pub async fn execute_parallel(
        &mut self,
        driver: Arc<D>,
        max_workers: usize,
    ) -> Result<Vec<ExecutionRecord>> {
        let groups = self.parallel_group_slots()?;
        let order = self.execution_order_slots()?;
        let max_workers = max_workers.max(1);

        info!(
            nodes = order.len(),
            groups = groups.len(),
            max_workers,
            "starting parallel execution"
        );

        // Nodes whose dependents must not run: failures that do not allow
        // failure, plus everything skipped because of them. Seeded from any
        // earlier run on this graph.
        let mut failed_nodes: HashSet<usize> = (0..self.nodes.len())
            .filter(|&slot| self.blocks_dependents(slot))
            .collect();

        for (index, group) in groups.into_iter().enumerate() {
            let pending: Vec<usize> = group
                .into_iter()
                .filter(|&slot| self.nodes[slot].status == NodeStatus::Pending)
                .collect();
            let (runnable, blocked): (Vec<usize>, Vec<usize>) = pending
                .into_iter()
                .partition(|&slot| self.reverse[slot].iter().all(|dep| !failed_nodes.contains(dep)));

            for &slot in &blocked {
                self.nodes[slot].transition(NodeStatus::Skipped);
                failed_nodes.insert(slot);
            }
            if !blocked.is_empty() {
                info!(
                    group = index,
                    skipped = ?self.owned_ids(&blocked),
                    "skipping nodes blocked by failed dependencies"
                );
            }

            let newly_failed = match runnable.len() {
                0 => Vec::new(),
                1 => self.run_alone(runnable[0], &driver).await,
                _ => self.run_pool(index, runnable, &driver, max_workers).await,
            };
            failed_nodes.extend(newly_failed);
        }

        let records: Vec<ExecutionRecord> = order
            .into_iter()
            .filter_map(|slot| {
                let node = &self.nodes[slot];
                match node.status {
                    NodeStatus::Completed | NodeStatus::Failed => Some(ExecutionRecord::from_node(node)),
                    NodeStatus::Skipped => Some(ExecutionRecord::skipped(node)),
                    NodeStatus::Pending | NodeStatus::Running => None,
                }
            })
            .collect();

        info!(records = records.len(), "parallel execution finished");
        Ok(records)
    }

    fn blocks_dependents(&self, slot: usize) -> bool {
        let node = &self.nodes[slot];
        match node.status {
            NodeStatus::Skipped => true,
            NodeStatus::Failed => !node.work.as_ref().is_some_and(|w| w.allow_failure()),
            _ => false,
        }
    }

    /// Run a lone group member without a pool. Returns the slot if it blocks
    /// its dependents.
    async fn run_alone(&mut self, slot: usize, driver: &Arc<D>) -> Vec<usize> {
        if self.run_blocking(slot, driver).await {
            vec![slot]
        } else {
            Vec::new()
        }
    }

    /// Run several group members on a pool of `min(max_workers, members)`
    /// blocking workers and wait for all of them. Returns the slots whose
    /// failure blocks their dependents.
    async fn run_pool(
        &mut self,
        group: usize,
        members: Vec<usize>,
        driver: &Arc<D>,
        max_workers: usize,
    ) -> Vec<usize> {
        let workers = max_workers.min(members.len());
        debug!(group, members = members.len(), workers, "dispatching group to worker pool");

        let mut queue = members.into_iter();
        let mut in_flight: JoinSet<Completion<D>> = JoinSet::new();
        let mut outstanding: BTreeSet<usize> = BTreeSet::new();
        let mut failures = Vec::new();

        for slot in queue.by_ref().take(workers) {
            self.dispatch(&mut in_flight, &mut outstanding, slot, driver);
        }

        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((slot, lease, result)) => {
                    outstanding.remove(&slot);
                    if self.settle(slot, lease, result) {
                        failures.push(slot);
                    }
                }
                Err(err) => {
                    error!(group, error = %err, "worker task did not complete");
                }
            }

            if let Some(slot) = queue.next() {
                self.dispatch(&mut in_flight, &mut outstanding, slot, driver);
            }
        }

        // A worker that died without reporting back leaves its node running.
        for slot in outstanding {
            let result = WorkResult::failure(WORKER_LOST);
            if self.settle(slot, None, result) {
                failures.push(slot);
            }
        }

        failures
    }

    fn dispatch(
        &mut self,
        in_flight: &mut JoinSet<Completion<D>>,
        outstanding: &mut BTreeSet<usize>,
        slot: usize,
        driver: &Arc<D>,
    ) {
        let lease = self.begin(slot);
        let node_id = self.nodes[slot].id.clone();
        let driver = Arc::clone(driver);
        outstanding.insert(slot);

        in_flight.spawn_blocking(move || {
            let result = invoke_lease(&node_id, &lease, driver.as_ref());
            (slot, lease, result)
        });
    }
}
