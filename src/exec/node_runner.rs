// src/exec/node_runner.rs

//! Running a single node: handing its work out, invoking it, and settling the
//! outcome back into the graph.
//!
//! Only the coordinating task calls [`RequestGraph::begin`] and
//! [`RequestGraph::settle`]. Between the two calls the work is owned by
//! whoever runs it (the coordinator itself, or one pool worker), so no two
//! writers ever touch the same node.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::dag::RequestGraph;
use crate::exec::work::{Work, WorkResult};
use crate::types::NodeStatus;

/// Work handed out for one execution, or `None` if the node had none.
pub(crate) type Lease<D> = Option<Box<dyn Work<D>>>;

const MISSING_WORK: &str = "node has no work attached";

pub(crate) const WORKER_LOST: &str = "worker terminated before reporting a result";

/// Call `execute`, turning both `Err` returns and panics into a failed
/// [`WorkResult`].
pub(crate) fn invoke<D>(node_id: &str, work: &dyn Work<D>, driver: &D) -> WorkResult {
    debug!(node = %node_id, label = %work.label(), "executing request");

    match panic::catch_unwind(AssertUnwindSafe(|| work.execute(driver))) {
        Ok(Ok(result)) => {
            if result.success {
                debug!(node = %node_id, "request succeeded");
            } else {
                warn!(
                    node = %node_id,
                    error = result.error_message.as_deref().unwrap_or(""),
                    "request reported failure"
                );
            }
            result
        }
        Ok(Err(err)) => {
            warn!(node = %node_id, error = %err, "request returned an error");
            WorkResult::failure(format!("{err:#}"))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(node = %node_id, panic = %message, "request panicked");
            WorkResult::failure(format!("request panicked: {message}"))
        }
    }
}

/// Run a leased work item, or report the missing work as a failure.
pub(crate) fn invoke_lease<D>(node_id: &str, lease: &Lease<D>, driver: &D) -> WorkResult {
    match lease {
        Some(work) => invoke(node_id, work.as_ref(), driver),
        None => {
            error!(node = %node_id, "{MISSING_WORK}");
            WorkResult::failure(MISSING_WORK)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl<D> RequestGraph<D> {
    /// Take the node's work out of the arena and mark the node `running`.
    ///
    /// Placeholders are resolved against the results recorded so far before
    /// the work leaves the coordinator.
    pub(crate) fn begin(&mut self, slot: usize) -> Lease<D> {
        let node = &mut self.nodes[slot];
        let mut lease = node.work.take();
        if let Some(work) = lease.as_mut() {
            work.resolve_placeholders(&self.history);
            node.last_label = work.label();
        }
        node.transition(NodeStatus::Running);
        info!(node = %node.id, "request started");
        lease
    }

    /// Put the work back, record the result and move the node to its final
    /// status.
    ///
    /// Returns `true` when the failure must block the node's dependents, i.e.
    /// the request failed and does not allow failure.
    pub(crate) fn settle(&mut self, slot: usize, lease: Lease<D>, result: WorkResult) -> bool {
        let node = &mut self.nodes[slot];
        if lease.is_some() {
            node.work = lease;
        }

        let success = result.success;
        node.transition(if success {
            NodeStatus::Completed
        } else {
            NodeStatus::Failed
        });
        self.history.record(&node.id, result.clone());
        node.record_result(result);

        if success {
            info!(node = %node.id, "request completed");
            return false;
        }

        let allow_failure = node.work.as_ref().is_some_and(|w| w.allow_failure());
        if allow_failure {
            info!(node = %node.id, "request failed but allows failure; dependents stay runnable");
        } else {
            warn!(node = %node.id, "request failed; dependents will be skipped");
        }
        !allow_failure
    }
}

impl<D> RequestGraph<D>
where
    D: Send + Sync + 'static,
{
    /// Run one node on Tokio's blocking pool and settle it.
    ///
    /// Work executes on a blocking thread whether or not other nodes run
    /// beside it, so it may enter the runtime (e.g. `Handle::block_on`).
    /// Returns `true` when the failure blocks the node's dependents.
    pub(crate) async fn run_blocking(&mut self, slot: usize, driver: &Arc<D>) -> bool {
        let lease = self.begin(slot);
        let node_id = self.nodes[slot].id.clone();
        let driver = Arc::clone(driver);

        let joined = tokio::task::spawn_blocking(move || {
            let result = invoke_lease(&node_id, &lease, driver.as_ref());
            (lease, result)
        })
        .await;

        match joined {
            Ok((lease, result)) => self.settle(slot, lease, result),
            Err(err) => {
                error!(node = %self.nodes[slot].id, error = %err, "worker task did not complete");
                self.settle(slot, None, WorkResult::failure(WORKER_LOST))
            }
        }
    }
}
