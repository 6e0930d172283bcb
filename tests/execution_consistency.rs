mod common;

use std::sync::Arc;

use common::{GraphBuilder, init_tracing, with_timeout};
use reqgraph::{
    ExecutionConfig, NodeStatus, RequestGraph, RequestNode, Work, WorkResult,
};
use tokio::runtime::Handle;

/// Work that drives a future to completion from inside `execute`, the way a
/// synchronous client wrapping an async library would.
struct BlocksOnRuntime;

impl Work<()> for BlocksOnRuntime {
    fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
        let answer = Handle::try_current()?.block_on(async { 42 });
        Ok(WorkResult::success().with_output("answer", answer.to_string()))
    }
}

fn runtime_graph(ids: &[&str]) -> RequestGraph<()> {
    let mut graph = RequestGraph::new();
    for id in ids {
        graph.add_node(RequestNode::new(*id, BlocksOnRuntime));
    }
    graph
}

fn statuses(graph: &RequestGraph<()>) -> Vec<NodeStatus> {
    graph.nodes().map(|n| n.status()).collect()
}

#[tokio::test]
async fn lone_group_member_behaves_like_pooled_members() {
    init_tracing();
    let mut alone = runtime_graph(&["solo"]);
    let mut together = runtime_graph(&["left", "right"]);

    with_timeout(alone.execute_parallel(Arc::new(()), 4))
        .await
        .unwrap();
    with_timeout(together.execute_parallel(Arc::new(()), 4))
        .await
        .unwrap();

    assert_eq!(statuses(&alone), vec![NodeStatus::Completed]);
    assert_eq!(
        statuses(&together),
        vec![NodeStatus::Completed, NodeStatus::Completed]
    );
    assert_eq!(
        alone.result_of("solo").and_then(|r| r.field("answer")).as_deref(),
        Some("42")
    );
}

#[tokio::test]
async fn configured_sequential_run_keeps_work_off_the_runtime() {
    init_tracing();
    let mut graph = runtime_graph(&["first", "second"]);

    let records = with_timeout(graph.run(Arc::new(()), &ExecutionConfig::sequential()))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.succeeded()));
}

#[tokio::test]
async fn second_parallel_run_executes_nothing() {
    init_tracing();
    let (mut graph, log) = GraphBuilder::new()
        .nodes(&["A", "B"])
        .node_with("C", |w| w.with_output("n", "1"))
        .edges(&[("A", "C")])
        .build();

    with_timeout(graph.execute_parallel(Arc::new(()), 2))
        .await
        .unwrap();
    let first_history = graph.history().get("C").cloned();

    let records = with_timeout(graph.execute_parallel(Arc::new(()), 2))
        .await
        .unwrap();

    let mut executed = log.executed();
    executed.sort();
    assert_eq!(executed, vec!["A", "B", "C"]);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == NodeStatus::Completed));
    assert_eq!(graph.history().get("C").cloned(), first_history);
    assert_eq!(graph.result_of("C"), first_history.as_ref());
}

#[tokio::test]
async fn parallel_rerun_does_not_revive_dependents_of_a_failure() {
    init_tracing();
    // A sequential run stops at the failure before reaching "other".
    let (mut graph, log) = GraphBuilder::new()
        .node_with("A", |w| w.failing("boom"))
        .nodes(&["B", "other"])
        .edges(&[("A", "B")])
        .build();

    graph.execute_sequential(&()).unwrap();
    assert_eq!(graph.status_of("other"), Some(NodeStatus::Pending));

    let records = with_timeout(graph.execute_parallel(Arc::new(()), 2))
        .await
        .unwrap();

    assert_eq!(log.executed(), vec!["A", "other"]);
    assert_eq!(graph.status_of("A"), Some(NodeStatus::Failed));
    assert_eq!(graph.status_of("B"), Some(NodeStatus::Skipped));
    assert_eq!(graph.status_of("other"), Some(NodeStatus::Completed));
    assert_eq!(records.len(), 3);
}
