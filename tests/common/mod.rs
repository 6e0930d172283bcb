#![allow(dead_code)]

use reqgraph::{ExecutionRecord, NodeStatus};

pub use reqgraph_test_utils::{GraphBuilder, init_tracing, with_timeout};

/// Node ids of the records, in record order.
pub fn ids(records: &[ExecutionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.node_id.as_str()).collect()
}

pub fn status_in(records: &[ExecutionRecord], id: &str) -> Option<NodeStatus> {
    records.iter().find(|r| r.node_id == id).map(|r| r.status)
}
