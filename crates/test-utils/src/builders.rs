use reqgraph::{DependencyEdge, RequestGraph, RequestNode};

use crate::fake_work::{ExecutionLog, FakeWork};

/// Graph type used throughout the tests: the driver is unit.
pub type TestGraph = RequestGraph<()>;

/// Builder for graphs of [`FakeWork`] nodes sharing one [`ExecutionLog`].
pub struct GraphBuilder {
    graph: TestGraph,
    log: ExecutionLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: RequestGraph::new(),
            log: ExecutionLog::new(),
        }
    }

    /// Add plain succeeding nodes.
    pub fn nodes(mut self, ids: &[&str]) -> Self {
        for id in ids {
            let work = FakeWork::new(id, &self.log);
            self.graph.add_node(RequestNode::new(*id, work));
        }
        self
    }

    /// Add a node whose work is configured by `configure`.
    pub fn node_with(mut self, id: &str, configure: impl FnOnce(FakeWork) -> FakeWork) -> Self {
        let work = configure(FakeWork::new(id, &self.log));
        self.graph.add_node(RequestNode::new(id, work));
        self
    }

    /// Add a node built by the caller, e.g. one declaring resources.
    pub fn raw_node(mut self, build: impl FnOnce(&ExecutionLog) -> RequestNode<()>) -> Self {
        let node = build(&self.log);
        self.graph.add_node(node);
        self
    }

    /// Add `ExecutionOrder` edges. Panics on unknown ids.
    pub fn edges(mut self, edges: &[(&str, &str)]) -> Self {
        for (from, to) in edges {
            self.graph
                .add_edge(DependencyEdge::order(*from, *to))
                .expect("edge endpoints must be registered");
        }
        self
    }

    pub fn build(self) -> (TestGraph, ExecutionLog) {
        (self.graph, self.log)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
