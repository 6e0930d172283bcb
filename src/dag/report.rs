// src/dag/report.rs

//! Human-readable diagnostics: graph dumps, cycle analysis and DOT export.
//!
//! None of the text produced here is part of the execution contract; it is
//! meant for logs and error messages.

use std::fmt::Write as _;

use petgraph::dot::Dot;
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::RequestGraph;
use crate::types::DependencyKind;

/// One link of a cycle, with whatever the edge list says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleLink {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    pub resource_path: Option<String>,
    pub description: Option<String>,
}

/// A detected cycle plus the edges that close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleInfo {
    /// Node ids around the ring; the last one points back to the first.
    pub nodes: Vec<String>,
    pub links: Vec<CycleLink>,
}

impl CycleInfo {
    /// `A -> B -> C -> A`
    pub fn ring(&self) -> String {
        let mut ring = self.nodes.join(" -> ");
        if let Some(first) = self.nodes.first() {
            ring.push_str(" -> ");
            ring.push_str(first);
        }
        ring
    }
}

impl<D> RequestGraph<D> {
    /// Detected cycles with the dependency details of every link.
    pub fn analyze_cycles(&self) -> Vec<CycleInfo> {
        self.detect_cycles()
            .into_iter()
            .map(|nodes| {
                let links = nodes
                    .iter()
                    .enumerate()
                    .filter_map(|(i, from)| {
                        let to = &nodes[(i + 1) % nodes.len()];
                        self.edges
                            .iter()
                            .find(|e| e.connects(from, to))
                            .map(|e| CycleLink {
                                from: e.from.clone(),
                                to: e.to.clone(),
                                kind: e.kind,
                                resource_path: e.resource_path.clone(),
                                description: e.description.clone(),
                            })
                    })
                    .collect();
                CycleInfo { nodes, links }
            })
            .collect()
    }

    /// Explain every cycle and how to break it. Empty for an acyclic graph.
    pub fn format_cycle_error(&self) -> String {
        let cycles = self.analyze_cycles();
        if cycles.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let _ = writeln!(out, "Circular dependency detected in the request graph.");
        let _ = writeln!(out, "Found {} cycle(s):", cycles.len());

        for (i, cycle) in cycles.iter().enumerate() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Cycle {} ({} nodes):", i + 1, cycle.nodes.len());
            let _ = writeln!(out, "  {}", cycle.ring());

            let labels: Vec<String> = cycle
                .nodes
                .iter()
                .filter_map(|id| self.node(id).map(|n| format!("{id} ({})", n.label())))
                .collect();
            let _ = writeln!(out, "  Requests: {}", labels.join(", "));

            if !cycle.links.is_empty() {
                let _ = writeln!(out, "  Dependencies in this cycle:");
                for link in &cycle.links {
                    let mut line = format!("    {} -> {} ({})", link.from, link.to, link.kind);
                    if let Some(resource) = &link.resource_path {
                        let _ = write!(line, " [resource: {resource}]");
                    }
                    if let Some(description) = &link.description {
                        let _ = write!(line, " - {description}");
                    }
                    let _ = writeln!(out, "{line}");
                }
            }

            // Closing link is the one most likely added by mistake.
            if let (Some(last), Some(first)) = (cycle.nodes.last(), cycle.nodes.first()) {
                let _ = writeln!(
                    out,
                    "  Hint: break the dependency between {last} and {first}, \
                     or drop one of the dependencies listed above."
                );
            }
        }

        out.trim_end().to_string()
    }

    /// Summary of nodes, edges and either the parallel groups or the cycles.
    pub fn visualize(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Request Execution Graph:");
        let _ = writeln!(out, "Nodes: {}", self.nodes.len());
        let _ = writeln!(out, "Edges: {}", self.edges.len());

        let _ = writeln!(out, "\nNodes:");
        for node in &self.nodes {
            let _ = writeln!(out, "  {}: {} (status: {})", node.id(), node.label(), node.status());
        }

        let _ = writeln!(out, "\nDependencies:");
        for edge in &self.edges {
            let _ = writeln!(out, "  {} -> {} ({})", edge.from, edge.to, edge.kind);
        }

        let cycles = self.detect_cycles();
        if cycles.is_empty() {
            let _ = writeln!(out, "\nParallel Execution Groups:");
            match self.parallel_groups() {
                Ok(groups) => {
                    for (i, group) in groups.iter().enumerate() {
                        let _ = writeln!(out, "  Group {}: {}", i + 1, group.join(", "));
                    }
                }
                Err(e) => {
                    let _ = writeln!(out, "  Error: {e}");
                }
            }
        } else {
            let _ = writeln!(out, "\nCycles:");
            for cycle in self.analyze_cycles() {
                let _ = writeln!(out, "  {}", cycle.ring());
            }
        }

        out.trim_end().to_string()
    }

    /// Graphviz DOT rendering, edges labelled with their dependency kind.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraphMap<&str, DependencyKind> = DiGraphMap::new();
        for node in &self.nodes {
            graph.add_node(node.id());
        }
        for edge in &self.edges {
            graph.add_edge(edge.from.as_str(), edge.to.as_str(), edge.kind);
        }
        format!("{}", Dot::new(&graph))
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::{DependencyEdge, RequestGraph, RequestNode};
    use crate::exec::work::{Work, WorkResult};
    use crate::types::DependencyKind;

    struct MakeDir;

    impl Work<()> for MakeDir {
        fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
            Ok(WorkResult::success())
        }
    }

    fn cyclic() -> RequestGraph<()> {
        let mut g = RequestGraph::new();
        for id in ["A", "B", "C"] {
            g.add_node(RequestNode::new(id, MakeDir));
        }
        g.add_edge(
            DependencyEdge::new("A", "B", DependencyKind::FileCreation)
                .with_resource("out/a.o")
                .with_description("A writes a.o"),
        )
        .unwrap();
        g.add_edge(DependencyEdge::order("B", "C")).unwrap();
        g.add_edge(DependencyEdge::new("C", "A", DependencyKind::DirectoryCreation))
            .unwrap();
        g
    }

    #[test]
    fn analysis_collects_every_link_of_the_ring() {
        let g = cyclic();
        let cycles = g.analyze_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert_eq!(cycle.ring(), "A -> B -> C -> A");
        let kinds: Vec<_> = cycle.links.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DependencyKind::FileCreation,
                DependencyKind::ExecutionOrder,
                DependencyKind::DirectoryCreation
            ]
        );
    }

    #[test]
    fn cycle_error_names_edges_and_hint() {
        let text = cyclic().format_cycle_error();
        assert!(text.contains("A -> B -> C -> A"));
        assert!(text.contains("A (MakeDir)"));
        assert!(text.contains("[resource: out/a.o]"));
        assert!(text.contains("- A writes a.o"));
        assert!(text.contains("C -> A (directory_creation)"));
        assert!(text.contains("break the dependency between C and A"));
    }

    #[test]
    fn visualize_lists_groups_for_acyclic_graph() {
        let mut g = RequestGraph::new();
        for id in ["A", "B", "C"] {
            g.add_node(RequestNode::new(id, MakeDir));
        }
        g.add_edge(DependencyEdge::order("A", "B")).unwrap();
        g.add_edge(DependencyEdge::order("A", "C")).unwrap();

        let text = g.visualize();
        assert!(text.contains("Nodes: 3"));
        assert!(text.contains("Edges: 2"));
        assert!(text.contains("A: MakeDir (status: pending)"));
        assert!(text.contains("A -> C (execution_order)"));
        assert!(text.contains("Group 1: A"));
        assert!(text.contains("Group 2: B, C"));
        assert!(g.format_cycle_error().is_empty());
    }

    #[test]
    fn visualize_shows_cycles_instead_of_groups() {
        let text = cyclic().visualize();
        assert!(text.contains("Cycles:"));
        assert!(!text.contains("Parallel Execution Groups"));
    }

    #[test]
    fn dot_export_contains_nodes_and_kinds() {
        let dot = cyclic().to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("file_creation"));
        assert!(dot.contains("\"B\""));
    }
}
