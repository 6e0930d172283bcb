// src/dag/infer.rs

//! Derive dependency edges from the resources each request declares.
//!
//! Edges always point from an earlier-added node to a later one, so inference
//! on its own can never introduce a cycle.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use tracing::{debug, info};

use crate::dag::edge::DependencyEdge;
use crate::dag::graph::RequestGraph;
use crate::errors::Result;
use crate::types::DependencyKind;

/// Resource path → slots that declare it, in insertion order.
type ResourceIndex<'a> = BTreeMap<&'a str, Vec<usize>>;

impl<D> RequestGraph<D> {
    /// Add edges implied by the nodes' resource annotations.
    ///
    /// 1. A node creating a file precedes later nodes reading it.
    /// 2. A node creating a directory precedes later nodes requiring it.
    /// 3. A node creating a directory precedes later nodes creating files
    ///    inside it (first such creator per directory).
    /// 4. Adjacent nodes with conflicting resources keep their order.
    ///
    /// Pairs that already have an edge in either direction are left alone.
    /// Returns the number of edges added.
    pub fn infer_dependencies(&mut self) -> Result<usize> {
        let planned = self.plan_inferred_edges();
        let added = planned.len();
        for edge in planned {
            self.add_edge(edge)?;
        }
        info!(added, "inferred dependencies from resource annotations");
        Ok(added)
    }

    fn plan_inferred_edges(&self) -> Vec<DependencyEdge> {
        let mut file_creators: ResourceIndex<'_> = BTreeMap::new();
        let mut dir_creators: ResourceIndex<'_> = BTreeMap::new();
        let mut file_readers: ResourceIndex<'_> = BTreeMap::new();
        let mut dir_requirers: ResourceIndex<'_> = BTreeMap::new();

        for (slot, node) in self.nodes.iter().enumerate() {
            let res = node.resources();
            for f in &res.creates_files {
                file_creators.entry(f.as_str()).or_default().push(slot);
            }
            for d in &res.creates_dirs {
                dir_creators.entry(d.as_str()).or_default().push(slot);
            }
            for f in &res.reads_files {
                file_readers.entry(f.as_str()).or_default().push(slot);
            }
            for d in &res.requires_dirs {
                dir_requirers.entry(d.as_str()).or_default().push(slot);
            }
        }

        let mut planner = EdgePlanner::new(self);

        for (path, creators) in &file_creators {
            let Some(readers) = file_readers.get(path) else {
                continue;
            };
            for &c in creators {
                for &r in readers.iter().filter(|&&r| c < r) {
                    planner.push(
                        c,
                        r,
                        DependencyKind::FileCreation,
                        Some(*path),
                        format!("File {path} must be created before being read"),
                    );
                }
            }
        }

        for (path, creators) in &dir_creators {
            let Some(requirers) = dir_requirers.get(path) else {
                continue;
            };
            for &c in creators {
                for &r in requirers.iter().filter(|&&r| c < r) {
                    planner.push(
                        c,
                        r,
                        DependencyKind::DirectoryCreation,
                        Some(*path),
                        format!("Directory {path} must be created before being used"),
                    );
                }
            }
        }

        for (slot, node) in self.nodes.iter().enumerate() {
            for parent in parent_dirs(&node.resources().creates_files) {
                for (dir, creators) in &dir_creators {
                    if !(*dir == parent || is_parent_directory(dir, &parent)) {
                        continue;
                    }
                    if let Some(&c) = creators.iter().find(|&&c| c < slot) {
                        planner.push(
                            c,
                            slot,
                            DependencyKind::DirectoryCreation,
                            Some(*dir),
                            format!("Directory {dir} must exist for files in {parent}"),
                        );
                    }
                }
            }
        }

        for slot in 1..self.nodes.len() {
            let prev = slot - 1;
            if planner.linked(prev, slot) || planner.linked(slot, prev) {
                continue;
            }
            if self.nodes[prev]
                .resources()
                .conflicts_with(self.nodes[slot].resources())
            {
                planner.push(
                    prev,
                    slot,
                    DependencyKind::ExecutionOrder,
                    None,
                    "Preserve declaration order due to resource conflict".to_string(),
                );
            }
        }

        planner.edges
    }
}

/// Collects planned edges while remembering which pairs are already linked,
/// either in the graph or earlier in the plan.
struct EdgePlanner<'g, D> {
    graph: &'g RequestGraph<D>,
    planned: std::collections::HashSet<(usize, usize)>,
    edges: Vec<DependencyEdge>,
}

impl<'g, D> EdgePlanner<'g, D> {
    fn new(graph: &'g RequestGraph<D>) -> Self {
        Self {
            graph,
            planned: Default::default(),
            edges: Vec::new(),
        }
    }

    fn linked(&self, from: usize, to: usize) -> bool {
        self.graph.forward[from].contains(&to) || self.planned.contains(&(from, to))
    }

    fn push(
        &mut self,
        from: usize,
        to: usize,
        kind: DependencyKind,
        resource: Option<&str>,
        description: String,
    ) {
        if self.linked(from, to) || self.linked(to, from) {
            return;
        }
        let from_id = self.graph.nodes[from].id();
        let to_id = self.graph.nodes[to].id();
        debug!(from = %from_id, to = %to_id, kind = %kind, "inferred dependency");

        let mut edge = DependencyEdge::new(from_id, to_id, kind).with_description(description);
        if let Some(resource) = resource {
            edge = edge.with_resource(resource);
        }
        self.planned.insert((from, to));
        self.edges.push(edge);
    }
}

/// Parent directories of the given files, skipping files at the top level.
fn parent_dirs<'a>(files: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut dirs: Vec<String> = files
        .into_iter()
        .filter_map(|f| Path::new(f).parent())
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty() && p != ".")
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

/// Whether `parent` is a strict ancestor of `child`, compared by normalized
/// path components (`.` segments and trailing slashes are ignored).
pub fn is_parent_directory(parent: &str, child: &str) -> bool {
    let normalize = |p: &str| -> Vec<String> {
        Path::new(p)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    let parent = normalize(parent);
    let child = normalize(child);
    parent.len() < child.len() && child.starts_with(&parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::RequestNode;
    use crate::exec::work::{Work, WorkResult};

    struct Step;

    impl Work<()> for Step {
        fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
            Ok(WorkResult::success())
        }
    }

    #[test]
    fn parent_directory_check_uses_components() {
        assert!(is_parent_directory("build", "build/out"));
        assert!(is_parent_directory("./build/", "build/out/deep"));
        assert!(!is_parent_directory("build", "build"));
        assert!(!is_parent_directory("build", "builder/out"));
        assert!(!is_parent_directory("build/out", "build"));
    }

    #[test]
    fn file_and_directory_dependencies_are_inferred() {
        let mut g = RequestGraph::new();
        g.add_node(RequestNode::new("mkdir", Step).creates_dir("work"));
        g.add_node(RequestNode::new("copy", Step).creates_file("work/main.rs"));
        g.add_node(RequestNode::new("build", Step).reads_file("work/main.rs").requires_dir("work"));

        let added = g.infer_dependencies().unwrap();

        assert_eq!(added, 3);
        let mkdir_copy = g.edges().iter().find(|e| e.connects("mkdir", "copy")).unwrap();
        assert_eq!(mkdir_copy.kind, DependencyKind::DirectoryCreation);
        let copy_build = g.edges().iter().find(|e| e.connects("copy", "build")).unwrap();
        assert_eq!(copy_build.kind, DependencyKind::FileCreation);
        assert_eq!(copy_build.resource_path.as_deref(), Some("work/main.rs"));
        assert!(g.has_edge("mkdir", "build"));
        assert!(!g.has_cycles());
    }

    #[test]
    fn readers_before_creators_get_no_edge() {
        let mut g = RequestGraph::new();
        g.add_node(RequestNode::new("read", Step).reads_file("a.txt"));
        g.add_node(RequestNode::new("unrelated", Step));
        g.add_node(RequestNode::new("write", Step).creates_file("a.txt"));

        assert_eq!(g.infer_dependencies().unwrap(), 0);
        assert!(g.edges().is_empty());
    }

    #[test]
    fn adjacent_conflicts_keep_declaration_order() {
        let mut g = RequestGraph::new();
        g.add_node(RequestNode::new("first", Step).creates_file("out.log"));
        g.add_node(RequestNode::new("second", Step).creates_file("out.log"));

        assert_eq!(g.infer_dependencies().unwrap(), 1);
        assert_eq!(g.edges()[0].kind, DependencyKind::ExecutionOrder);
        assert!(g.has_edge("first", "second"));
    }

    #[test]
    fn existing_edges_are_not_duplicated() {
        let mut g = RequestGraph::new();
        g.add_node(RequestNode::new("a", Step).creates_file("x"));
        g.add_node(RequestNode::new("b", Step).reads_file("x"));
        g.add_edge(DependencyEdge::order("a", "b")).unwrap();

        assert_eq!(g.infer_dependencies().unwrap(), 0);
        assert_eq!(g.edges().len(), 1);
    }
}
