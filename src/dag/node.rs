// src/dag/node.rs

//! Request nodes: a unit of work plus the metadata the scheduler needs.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::exec::work::{Work, WorkResult};
use crate::types::NodeStatus;

/// Canonical node identifier type.
pub type NodeId = String;

/// Files and directories a request touches. Only used to infer edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeResources {
    pub creates_files: BTreeSet<String>,
    pub creates_dirs: BTreeSet<String>,
    pub reads_files: BTreeSet<String>,
    pub requires_dirs: BTreeSet<String>,
}

impl NodeResources {
    pub fn is_empty(&self) -> bool {
        self.creates_files.is_empty()
            && self.creates_dirs.is_empty()
            && self.reads_files.is_empty()
            && self.requires_dirs.is_empty()
    }

    /// Two requests conflict when they create the same file or directory, or
    /// one creates a file the other reads.
    pub fn conflicts_with(&self, other: &NodeResources) -> bool {
        !self.creates_files.is_disjoint(&other.creates_files)
            || !self.creates_dirs.is_disjoint(&other.creates_dirs)
            || !self.creates_files.is_disjoint(&other.reads_files)
            || !self.reads_files.is_disjoint(&other.creates_files)
    }
}

/// One vertex of the request graph.
///
/// `work` is `None` while the work has been handed to a worker, or for good
/// if that worker never reported back. `last_label` keeps diagnostics
/// readable in both cases.
pub struct RequestNode<D> {
    pub(crate) id: NodeId,
    pub(crate) work: Option<Box<dyn Work<D>>>,
    pub(crate) last_label: String,
    pub(crate) status: NodeStatus,
    pub(crate) result: Option<WorkResult>,
    pub(crate) resources: NodeResources,
    pub(crate) metadata: BTreeMap<String, String>,
}

impl<D> std::fmt::Debug for RequestNode<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestNode")
            .field("id", &self.id)
            .field("work", &self.work)
            .field("status", &self.status)
            .field("result", &self.result)
            .field("resources", &self.resources)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<D> RequestNode<D> {
    pub fn new(id: impl Into<NodeId>, work: impl Work<D> + 'static) -> Self {
        Self::from_boxed(id, Box::new(work))
    }

    pub fn from_boxed(id: impl Into<NodeId>, work: Box<dyn Work<D>>) -> Self {
        Self {
            id: id.into(),
            last_label: work.label(),
            work: Some(work),
            status: NodeStatus::Pending,
            result: None,
            resources: NodeResources::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn creates_file(mut self, path: impl Into<String>) -> Self {
        self.resources.creates_files.insert(path.into());
        self
    }

    pub fn creates_dir(mut self, path: impl Into<String>) -> Self {
        self.resources.creates_dirs.insert(path.into());
        self
    }

    pub fn reads_file(mut self, path: impl Into<String>) -> Self {
        self.resources.reads_files.insert(path.into());
        self
    }

    pub fn requires_dir(mut self, path: impl Into<String>) -> Self {
        self.resources.requires_dirs.insert(path.into());
        self
    }

    pub fn with_resources(mut self, resources: NodeResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn result(&self) -> Option<&WorkResult> {
        self.result.as_ref()
    }

    pub fn resources(&self) -> &NodeResources {
        &self.resources
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Diagnostic label of the attached work, or the label it had when it
    /// was last handed out.
    pub fn label(&self) -> String {
        match &self.work {
            Some(work) => work.label(),
            None => self.last_label.clone(),
        }
    }

    /// Move the status forward. Illegal transitions are refused and logged.
    pub(crate) fn transition(&mut self, next: NodeStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            warn!(
                node = %self.id,
                from = %self.status,
                to = %next,
                "refusing illegal status transition"
            );
            false
        }
    }

    /// Attach the outcome of the single execution of this node.
    pub(crate) fn record_result(&mut self, result: WorkResult) {
        if self.result.is_some() {
            warn!(node = %self.id, "result already recorded; keeping the first one");
            return;
        }
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_cover_creation_and_read_write_overlap() {
        let mut a = NodeResources::default();
        a.creates_files.insert("out/a.txt".into());

        let mut reader = NodeResources::default();
        reader.reads_files.insert("out/a.txt".into());

        let mut writer = NodeResources::default();
        writer.creates_files.insert("out/a.txt".into());

        let mut unrelated = NodeResources::default();
        unrelated.requires_dirs.insert("out".into());

        assert!(a.conflicts_with(&reader));
        assert!(reader.conflicts_with(&a));
        assert!(a.conflicts_with(&writer));
        assert!(!a.conflicts_with(&unrelated));
        assert!(!reader.conflicts_with(&reader.clone()));
    }
}
