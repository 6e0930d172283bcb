// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Lifecycle status of a node within one scheduling run.
///
/// ```text
/// pending -> running -> completed | failed
/// pending -> skipped
/// ```
///
/// `skipped` bypasses `running` entirely. No status ever goes back to
/// `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl NodeStatus {
    /// `completed`, `failed` and `skipped` are final.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Completed | NodeStatus::Failed | NodeStatus::Skipped
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        matches!(
            (self, next),
            (NodeStatus::Pending, NodeStatus::Running)
                | (NodeStatus::Pending, NodeStatus::Skipped)
                | (NodeStatus::Running, NodeStatus::Completed)
                | (NodeStatus::Running, NodeStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
            NodeStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one node has to wait for another.
///
/// Carried for diagnostics only; every kind schedules the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyKind {
    /// A file must be created before it is read.
    FileCreation,
    /// A directory must exist before it is used.
    DirectoryCreation,
    /// Both sides touch a shared resource.
    ResourceAccess,
    /// Plain ordering, e.g. to preserve the order requests were declared in.
    ExecutionOrder,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::FileCreation => "file_creation",
            DependencyKind::DirectoryCreation => "directory_creation",
            DependencyKind::ResourceAccess => "resource_access",
            DependencyKind::ExecutionOrder => "execution_order",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a graph is executed.
///
/// - `Sequential`: one node at a time in topological order, stopping at the
///   first failure that is not allowed.
/// - `Parallel`: group by group, running the members of a group on a bounded
///   worker pool (default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    Sequential,
    #[default]
    Parallel,
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(ExecutionStrategy::Sequential),
            "parallel" => Ok(ExecutionStrategy::Parallel),
            other => Err(format!(
                "invalid strategy: {other} (expected \"sequential\" or \"parallel\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_state_machine_only_moves_forward() {
        use NodeStatus::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Skipped));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));

        assert!(!Running.can_transition_to(Pending));
        assert!(!Running.can_transition_to(Skipped));
        assert!(!Skipped.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            " Parallel ".parse::<ExecutionStrategy>(),
            Ok(ExecutionStrategy::Parallel)
        );
        assert_eq!(
            "SEQUENTIAL".parse::<ExecutionStrategy>(),
            Ok(ExecutionStrategy::Sequential)
        );
        assert!("threads".parse::<ExecutionStrategy>().is_err());
    }
}
