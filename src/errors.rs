// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Structural problems with the graph (cycles, dangling edges, internal
//! deadlocks) are reported through [`GraphError`]. A request that fails while
//! executing is *not* an error here: it ends up as a `failed` node status with
//! an attached result and is handled by the cascading skip logic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// An operation that needs an acyclic graph found one or more cycles.
    ///
    /// `cycles` lists each cycle as the ordered node ids along the ring;
    /// `report` is the human-readable rendering from
    /// [`RequestGraph::format_cycle_error`](crate::dag::RequestGraph::format_cycle_error).
    #[error("Cycle detected in request graph:\n{report}")]
    CycleDetected {
        cycles: Vec<Vec<String>>,
        report: String,
    },

    /// An edge referenced a node id that is not registered.
    #[error("Unknown node: {id}")]
    UnknownNode { id: String },

    /// Ordering or grouping got stuck with nodes left over. This only
    /// happens if a cycle slipped past validation.
    #[error("Internal deadlock: no runnable node among {remaining:?}")]
    DeadlockInternal { remaining: Vec<String> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GraphError>;
