//! Error type shared by graph construction, traversal and generation.

use std::io;

use thiserror::Error;

use crate::graph::NodeId;

/// Result alias used throughout the crate.
pub type GraphResult<T> = Result<T, GraphError>;

/// Everything that can go wrong while building, walking or generating a graph.
///
/// A visitor answering [`NodeAction::Abort`](crate::NodeAction::Abort) is not an
/// error; walks report that through [`WalkStatus`](crate::WalkStatus).
#[derive(Error, Debug)]
pub enum GraphError {
    /// A node id outside `0..node_count` was used.
    #[error("node {node} out of range for a graph with {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    /// Growing one of the owned sequences failed.
    #[error("cannot grow {what} storage to {requested} entries")]
    CapacityExhausted { what: &'static str, requested: usize },

    /// An edge was inserted while neither list nor matrix storage is enabled.
    #[error("no edge storage enabled on this graph")]
    StorageDisabled,

    /// Generator configuration was rejected before any work started.
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    /// A generator worker thread could not be started.
    #[error("failed to start worker for node {node}: {source}")]
    WorkerSpawn {
        node: NodeId,
        #[source]
        source: io::Error,
    },

    /// One or more generator workers panicked. Reported after every worker was joined.
    #[error("generator workers failed for nodes {failed:?}")]
    WorkersFailed { failed: Vec<NodeId> },

    /// A parent chain did not terminate at a root.
    #[error("parent chain starting at node {node} does not reach a root")]
    ParentCycle { node: NodeId },
}

impl GraphError {
    pub(crate) fn out_of_range(node: NodeId, node_count: usize) -> Self {
        GraphError::NodeOutOfRange { node, node_count }
    }
}
