//! graph-visit-core: storage-agnostic graph container with visitor-driven
//! traversal.
//!
//! A [`Graph`] keeps nodes and edges in arenas addressed by dense integer
//! ids and can mirror its edges into an adjacency list, a flattened
//! adjacency matrix, or both. [`Graph::bfs`] and [`Graph::dfs`] walk every
//! component and report progress to a [`GraphVisitor`], recording the
//! traversal tree in each node's `parent` link. [`GraphGenerator`] builds
//! reproducible random graphs, optionally on a worker pool.
//!
//! Pure Rust, no I/O: the `graph-visit-bench` binary is the reference
//! consumer.

mod error;
mod generator;
mod graph;
mod traversal;
mod visitor;

pub use error::{GraphError, GraphResult};
pub use generator::{GeneratorConfig, GraphCreationFlags, GraphGenerator, Weight};
pub use graph::{Edge, EdgeId, Graph, Neighbors, Node, NodeId, Parent, StorageType};
pub use visitor::{DfsOrder, GraphVisitor, NodeAction, NoopVisitor, WalkStatus};
