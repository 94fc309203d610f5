//! Callback protocol driven by the BFS/DFS engines.
//!
//! Every hook has a no-op default, so a visitor only implements what it needs.
//! Per-node hooks get the graph alongside the node so a visitor can follow
//! `parent` links while the walk is still running.

use crate::graph::{Graph, Node, NodeId};

/// Directive returned by a per-node hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeAction {
    /// Proceed with normal traversal.
    #[default]
    Continue,
    /// Do not expand this node's neighbors; keep walking elsewhere.
    SkipChildren,
    /// Stop the whole walk.
    Abort,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every node was handled.
    Completed,
    /// A hook answered [`NodeAction::Abort`].
    Aborted,
}

impl WalkStatus {
    pub fn is_aborted(self) -> bool {
        self == WalkStatus::Aborted
    }
}

/// Position of `on_node_process` relative to a node's DFS subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DfsOrder {
    #[default]
    PreOrder,
    PostOrder,
}

pub trait GraphVisitor<T> {
    /// Preferred start node for the next walk; `None` starts at node 0.
    fn visit_source(&self) -> Option<NodeId> {
        None
    }

    /// Once, before anything else in a walk.
    fn on_start_visit(&mut self) {}

    /// Once, after everything else in a walk (also after an abort).
    fn on_end_visit(&mut self) {}

    /// When a new component root is chosen.
    fn on_start_component_visit(&mut self) {}

    /// When the walk leaves a component.
    fn on_end_component_visit(&mut self) {}

    /// The node has been reached.
    fn on_begin_node_process(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        NodeAction::Continue
    }

    /// The node is being processed: on first visit for BFS, at the pre- or
    /// post-order position for DFS.
    fn on_node_process(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        NodeAction::Continue
    }

    /// The node (and, for DFS, its descendants) has been processed.
    fn on_end_node_process(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        NodeAction::Continue
    }

    /// An already visited node was reached again, typically through a cycle.
    fn on_node_already_visited(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        NodeAction::Continue
    }
}

/// Visitor that observes nothing; walks with it only update `parent`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVisitor {
    pub source: Option<NodeId>,
}

impl NoopVisitor {
    pub fn from_source(source: NodeId) -> Self {
        Self { source: Some(source) }
    }
}

impl<T> GraphVisitor<T> for NoopVisitor {
    fn visit_source(&self) -> Option<NodeId> {
        self.source
    }
}
