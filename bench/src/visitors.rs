//! Visitors driven by the benchmark modes.

use std::io::{self, Write};

use graph_visit_core::{Graph, GraphVisitor, Node, NodeAction, NodeId};

/// Result of a [`PathFinder`] walk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathOutcome {
    #[default]
    Pending,
    /// Root-first node ids, `source` to `target` inclusive.
    Found(Vec<NodeId>),
    NoPath,
}

/// Stops the walk as soon as `target` is processed and reads the path back
/// through the `parent` links the walk has recorded so far.
///
/// Only the source's component can hold a path, so the end of the first
/// component without a hit settles the outcome as [`PathOutcome::NoPath`].
#[derive(Debug, Clone)]
pub struct PathFinder {
    source: NodeId,
    target: NodeId,
    outcome: PathOutcome,
}

impl PathFinder {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            outcome: PathOutcome::Pending,
        }
    }

    pub fn outcome(&self) -> &PathOutcome {
        &self.outcome
    }
}

impl<T: Copy + Default + PartialEq> GraphVisitor<T> for PathFinder {
    fn visit_source(&self) -> Option<NodeId> {
        Some(self.source)
    }

    fn on_start_visit(&mut self) {
        self.outcome = PathOutcome::Pending;
    }

    fn on_end_component_visit(&mut self) {
        if self.outcome == PathOutcome::Pending {
            self.outcome = PathOutcome::NoPath;
        }
    }

    fn on_begin_node_process(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        if self.outcome == PathOutcome::Pending {
            NodeAction::Continue
        } else {
            NodeAction::Abort
        }
    }

    fn on_node_process(&mut self, graph: &Graph<T>, node: &Node<T>) -> NodeAction {
        if node.id != self.target {
            return NodeAction::Continue;
        }
        self.outcome = match graph.parent_path(node.id) {
            Ok(Some(path)) => PathOutcome::Found(path),
            _ => PathOutcome::NoPath,
        };
        NodeAction::Abort
    }
}

/// Collects processed node ids per component.
#[derive(Debug, Clone, Default)]
pub struct ComponentPrinter {
    source: Option<NodeId>,
    components: Vec<Vec<NodeId>>,
}

impl ComponentPrinter {
    pub fn new(source: Option<NodeId>) -> Self {
        Self {
            source,
            components: Vec::new(),
        }
    }

    pub fn components(&self) -> &[Vec<NodeId>] {
        &self.components
    }

    pub fn visited(&self) -> usize {
        self.components.iter().map(Vec::len).sum()
    }

    /// One line per component, ids in processing order.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (index, ids) in self.components.iter().enumerate() {
            write!(out, "component {index}:")?;
            for id in ids {
                write!(out, " {id}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl<T> GraphVisitor<T> for ComponentPrinter {
    fn visit_source(&self) -> Option<NodeId> {
        self.source
    }

    fn on_start_visit(&mut self) {
        self.components.clear();
    }

    fn on_start_component_visit(&mut self) {
        self.components.push(Vec::new());
    }

    fn on_node_process(&mut self, _graph: &Graph<T>, node: &Node<T>) -> NodeAction {
        if let Some(current) = self.components.last_mut() {
            current.push(node.id);
        }
        NodeAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_visit_core::{DfsOrder, StorageType, WalkStatus};

    fn graph(node_count: usize, edges: &[(NodeId, NodeId)]) -> Graph<i32> {
        let mut g = Graph::new(StorageType::LIST);
        for _ in 0..node_count {
            g.add_node(0).unwrap();
        }
        for &(src, dst) in edges {
            g.add_edge(src, dst, 1, false).unwrap();
        }
        g
    }

    #[test]
    fn test_path_finder_bfs_finds_shortest_hops() {
        // 0 -> 1 -> 2 -> 4 and the shortcut 0 -> 3 -> 4
        let mut g = graph(5, &[(0, 1), (1, 2), (2, 4), (0, 3), (3, 4)]);
        let mut finder = PathFinder::new(0, 4);
        let status = g.bfs(&mut finder).unwrap();
        assert_eq!(status, WalkStatus::Aborted);
        assert_eq!(finder.outcome(), &PathOutcome::Found(vec![0, 3, 4]));
    }

    #[test]
    fn test_path_finder_dfs_follows_tree() {
        let mut g = graph(5, &[(0, 1), (1, 2), (2, 4), (0, 3), (3, 4)]);
        let mut finder = PathFinder::new(0, 4);
        g.dfs(&mut finder, DfsOrder::PreOrder).unwrap();
        assert_eq!(finder.outcome(), &PathOutcome::Found(vec![0, 1, 2, 4]));
    }

    #[test]
    fn test_path_finder_source_is_target() {
        let mut g = graph(2, &[(0, 1)]);
        let mut finder = PathFinder::new(1, 1);
        g.bfs(&mut finder).unwrap();
        assert_eq!(finder.outcome(), &PathOutcome::Found(vec![1]));
    }

    #[test]
    fn test_path_finder_no_path_across_components() {
        let mut g = graph(4, &[(0, 1), (2, 3)]);
        let mut finder = PathFinder::new(0, 3);
        let status = g.bfs(&mut finder).unwrap();
        assert_eq!(status, WalkStatus::Aborted);
        assert_eq!(finder.outcome(), &PathOutcome::NoPath);
    }

    #[test]
    fn test_path_finder_reusable() {
        let mut g = graph(4, &[(0, 1), (1, 2), (2, 3)]);
        let mut finder = PathFinder::new(0, 3);
        g.bfs(&mut finder).unwrap();
        g.bfs(&mut finder).unwrap();
        assert_eq!(finder.outcome(), &PathOutcome::Found(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_component_printer_groups_by_component() {
        let mut g = graph(5, &[(0, 1), (2, 3)]);
        let mut printer = ComponentPrinter::default();
        g.bfs(&mut printer).unwrap();
        assert_eq!(printer.components(), &[vec![0, 1], vec![2, 3], vec![4]]);
        assert_eq!(printer.visited(), 5);

        let mut out = Vec::new();
        printer.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "component 0: 0 1\ncomponent 1: 2 3\ncomponent 2: 4\n"
        );
    }

    #[test]
    fn test_component_printer_source_first() {
        let mut g = graph(4, &[(0, 1), (2, 3)]);
        let mut printer = ComponentPrinter::new(Some(2));
        g.dfs(&mut printer, DfsOrder::PostOrder).unwrap();
        assert_eq!(printer.components(), &[vec![3, 2], vec![1, 0]]);
    }
}
