use std::collections::VecDeque;

use crate::error::GraphResult;
use crate::graph::{Graph, NodeId, Parent};
use crate::visitor::{DfsOrder, GraphVisitor, NodeAction, WalkStatus};

/// BFS bookkeeping per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    /// `on_begin_node_process` answered `SkipChildren`; never re-seeded as a root.
    Skipped,
    Visited,
}

/// A DFS node whose children are still being walked.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    cursor: usize,
    expand: bool,
}

impl<T: Copy + Default + PartialEq> Graph<T> {
    /// Breadth-first walk over every component, starting at the visitor's
    /// source (node 0 if it has none).
    ///
    /// A node is enqueued once per discovering edge and the visited check
    /// happens at dequeue, so `on_node_already_visited` observes every
    /// rediscovery. `parent` is set by the first discoverer only, which keeps
    /// the shortest-hop tree. When the queue drains, the lowest unvisited id
    /// seeds the next component.
    ///
    /// Fails with `NodeOutOfRange` before any hook fires if the source is not
    /// a node of this graph.
    pub fn bfs<V>(&mut self, visitor: &mut V) -> GraphResult<WalkStatus>
    where
        V: GraphVisitor<T> + ?Sized,
    {
        let node_count = self.node_count();
        if node_count == 0 {
            return Ok(WalkStatus::Completed);
        }
        let source = self.walk_source(visitor)?;
        self.reset_parents();

        let mut marks = vec![Mark::Unseen; node_count];
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        visitor.on_start_visit();
        self.set_parent(source, Parent::Root);
        queue.push_back(source);
        visitor.on_start_component_visit();

        let status = 'walk: loop {
            while let Some(current) = queue.pop_front() {
                match visitor.on_begin_node_process(self, &self.nodes()[current]) {
                    NodeAction::Abort => break 'walk WalkStatus::Aborted,
                    NodeAction::SkipChildren => {
                        if marks[current] == Mark::Unseen {
                            marks[current] = Mark::Skipped;
                        }
                        continue;
                    }
                    NodeAction::Continue => {}
                }

                if marks[current] == Mark::Visited {
                    if visitor.on_node_already_visited(self, &self.nodes()[current]) == NodeAction::Abort {
                        break 'walk WalkStatus::Aborted;
                    }
                    continue;
                }
                marks[current] = Mark::Visited;

                let action = visitor.on_node_process(self, &self.nodes()[current]);
                if action == NodeAction::Abort {
                    break 'walk WalkStatus::Aborted;
                }
                if action != NodeAction::SkipChildren {
                    let mut cursor = 0;
                    while let Some(next) = self.next_neighbor(current, &mut cursor) {
                        if self.nodes()[next].parent().is_invalid() {
                            self.set_parent(next, Parent::Node(current));
                        }
                        queue.push_back(next);
                    }
                }

                if visitor.on_end_node_process(self, &self.nodes()[current]) == NodeAction::Abort {
                    break 'walk WalkStatus::Aborted;
                }
            }

            let Some(root) = marks.iter().position(|&m| m == Mark::Unseen) else {
                break WalkStatus::Completed;
            };
            visitor.on_end_component_visit();
            self.set_parent(root, Parent::Root);
            queue.push_back(root);
            visitor.on_start_component_visit();
        };

        visitor.on_end_component_visit();
        visitor.on_end_visit();
        Ok(status)
    }

    /// Depth-first walk over every component.
    ///
    /// The visitor's source is walked first, then every still-unvisited node
    /// in ascending id order becomes the root of a new component. `order`
    /// places `on_node_process` before or after the node's subtree.
    /// `SkipChildren` from `on_begin_node_process` or a pre-order
    /// `on_node_process` prunes the subtree; the node's remaining hooks still
    /// fire. `Abort` from any hook unwinds the whole walk.
    ///
    /// Uses an explicit frame stack, so depth is bounded by memory rather than
    /// the call stack.
    pub fn dfs<V>(&mut self, visitor: &mut V, order: DfsOrder) -> GraphResult<WalkStatus>
    where
        V: GraphVisitor<T> + ?Sized,
    {
        let node_count = self.node_count();
        if node_count == 0 {
            return Ok(WalkStatus::Completed);
        }
        let source = self.walk_source(visitor)?;
        self.reset_parents();

        let mut walk = DfsWalk {
            visitor,
            order,
            visited: vec![false; node_count],
            stack: Vec::new(),
        };

        walk.visitor.on_start_visit();
        let mut status = WalkStatus::Completed;
        for root in std::iter::once(source).chain(0..node_count) {
            if walk.visited[root] {
                continue;
            }
            walk.visitor.on_start_component_visit();
            let action = walk.tree(self, root);
            walk.visitor.on_end_component_visit();
            if action == NodeAction::Abort {
                status = WalkStatus::Aborted;
                break;
            }
        }
        walk.visitor.on_end_visit();
        Ok(status)
    }

    fn walk_source<V>(&self, visitor: &V) -> GraphResult<NodeId>
    where
        V: GraphVisitor<T> + ?Sized,
    {
        let source = visitor.visit_source().unwrap_or(0);
        self.check_node(source)?;
        Ok(source)
    }
}

struct DfsWalk<'v, V: ?Sized> {
    visitor: &'v mut V,
    order: DfsOrder,
    visited: Vec<bool>,
    stack: Vec<Frame>,
}

impl<V: ?Sized> DfsWalk<'_, V> {
    /// Walk the tree rooted at `root`. Returns `Abort` if the walk must stop.
    fn tree<T>(&mut self, graph: &mut Graph<T>, root: NodeId) -> NodeAction
    where
        T: Copy + Default + PartialEq,
        V: GraphVisitor<T>,
    {
        self.stack.clear();
        if self.enter(graph, root, Parent::Root) == NodeAction::Abort {
            return NodeAction::Abort;
        }

        while let Some(frame) = self.stack.last_mut() {
            let node = frame.node;
            let next = if frame.expand {
                graph.next_neighbor(node, &mut frame.cursor)
            } else {
                None
            };

            match next {
                Some(child) => {
                    if self.enter(graph, child, Parent::Node(node)) == NodeAction::Abort {
                        return NodeAction::Abort;
                    }
                }
                None => {
                    self.stack.pop();
                    if self.order == DfsOrder::PostOrder
                        && self.visitor.on_node_process(graph, &graph.nodes()[node]) == NodeAction::Abort
                    {
                        return NodeAction::Abort;
                    }
                    if self.visitor.on_end_node_process(graph, &graph.nodes()[node]) == NodeAction::Abort {
                        return NodeAction::Abort;
                    }
                }
            }
        }
        NodeAction::Continue
    }

    /// First contact with `node` from `parent`: either report a revisit or
    /// mark it, fire its leading hooks and push its frame.
    fn enter<T>(&mut self, graph: &mut Graph<T>, node: NodeId, parent: Parent) -> NodeAction
    where
        T: Copy + Default + PartialEq,
        V: GraphVisitor<T>,
    {
        if self.visited[node] {
            return self.visitor.on_node_already_visited(graph, &graph.nodes()[node]);
        }
        self.visited[node] = true;
        graph.set_parent(node, parent);

        let mut expand = true;
        match self.visitor.on_begin_node_process(graph, &graph.nodes()[node]) {
            NodeAction::Abort => return NodeAction::Abort,
            NodeAction::SkipChildren => expand = false,
            NodeAction::Continue => {}
        }
        if self.order == DfsOrder::PreOrder {
            match self.visitor.on_node_process(graph, &graph.nodes()[node]) {
                NodeAction::Abort => return NodeAction::Abort,
                NodeAction::SkipChildren => expand = false,
                NodeAction::Continue => {}
            }
        }

        self.stack.push(Frame {
            node,
            cursor: 0,
            expand,
        });
        NodeAction::Continue
    }
}
