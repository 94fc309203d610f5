use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Dense node index, `0..node_count`.
pub type NodeId = usize;

/// Index into the graph's edge sequence.
pub type EdgeId = usize;

/// Last-traversal discoverer of a node.
///
/// Reset to `Invalid` for every node at the start of each BFS/DFS call, so it
/// only describes the most recent walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parent {
    /// Not reached by the last walk.
    #[default]
    Invalid,
    /// Chosen as the root of a component.
    Root,
    /// First discovered through this node.
    Node(NodeId),
}

impl Parent {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Parent::Node(id) => Some(id),
            Parent::Invalid | Parent::Root => None,
        }
    }

    pub fn is_invalid(self) -> bool {
        self == Parent::Invalid
    }
}

/// Bitmask selecting which edge storages a graph maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageType(u8);

impl StorageType {
    pub const NONE: Self = Self(0);
    pub const LIST: Self = Self(1 << 0);
    pub const MATRIX: Self = Self(1 << 1);
    pub const BOTH: Self = Self(Self::LIST.0 | Self::MATRIX.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `None` if `bits` has anything outside `BOTH` set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::BOTH.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn has_list(self) -> bool {
        self.contains(Self::LIST)
    }

    pub const fn has_matrix(self) -> bool {
        self.contains(Self::MATRIX)
    }
}

impl Default for StorageType {
    fn default() -> Self {
        Self::LIST
    }
}

impl BitOr for StorageType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A node: identity, payload weight, optional 2D position and traversal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub id: NodeId,
    pub weight: T,
    pub x: f32,
    pub y: f32,
    pub(crate) parent: Parent,
    /// Outgoing edge indices in insertion order (list storage only).
    pub(crate) edges: Vec<EdgeId>,
}

impl<T> Node<T> {
    pub fn new(id: NodeId, weight: T) -> Self {
        Self {
            id,
            weight,
            x: 0.0,
            y: 0.0,
            parent: Parent::Invalid,
            edges: Vec::new(),
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Outgoing edge indices, in the order neighbors are visited.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn out_degree(&self) -> usize {
        self.edges.len()
    }
}

/// A stored edge record. Traversal only ever follows `source -> destination`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<T> {
    pub source: NodeId,
    pub destination: NodeId,
    pub weight: T,
    /// `false` when this record was inserted together with its reciprocal.
    pub directed: bool,
}

/// Append-only graph over an arena of nodes and edges.
///
/// Edges live in an adjacency list (each node owns the indices of its
/// outgoing edge records), a flattened `N x N` adjacency matrix, or both,
/// according to [`StorageType`]. Every insertion updates all enabled storages.
///
/// The matrix is rebuilt from scratch whenever the node count changes, which
/// discards its previous contents: callers adding nodes after matrix edges
/// must re-insert those edges.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    nodes: Vec<Node<T>>,
    edges: Vec<Edge<T>>,
    matrix: Vec<T>,
    storage: StorageType,
}

impl<T: Copy + Default + PartialEq> Graph<T> {
    pub fn new(storage: StorageType) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            matrix: Vec::new(),
            storage,
        }
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(storage: StorageType, node_count: usize, edge_count: usize) -> GraphResult<Self> {
        let mut graph = Self::new(storage);
        graph
            .nodes
            .try_reserve_exact(node_count)
            .map_err(|_| GraphError::CapacityExhausted { what: "node", requested: node_count })?;
        if storage.has_list() {
            graph
                .edges
                .try_reserve_exact(edge_count)
                .map_err(|_| GraphError::CapacityExhausted { what: "edge", requested: edge_count })?;
        }
        Ok(graph)
    }

    pub fn storage(&self) -> StorageType {
        self.storage
    }

    /// Change the storage policy for subsequent insertions. Existing edges are
    /// not migrated between storages.
    pub fn set_storage(&mut self, storage: StorageType) {
        self.storage = storage;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of adjacency-list edge records (reciprocal pairs count twice).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge<T>> {
        self.edges.get(id)
    }

    /// Flattened adjacency matrix, `node_count^2` cells once built.
    pub fn adjacency_matrix(&self) -> &[T] {
        &self.matrix
    }

    /// Append a node carrying `weight`; its id is its index.
    pub fn add_node(&mut self, weight: T) -> GraphResult<NodeId> {
        let id = self.nodes.len();
        push_checked(&mut self.nodes, Node::new(id, weight), "node")
    }

    /// Append a pre-built node. Its id must equal the index it lands at, and it
    /// must not reference edges: edges are only added through `add_edge`.
    pub fn add_node_with(&mut self, mut node: Node<T>) -> GraphResult<NodeId> {
        let expected = self.nodes.len();
        if node.id != expected {
            return Err(GraphError::out_of_range(node.id, expected));
        }
        node.edges.clear();
        node.parent = Parent::Invalid;
        push_checked(&mut self.nodes, node, "node")
    }

    /// Insert `source -> destination` into every enabled storage. With
    /// `insert_reciprocal`, `destination -> source` is inserted as well.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        destination: NodeId,
        weight: T,
        insert_reciprocal: bool,
    ) -> GraphResult<()> {
        if self.storage.is_empty() {
            return Err(GraphError::StorageDisabled);
        }
        self.check_node(source)?;
        self.check_node(destination)?;
        // A failed rebuild must leave both storages without the edge.
        if self.storage.has_matrix() && !self.has_matrix() {
            self.alloc_adjacency_matrix()?;
        }
        if self.storage.has_list() {
            self.add_list_edge(source, destination, weight, insert_reciprocal)?;
        }
        if self.storage.has_matrix() {
            self.add_matrix_edge(source, destination, weight, insert_reciprocal)?;
        }
        Ok(())
    }

    /// Adjacency-list insertion regardless of the storage policy.
    pub fn add_list_edge(
        &mut self,
        source: NodeId,
        destination: NodeId,
        weight: T,
        insert_reciprocal: bool,
    ) -> GraphResult<()> {
        self.check_node(source)?;
        self.check_node(destination)?;

        // Reserve everything up front so a failure leaves the graph untouched.
        let records = if insert_reciprocal { 2 } else { 1 };
        let requested = self.edges.len() + records;
        self.edges
            .try_reserve(records)
            .map_err(|_| GraphError::CapacityExhausted { what: "edge", requested })?;
        reserve_slot(&mut self.nodes[source].edges)?;
        if insert_reciprocal {
            reserve_slot(&mut self.nodes[destination].edges)?;
        }

        let forward = self.edges.len();
        self.edges.push(Edge {
            source,
            destination,
            weight,
            directed: !insert_reciprocal,
        });
        self.nodes[source].edges.push(forward);

        if insert_reciprocal {
            let backward = self.edges.len();
            self.edges.push(Edge {
                source: destination,
                destination: source,
                weight,
                directed: false,
            });
            self.nodes[destination].edges.push(backward);
        }
        Ok(())
    }

    /// Adjacency-matrix insertion regardless of the storage policy. Rebuilds
    /// (and zeroes) the matrix first if the node count changed since it was
    /// last allocated.
    pub fn add_matrix_edge(
        &mut self,
        source: NodeId,
        destination: NodeId,
        weight: T,
        insert_reciprocal: bool,
    ) -> GraphResult<()> {
        self.check_node(source)?;
        self.check_node(destination)?;
        if !self.has_matrix() {
            self.alloc_adjacency_matrix()?;
        }

        let forward = self.matrix_index(source, destination);
        self.matrix[forward] = weight;
        if insert_reciprocal {
            let backward = self.matrix_index(destination, source);
            self.matrix[backward] = weight;
        }
        Ok(())
    }

    /// Discard the matrix and allocate a zeroed `node_count^2` one.
    pub fn alloc_adjacency_matrix(&mut self) -> GraphResult<()> {
        let n = self.nodes.len();
        let cells = n
            .checked_mul(n)
            .ok_or(GraphError::CapacityExhausted { what: "matrix", requested: usize::MAX })?;
        self.matrix.clear();
        self.matrix
            .try_reserve_exact(cells)
            .map_err(|_| GraphError::CapacityExhausted { what: "matrix", requested: cells })?;
        self.matrix.resize(cells, T::default());
        Ok(())
    }

    /// `true` if the matrix is sized for the current node count.
    pub fn has_matrix(&self) -> bool {
        let n = self.nodes.len();
        n.checked_mul(n) == Some(self.matrix.len())
    }

    /// Flattened cell index of `row -> col` for the current node count.
    pub fn matrix_index(&self, row: NodeId, col: NodeId) -> usize {
        row * self.nodes.len() + col
    }

    /// Weight stored in the matrix for `source -> destination`.
    ///
    /// Returns `None` for an empty cell or when the matrix is stale. A
    /// zero-weight edge is indistinguishable from no edge.
    pub fn matrix_weight(&self, source: NodeId, destination: NodeId) -> GraphResult<Option<T>> {
        self.check_node(source)?;
        self.check_node(destination)?;
        if !self.has_matrix() {
            return Ok(None);
        }
        let weight = self.matrix[self.matrix_index(source, destination)];
        Ok((weight != T::default()).then_some(weight))
    }

    /// Destinations reachable in one hop from `id`, in traversal order.
    ///
    /// The adjacency list is authoritative when enabled; otherwise the matrix
    /// row is scanned in ascending column order.
    pub fn neighbors(&self, id: NodeId) -> GraphResult<Neighbors<'_, T>> {
        self.check_node(id)?;
        Ok(Neighbors {
            graph: self,
            node: id,
            cursor: 0,
        })
    }

    /// Step through the neighbors of `node` without holding a borrow between
    /// calls; `cursor` starts at 0 and is advanced past each returned neighbor.
    pub(crate) fn next_neighbor(&self, node: NodeId, cursor: &mut usize) -> Option<NodeId> {
        if self.storage.has_list() {
            let edge = *self.nodes[node].edges.get(*cursor)?;
            *cursor += 1;
            return Some(self.edges[edge].destination);
        }
        if !self.storage.has_matrix() || !self.has_matrix() {
            return None;
        }
        let n = self.nodes.len();
        let row = &self.matrix[node * n..(node + 1) * n];
        while *cursor < n {
            let col = *cursor;
            *cursor += 1;
            if row[col] != T::default() {
                return Some(col);
            }
        }
        None
    }

    pub fn parent_of(&self, id: NodeId) -> GraphResult<Parent> {
        self.check_node(id)?;
        Ok(self.nodes[id].parent)
    }

    /// Root-first path to `target` following the parents left by the last walk.
    ///
    /// Returns `None` if the last walk never reached `target`.
    pub fn parent_path(&self, target: NodeId) -> GraphResult<Option<Vec<NodeId>>> {
        self.check_node(target)?;
        let mut path = Vec::new();
        let mut current = target;
        loop {
            path.push(current);
            match self.nodes[current].parent {
                Parent::Invalid => return Ok(None),
                Parent::Root => break,
                Parent::Node(parent) => current = parent,
            }
            if path.len() > self.nodes.len() {
                return Err(GraphError::ParentCycle { node: target });
            }
        }
        path.reverse();
        Ok(Some(path))
    }

    pub(crate) fn reset_parents(&mut self) {
        for node in &mut self.nodes {
            node.parent = Parent::Invalid;
        }
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Parent) {
        self.nodes[id].parent = parent;
    }

    pub(crate) fn check_node(&self, id: NodeId) -> GraphResult<()> {
        if id < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::out_of_range(id, self.nodes.len()))
        }
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem = self.nodes.len() * size_of::<Node<T>>();
        let list_mem: usize = self.nodes.iter().map(|n| n.edges.capacity() * size_of::<EdgeId>()).sum();
        let edges_mem = self.edges.len() * size_of::<Edge<T>>();
        let matrix_mem = self.matrix.len() * size_of::<T>();

        nodes_mem + list_mem + edges_mem + matrix_mem
    }
}

impl<T: Copy + Default + PartialEq> Default for Graph<T> {
    fn default() -> Self {
        Self::new(StorageType::default())
    }
}

/// Iterator over the destinations of a node's outgoing edges.
pub struct Neighbors<'a, T> {
    graph: &'a Graph<T>,
    node: NodeId,
    cursor: usize,
}

impl<T: Copy + Default + PartialEq> Iterator for Neighbors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.graph.next_neighbor(self.node, &mut self.cursor)
    }
}

fn push_checked<V>(vec: &mut Vec<V>, value: V, what: &'static str) -> GraphResult<usize> {
    let idx = vec.len();
    vec.try_reserve(1)
        .map_err(|_| GraphError::CapacityExhausted { what, requested: idx + 1 })?;
    vec.push(value);
    Ok(idx)
}

fn reserve_slot(list: &mut Vec<EdgeId>) -> GraphResult<()> {
    list.try_reserve(1).map_err(|_| GraphError::CapacityExhausted {
        what: "adjacency list",
        requested: list.len() + 1,
    })
}
