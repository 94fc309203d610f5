use graph_visit_core::{
    DfsOrder, Graph, GraphVisitor, Node, NodeAction, NodeId, NoopVisitor, Parent, StorageType,
};
use proptest::prelude::*;

/// Records processed node ids, tagged with their component index.
#[derive(Default)]
struct Order {
    component: usize,
    processed: Vec<(usize, NodeId)>,
    ends: usize,
}

impl<T> GraphVisitor<T> for Order {
    fn on_start_component_visit(&mut self) {
        self.component += 1;
    }

    fn on_node_process(&mut self, _graph: &Graph<T>, node: &Node<T>) -> NodeAction {
        self.processed.push((self.component, node.id));
        NodeAction::Continue
    }

    fn on_end_node_process(&mut self, _graph: &Graph<T>, _node: &Node<T>) -> NodeAction {
        self.ends += 1;
        NodeAction::Continue
    }
}

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(NodeId, NodeId)>, bool)> {
    (1usize..30).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..n * 3),
            any::<bool>(),
        )
    })
}

fn arb_storage() -> impl Strategy<Value = StorageType> {
    prop_oneof![
        Just(StorageType::LIST),
        Just(StorageType::MATRIX),
        Just(StorageType::BOTH),
    ]
}

fn build(storage: StorageType, n: usize, edges: &[(NodeId, NodeId)], reciprocal: bool) -> Graph<i32> {
    let mut graph = Graph::new(storage);
    for _ in 0..n {
        graph.add_node(0).unwrap();
    }
    for &(src, dst) in edges {
        graph.add_edge(src, dst, 1, reciprocal).unwrap();
    }
    graph
}

fn has_edge(graph: &Graph<i32>, src: NodeId, dst: NodeId) -> bool {
    graph.neighbors(src).unwrap().any(|next| next == dst)
}

fn parents(graph: &Graph<i32>) -> Vec<Parent> {
    graph.nodes().iter().map(|n| n.parent()).collect()
}

proptest! {
    #[test]
    fn test_bfs_parent_paths_follow_edges(
        (n, edges, reciprocal) in arb_graph(),
        storage in arb_storage(),
    ) {
        let mut graph = build(storage, n, &edges, reciprocal);
        graph.bfs(&mut NoopVisitor::default()).unwrap();

        for id in 0..n {
            let path = graph.parent_path(id).unwrap().expect("every node is reached");
            prop_assert_eq!(path.last().copied(), Some(id));
            prop_assert_eq!(graph.parent_of(path[0]).unwrap(), Parent::Root);
            for hop in path.windows(2) {
                prop_assert!(has_edge(&graph, hop[0], hop[1]), "{} -> {} is not an edge", hop[0], hop[1]);
            }
        }
    }

    #[test]
    fn test_bfs_processes_by_hop_distance(
        (n, edges, reciprocal) in arb_graph(),
        storage in arb_storage(),
    ) {
        let mut graph = build(storage, n, &edges, reciprocal);
        let mut order = Order::default();
        graph.bfs(&mut order).unwrap();

        let depth = |id: NodeId| graph.parent_path(id).unwrap().map(|p| p.len()).unwrap_or(0);
        for pair in order.processed.windows(2) {
            let ((ca, a), (cb, b)) = (pair[0], pair[1]);
            if ca == cb {
                prop_assert!(depth(a) <= depth(b), "{} processed before shallower {}", a, b);
            }
        }
    }

    #[test]
    fn test_dfs_orders_place_ancestors(
        (n, edges, reciprocal) in arb_graph(),
        storage in arb_storage(),
    ) {
        for order in [DfsOrder::PreOrder, DfsOrder::PostOrder] {
            let mut graph = build(storage, n, &edges, reciprocal);
            let mut recorded = Order::default();
            graph.dfs(&mut recorded, order).unwrap();

            let mut position = vec![usize::MAX; n];
            for (index, &(_, id)) in recorded.processed.iter().enumerate() {
                position[id] = index;
            }
            for id in 0..n {
                let path = graph.parent_path(id).unwrap().expect("every node is reached");
                for &ancestor in &path[..path.len() - 1] {
                    match order {
                        DfsOrder::PreOrder => { prop_assert!(position[ancestor] < position[id]); }
                        DfsOrder::PostOrder => { prop_assert!(position[ancestor] > position[id]); }
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_node_processed_once(
        (n, edges, reciprocal) in arb_graph(),
        storage in arb_storage(),
        source in any::<prop::sample::Index>(),
    ) {
        let mut graph = build(storage, n, &edges, reciprocal);
        let source = source.index(n);

        let mut bfs = Order::default();
        graph.bfs(&mut Sourced(source, &mut bfs)).unwrap();
        let mut dfs = Order::default();
        graph.dfs(&mut Sourced(source, &mut dfs), DfsOrder::PostOrder).unwrap();

        prop_assert_eq!(bfs.processed[0].1, source);
        let first_tree_last = dfs.processed.iter().rev().find(|&&(component, _)| component == 1);
        prop_assert_eq!(first_tree_last.map(|&(_, id)| id), Some(source));

        for recorded in [&bfs, &dfs] {
            let mut ids: Vec<NodeId> = recorded.processed.iter().map(|&(_, id)| id).collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..n).collect::<Vec<_>>());
            prop_assert_eq!(recorded.ends, n);
        }
    }

    #[test]
    fn test_walks_are_idempotent(
        (n, edges, reciprocal) in arb_graph(),
        storage in arb_storage(),
    ) {
        let mut graph = build(storage, n, &edges, reciprocal);

        let mut first = Order::default();
        graph.bfs(&mut first).unwrap();
        let first_parents = parents(&graph);
        let mut second = Order::default();
        graph.bfs(&mut second).unwrap();
        prop_assert_eq!(&first.processed, &second.processed);
        prop_assert_eq!(first_parents, parents(&graph));

        let mut first = Order::default();
        graph.dfs(&mut first, DfsOrder::PreOrder).unwrap();
        let first_parents = parents(&graph);
        let mut second = Order::default();
        graph.dfs(&mut second, DfsOrder::PreOrder).unwrap();
        prop_assert_eq!(&first.processed, &second.processed);
        prop_assert_eq!(first_parents, parents(&graph));
    }

    #[test]
    fn test_list_and_matrix_agree((n, edges, reciprocal) in arb_graph()) {
        let mut graph = build(StorageType::BOTH, n, &edges, reciprocal);

        for id in 0..n {
            graph.set_storage(StorageType::LIST);
            let mut from_list: Vec<NodeId> = graph.neighbors(id).unwrap().collect();
            from_list.sort_unstable();
            from_list.dedup();

            graph.set_storage(StorageType::MATRIX);
            let from_matrix: Vec<NodeId> = graph.neighbors(id).unwrap().collect();
            prop_assert_eq!(from_list, from_matrix);
        }
    }
}

/// Forwards to an [`Order`] while pinning the walk source.
struct Sourced<'a>(NodeId, &'a mut Order);

impl<T> GraphVisitor<T> for Sourced<'_> {
    fn visit_source(&self) -> Option<NodeId> {
        Some(self.0)
    }

    fn on_start_component_visit(&mut self) {
        GraphVisitor::<T>::on_start_component_visit(self.1);
    }

    fn on_node_process(&mut self, graph: &Graph<T>, node: &Node<T>) -> NodeAction {
        self.1.on_node_process(graph, node)
    }

    fn on_end_node_process(&mut self, graph: &Graph<T>, node: &Node<T>) -> NodeAction {
        self.1.on_end_node_process(graph, node)
    }
}
