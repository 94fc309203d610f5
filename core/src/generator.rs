//! Randomized graph generation.
//!
//! Every node samples its own outgoing edges from a private random stream
//! seeded with `(base_seed, node_id)`. The sequential and threaded variants
//! therefore build the same graph for the same base seed, independent of how
//! workers are scheduled.

use std::ops::BitOr;
use std::thread::{self, ScopedJoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use num_traits::NumCast;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Graph, NodeId, StorageType};

/// Weight types the generator can produce: anything numeric a unit draw can
/// be scaled into.
pub trait Weight: Copy + Default + PartialEq + NumCast {}

impl<T: Copy + Default + PartialEq + NumCast> Weight for T {}

/// Shape of the generated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphCreationFlags(u8);

impl GraphCreationFlags {
    pub const EMPTY: Self = Self(0);
    /// Every node gets at least one outgoing edge.
    pub const CONNECTED: Self = Self(1 << 0);
    /// Sampled edges are one-way; otherwise each gets a reciprocal.
    pub const DIRECTED: Self = Self(1 << 1);
    /// Edge chance targets a fixed expected out-degree instead of a dense ratio.
    pub const SPARSE: Self = Self(1 << 2);
    /// Use the configured seed instead of a clock-derived one.
    pub const CONSISTENT: Self = Self(1 << 3);
    /// Permit self-loops.
    pub const ALLOW_CYCLES: Self = Self(1 << 4);

    const ALL: u8 = 0b1_1111;

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GraphCreationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Generator parameters. Loadable from JSON; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub nodes: usize,
    pub flags: GraphCreationFlags,
    /// Upper bound (exclusive) of generated node and edge weights.
    pub weight_scale: f64,
    pub storage: StorageType,
    /// Worker pool size for `generate_threaded`.
    pub threads: usize,
    /// Base seed used when `CONSISTENT` is set.
    pub seed: u64,
    /// Expected out-degree in sparse mode.
    pub sparse_target: f64,
    /// Edge chance in dense mode.
    pub dense_chance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nodes: 8,
            flags: GraphCreationFlags::CONNECTED,
            weight_scale: 10.0,
            storage: StorageType::LIST,
            threads: 4,
            seed: 1234,
            sparse_target: 10.0,
            dense_chance: 0.8,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> GraphResult<()> {
        if self.nodes == 0 {
            return Err(GraphError::InvalidConfig("nodes must be at least 1".into()));
        }
        if self.threads == 0 {
            return Err(GraphError::InvalidConfig("threads must be at least 1".into()));
        }
        if self.storage.is_empty() {
            return Err(GraphError::InvalidConfig("storage must enable list or matrix".into()));
        }
        if !self.weight_scale.is_finite() || self.weight_scale < 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "weight_scale must be finite and non-negative, got {}",
                self.weight_scale
            )));
        }
        if !self.sparse_target.is_finite() || self.sparse_target < 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "sparse_target must be finite and non-negative, got {}",
                self.sparse_target
            )));
        }
        if !(0.0..=1.0).contains(&self.dense_chance) {
            return Err(GraphError::InvalidConfig(format!(
                "dense_chance must be within [0, 1], got {}",
                self.dense_chance
            )));
        }
        Ok(())
    }

    /// Probability that any given `(source, destination)` pair is sampled.
    /// Controls expected degree only, not exact degree.
    pub fn edge_chance(&self) -> f64 {
        if self.flags.contains(GraphCreationFlags::SPARSE) {
            (self.sparse_target / self.nodes as f64).min(1.0)
        } else {
            self.dense_chance
        }
    }
}

/// One node's share of the work: its weight and sampled outgoing edges.
#[derive(Debug)]
struct NodeSample<T> {
    weight: T,
    edges: Vec<(NodeId, T)>,
}

/// Generator context carrying its own seed; no process-wide random state.
#[derive(Debug, Clone)]
pub struct GraphGenerator {
    config: GeneratorConfig,
    base_seed: u64,
}

impl GraphGenerator {
    /// Seeds from `config.seed` under `CONSISTENT`, from the wall clock otherwise.
    pub fn new(config: GeneratorConfig) -> GraphResult<Self> {
        let base_seed = if config.flags.contains(GraphCreationFlags::CONSISTENT) {
            config.seed
        } else {
            clock_seed(config.seed)
        };
        Self::with_seed(config, base_seed)
    }

    /// Use `base_seed` regardless of the `CONSISTENT` flag.
    pub fn with_seed(config: GeneratorConfig, base_seed: u64) -> GraphResult<Self> {
        config.validate()?;
        debug!(
            nodes = config.nodes,
            edge_chance = config.edge_chance(),
            base_seed,
            "graph generator ready"
        );
        Ok(Self { config, base_seed })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Sample every node in id order on the calling thread.
    pub fn generate<T: Weight>(&self) -> GraphResult<Graph<T>> {
        let mut graph = self.empty_graph()?;
        for node in 0..self.config.nodes {
            let sample = self.sample_node(node);
            self.merge(&mut graph, node, sample)?;
        }
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "generated graph");
        Ok(graph)
    }

    /// Sample nodes on a fixed pool of `config.threads` workers.
    ///
    /// Node `i` goes to slot `i % threads`; a slot's previous worker is joined
    /// before the slot is reused, so at most `threads` workers are in flight.
    /// Each worker fills a private buffer. Buffers are merged in node id order
    /// once every worker has been joined. Worker panics are collected and
    /// reported together as `WorkersFailed`.
    pub fn generate_threaded<T: Weight + Send + 'static>(&self) -> GraphResult<Graph<T>> {
        let node_count = self.config.nodes;
        let threads = self.config.threads;
        let mut samples: Vec<Option<NodeSample<T>>> = (0..node_count).map(|_| None).collect();
        let mut failed: Vec<NodeId> = Vec::new();

        let spawn_error = thread::scope(|scope| {
            let mut slots: Vec<Option<(NodeId, ScopedJoinHandle<'_, NodeSample<T>>)>> =
                (0..threads).map(|_| None).collect();
            let mut spawn_error = None;

            for node in 0..node_count {
                let slot = node % threads;
                if let Some((previous, handle)) = slots[slot].take() {
                    settle(previous, handle.join(), &mut samples, &mut failed);
                }
                let worker = thread::Builder::new()
                    .name(format!("graph-gen-{slot}"))
                    .spawn_scoped(scope, move || self.sample_node::<T>(node));
                match worker {
                    Ok(handle) => slots[slot] = Some((node, handle)),
                    Err(source) => {
                        error!(node, %source, "failed to start generator worker");
                        spawn_error = Some(GraphError::WorkerSpawn { node, source });
                        break;
                    }
                }
            }

            for (previous, handle) in slots.into_iter().flatten() {
                settle(previous, handle.join(), &mut samples, &mut failed);
            }
            spawn_error
        });

        if let Some(err) = spawn_error {
            return Err(err);
        }
        if !failed.is_empty() {
            failed.sort_unstable();
            error!(count = failed.len(), "generator workers panicked");
            return Err(GraphError::WorkersFailed { failed });
        }

        let mut graph = self.empty_graph()?;
        for (node, sample) in samples.into_iter().enumerate() {
            // Every slot was joined without failure, so every sample is present.
            if let Some(sample) = sample {
                self.merge(&mut graph, node, sample)?;
            }
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            threads,
            "generated graph on worker pool"
        );
        Ok(graph)
    }

    fn empty_graph<T: Weight>(&self) -> GraphResult<Graph<T>> {
        let n = self.config.nodes;
        let mut expected_edges = (n as f64 * n as f64 * self.config.edge_chance()) as usize;
        if !self.config.flags.contains(GraphCreationFlags::DIRECTED) {
            expected_edges = expected_edges.saturating_mul(2);
        }

        let mut graph = Graph::with_capacity(self.config.storage, n, expected_edges)?;
        for _ in 0..n {
            graph.add_node(T::default())?;
        }
        if self.config.storage.has_matrix() {
            graph.alloc_adjacency_matrix()?;
        }
        Ok(graph)
    }

    fn merge<T: Weight>(&self, graph: &mut Graph<T>, node: NodeId, sample: NodeSample<T>) -> GraphResult<()> {
        let insert_reciprocal = !self.config.flags.contains(GraphCreationFlags::DIRECTED);
        if let Some(slot) = graph.node_mut(node) {
            slot.weight = sample.weight;
        }
        for (destination, weight) in sample.edges {
            graph.add_edge(node, destination, weight, insert_reciprocal)?;
        }
        Ok(())
    }

    fn sample_node<T: Weight>(&self, node: NodeId) -> NodeSample<T> {
        let flags = self.config.flags;
        let allow_cycles = flags.contains(GraphCreationFlags::ALLOW_CYCLES);
        let node_count = self.config.nodes;
        let chance = self.config.edge_chance();
        let scale = self.config.weight_scale;
        let mut rng = Pcg64Mcg::seed_from_u64(node_seed(self.base_seed, node));

        let weight = draw_weight(&mut rng, scale);
        let mut edges = Vec::new();
        for destination in 0..node_count {
            let roll: f64 = rng.random();
            if roll >= chance {
                continue;
            }
            if !allow_cycles && destination == node {
                continue;
            }
            edges.push((destination, draw_weight(&mut rng, scale)));
        }

        if flags.contains(GraphCreationFlags::CONNECTED) && edges.is_empty() {
            if node_count == 1 && !allow_cycles {
                warn!(node, "cannot connect the only node without a self-loop");
            } else {
                let mut destination = rng.random_range(0..node_count);
                while !allow_cycles && destination == node {
                    destination = rng.random_range(0..node_count);
                }
                edges.push((destination, draw_weight(&mut rng, scale)));
            }
        }

        NodeSample { weight, edges }
    }
}

fn settle<T>(
    node: NodeId,
    joined: thread::Result<NodeSample<T>>,
    samples: &mut [Option<NodeSample<T>>],
    failed: &mut Vec<NodeId>,
) {
    match joined {
        Ok(sample) => samples[node] = Some(sample),
        Err(_) => {
            error!(node, "generator worker panicked");
            failed.push(node);
        }
    }
}

fn draw_weight<T: Weight, R: Rng>(rng: &mut R, scale: f64) -> T {
    let unit: f64 = rng.random();
    T::from(unit * scale).unwrap_or_default()
}

/// Independent, well-mixed seed for one node's stream (splitmix64 finalizer).
fn node_seed(base: u64, node: NodeId) -> u64 {
    let mut z = base ^ (node as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn clock_seed(fallback: u64) -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(fallback)
}
