mod visitors;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use graph_visit_core::{
    DfsOrder, GeneratorConfig, Graph, GraphCreationFlags, GraphGenerator, NodeId, StorageType,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::visitors::{ComponentPrinter, PathFinder, PathOutcome};

#[derive(Parser, Debug)]
#[command(name = "graph-visit-bench")]
#[command(about = "Generate a random graph and time visitor-driven walks over it", long_about = None)]
struct Args {
    /// Which walks to run
    #[arg(value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// JSON generator config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    nodes: Option<usize>,

    /// Worker pool size for generation
    #[arg(long)]
    threads: Option<usize>,

    /// Base seed, used with the `consistent` flag
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    weight_scale: Option<f64>,

    #[arg(long, value_enum)]
    storage: Option<StorageArg>,

    /// Creation flags; replaces the configured set when given
    #[arg(long = "flag", value_enum)]
    flags: Vec<FlagArg>,

    /// Generate on the calling thread instead of the worker pool
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Walk source node
    #[arg(long)]
    source: Option<NodeId>,

    /// Path target node (defaults to the last node)
    #[arg(long)]
    target: Option<NodeId>,

    /// Print every component's node ids after each walk
    #[arg(long, default_value_t = false)]
    print_components: bool,

    /// Log filter, e.g. `debug` or `graph_visit_core=debug`; falls back to RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Bfs,
    DfsPre,
    DfsPost,
    Path,
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StorageArg {
    List,
    Matrix,
    Both,
}

impl From<StorageArg> for StorageType {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::List => StorageType::LIST,
            StorageArg::Matrix => StorageType::MATRIX,
            StorageArg::Both => StorageType::BOTH,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FlagArg {
    Connected,
    Directed,
    Sparse,
    Consistent,
    AllowCycles,
}

impl From<FlagArg> for GraphCreationFlags {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::Connected => GraphCreationFlags::CONNECTED,
            FlagArg::Directed => GraphCreationFlags::DIRECTED,
            FlagArg::Sparse => GraphCreationFlags::SPARSE,
            FlagArg::Consistent => GraphCreationFlags::CONSISTENT,
            FlagArg::AllowCycles => GraphCreationFlags::ALLOW_CYCLES,
        }
    }
}

/// Kind of walk timed by [`run_walk`].
#[derive(Clone, Copy, Debug)]
enum Walk {
    Bfs,
    Dfs(DfsOrder),
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    let config = resolve_config(&args)?;
    let generator = GraphGenerator::new(config)?;

    println!("graph-visit-bench");
    println!("=================");
    println!();

    let config = generator.config();
    println!(
        "Target: {} nodes, storage {:?}, flags {:#07b}, base seed {}",
        config.nodes,
        config.storage,
        config.flags.bits(),
        generator.base_seed()
    );

    let t = Instant::now();
    let mut graph: Graph<f64> = if args.sequential {
        generator.generate()?
    } else {
        generator.generate_threaded()?
    };
    let gen_time = t.elapsed();
    println!(
        "Generated in {:.2}s: {} nodes, {} edges, ~{:.1}MB",
        gen_time.as_secs_f64(),
        graph.node_count(),
        graph.edge_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "graph ready");

    let walks: Vec<(&str, Walk)> = match args.mode {
        Mode::Bfs => vec![("bfs", Walk::Bfs)],
        Mode::DfsPre => vec![("dfs-pre", Walk::Dfs(DfsOrder::PreOrder))],
        Mode::DfsPost => vec![("dfs-post", Walk::Dfs(DfsOrder::PostOrder))],
        Mode::Path => Vec::new(),
        Mode::All => vec![
            ("bfs", Walk::Bfs),
            ("dfs-pre", Walk::Dfs(DfsOrder::PreOrder)),
            ("dfs-post", Walk::Dfs(DfsOrder::PostOrder)),
        ],
    };

    if !walks.is_empty() {
        println!();
        println!("{:>10} {:>12} {:>12} {:>10}", "walk", "components", "visited", "time");
        println!("{:->10} {:->12} {:->12} {:->10}", "", "", "", "");
    }
    for (name, walk) in walks {
        run_walk(name, walk, &mut graph, args.source, args.print_components)?;
    }

    if matches!(args.mode, Mode::Path | Mode::All) {
        let source = args.source.unwrap_or(0);
        let target = args.target.unwrap_or(graph.node_count() - 1);
        run_path(&mut graph, source, target)?;
    }
    println!();
    Ok(())
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// Config file (or defaults), then command-line overrides.
fn resolve_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(scale) = args.weight_scale {
        config.weight_scale = scale;
    }
    if let Some(storage) = args.storage {
        config.storage = storage.into();
    }
    if !args.flags.is_empty() {
        config.flags = args
            .flags
            .iter()
            .fold(GraphCreationFlags::EMPTY, |acc, &flag| acc | GraphCreationFlags::from(flag));
    }

    config.validate()?;
    Ok(config)
}

fn run_walk(
    name: &str,
    walk: Walk,
    graph: &mut Graph<f64>,
    source: Option<NodeId>,
    print_components: bool,
) -> Result<()> {
    let mut printer = ComponentPrinter::new(source);

    let t = Instant::now();
    let status = match walk {
        Walk::Bfs => graph.bfs(&mut printer)?,
        Walk::Dfs(order) => graph.dfs(&mut printer, order)?,
    };
    let elapsed = t.elapsed();

    println!(
        "{:>10} {:>12} {:>12} {:>8.1}ms",
        name,
        printer.components().len(),
        printer.visited(),
        elapsed.as_secs_f64() * 1000.0
    );
    if status.is_aborted() {
        println!("{:>10} (walk aborted)", "");
    }
    if print_components {
        printer.write_to(io::stdout().lock())?;
    }
    Ok(())
}

fn run_path(graph: &mut Graph<f64>, source: NodeId, target: NodeId) -> Result<()> {
    if graph.node(target).is_none() {
        anyhow::bail!("target {target} is not a node of a {}-node graph", graph.node_count());
    }
    let mut finder = PathFinder::new(source, target);

    println!();
    let t = Instant::now();
    graph.bfs(&mut finder)?;
    let elapsed = t.elapsed();

    match finder.outcome() {
        PathOutcome::Found(path) => println!(
            "Shortest path {} → {}: {} hops in {:.1}ms",
            source,
            target,
            path.len() - 1,
            elapsed.as_secs_f64() * 1000.0
        ),
        _ => println!(
            "Shortest path {} → {}: no path ({:.1}ms)",
            source,
            target,
            elapsed.as_secs_f64() * 1000.0
        ),
    }
    Ok(())
}
