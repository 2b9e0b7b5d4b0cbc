use anyhow::Result;
use clap::Parser;
use louvain_index::cluster::{self, detection::Detection, metrics};
use louvain_index::config::{DetectionConfig, IndexOptions, DEFAULT_WEIGHT_ATTRIBUTE};
use louvain_index::data;
use louvain_index::graph::{AttributedGraph, DirectedGraph, UndirectedGraph};
use louvain_index::louvain::LouvainIndex;
use louvain_index::storage::{self, GraphStats};
use petgraph::stable_graph::NodeIndex;
use petgraph::EdgeType;

#[derive(Parser, Debug)]
#[clap(
    name = "louvain-index",
    about = "Louvain community detection over edge lists"
)]
struct Cli {
    /// Path to input edge list (.parquet or .json)
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "louvain_results")]
    output_dir: String,

    /// Treat edges as directed
    #[clap(long)]
    directed: bool,

    /// Read edge weights instead of counting every edge as 1
    #[clap(long)]
    weighted: bool,

    /// Edge attribute holding the weight
    #[clap(long, default_value = DEFAULT_WEIGHT_ATTRIBUTE)]
    weight_attribute: String,

    /// Modularity resolution
    #[clap(long, default_value = "1.0")]
    resolution: f64,

    /// Keep every level of the hierarchy and write dendrogram.json
    #[clap(long)]
    keep_dendrogram: bool,

    /// Maximum number of coarsening levels
    #[clap(long, default_value = "32")]
    max_levels: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Starting community detection");
    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    let options = IndexOptions::default()
        .weighted(args.weighted)
        .with_weight_attribute(&args.weight_attribute)
        .with_resolution(args.resolution)
        .keep_dendrogram(args.keep_dendrogram);
    let config = DetectionConfig {
        max_levels: args.max_levels,
        ..DetectionConfig::default()
    };

    let records = data::load_edge_list(&args.input, &args.weight_attribute)?;

    if args.directed {
        let graph: DirectedGraph = data::into_graph(records);
        let (index, detection) = cluster::detection::detect_directed(&graph, &options, &config)?;
        report(&graph, &index, &detection, &options, &args.output_dir)?;
    } else {
        let graph: UndirectedGraph = data::into_graph(records);
        let (index, detection) = cluster::detection::detect_undirected(&graph, &options, &config)?;
        report(&graph, &index, &detection, &options, &args.output_dir)?;
    }

    log::info!("Detection complete. Results saved to {}", args.output_dir);

    Ok(())
}

fn report<Ty, I>(
    graph: &AttributedGraph<Ty>,
    index: &I,
    detection: &Detection,
    options: &IndexOptions,
    output_dir: &str,
) -> Result<()>
where
    Ty: EdgeType,
    I: LouvainIndex<Node = NodeIndex>,
{
    let label = |node: NodeIndex| graph.label(node).unwrap_or_default().to_string();

    let mapping = index.collect();
    let weights = metrics::community_weights(graph, &mapping, options)?;
    let communities = cluster::communities_from_mapping(&mapping, &weights, label);

    log::info!(
        "Found {} communities, modularity {:.6}",
        communities.len(),
        detection.modularity
    );

    let stats = GraphStats {
        node_count: graph.inner().node_count(),
        edge_count: graph.inner().edge_count(),
        directed: graph.inner().is_directed(),
        weighted: options.weighted,
        resolution: options.resolution,
    };
    let labels: Vec<String> = index.core().nodes().iter().map(|&n| label(n)).collect();

    storage::save_results(
        &stats,
        detection,
        &communities,
        index.core().history(),
        &labels,
        output_dir,
    )
}
