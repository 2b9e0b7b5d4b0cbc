//! Edge-list loading into attributed host graphs

pub mod json;
pub mod parquet;

use crate::graph::attributed::{AttributedGraph, Attributes};
use petgraph::EdgeType;
use std::path::Path;

/// One edge of an input edge list
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub attributes: Attributes,
}

/// Merge every record into a new graph, in file order
pub fn into_graph<Ty: EdgeType>(records: Vec<EdgeRecord>) -> AttributedGraph<Ty> {
    let mut graph = AttributedGraph::with_capacity(records.len(), records.len());

    for record in records {
        graph.merge_edge(&record.source, &record.target, record.attributes);
    }

    log::info!(
        "Built graph with {} nodes and {} edges",
        graph.inner().node_count(),
        graph.inner().edge_count()
    );

    graph
}

/// Load an edge list, picking the reader from the file extension
pub fn load_edge_list(path: &str, weight_attribute: &str) -> anyhow::Result<Vec<EdgeRecord>> {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("parquet") => parquet::load_edge_list(path, weight_attribute),
        Some("json") => json::load_edge_list(path),
        other => Err(anyhow::anyhow!("Unsupported edge list format: {:?}", other)),
    }
}
