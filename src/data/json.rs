//! JSON edge lists

use crate::data::EdgeRecord;
use crate::graph::attributed::Attributes;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Debug, Deserialize)]
struct RawEdge {
    source: Value,
    target: Value,
    #[serde(flatten)]
    attributes: Attributes,
}

fn label(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Parse a JSON array of `{"source": .., "target": .., ...}` objects.
///
/// Every other key of an edge object becomes an edge attribute.
pub fn parse_edge_list(text: &str) -> Result<Vec<EdgeRecord>> {
    let raw: Vec<RawEdge> = serde_json::from_str(text).context("Malformed JSON edge list")?;

    Ok(raw
        .into_iter()
        .map(|edge| EdgeRecord {
            source: label(edge.source),
            target: label(edge.target),
            attributes: edge.attributes,
        })
        .collect())
}

/// Read and parse a JSON edge list file
pub fn load_edge_list(path: &str) -> Result<Vec<EdgeRecord>> {
    log::info!("Reading JSON edge list: {}", path);

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let records = parse_edge_list(&text)?;

    log::info!("Loaded {} edges", records.len());
    Ok(records)
}
