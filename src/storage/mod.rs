//! Results persistence module

use crate::cluster::detection::Detection;
use crate::cluster::Community;
use crate::config::HistoryMode;
use crate::louvain::History;
use anyhow::Result;
use serde::Serialize;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Host graph figures reported alongside the partition
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub directed: bool,
    pub weighted: bool,
    pub resolution: f64,
}

/// Save detection results to the specified directory.
///
/// `labels` gives the host label of every level-0 node, in index order; it
/// is only written out next to a full dendrogram.
pub fn save_results(
    stats: &GraphStats,
    detection: &Detection,
    communities: &[Community],
    history: &History,
    labels: &[String],
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving {} communities to {}", communities.len(), output_dir);

    fs::create_dir_all(output_dir)?;

    save_summary(stats, detection, communities, output_dir)?;
    save_json(communities, output_dir, "communities.json")?;

    if history.mode() == HistoryMode::Full {
        let dendrogram = json!({
            "nodes": labels,
            "levels": history.levels(),
        });
        save_json(&dendrogram, output_dir, "dendrogram.json")?;
    }

    log::info!("Results saved successfully");

    Ok(())
}

fn save_summary(
    stats: &GraphStats,
    detection: &Detection,
    communities: &[Community],
    output_dir: &str,
) -> Result<()> {
    let sizes: Vec<usize> = communities.iter().map(|c| c.size).collect();

    let summary = json!({
        "graph_stats": stats,
        "community_stats": {
            "community_count": communities.len(),
            "largest_community_size": sizes.iter().max().copied().unwrap_or(0),
            "singleton_count": sizes.iter().filter(|&&s| s == 1).count(),
            "avg_community_size": if sizes.is_empty() {
                0.0
            } else {
                sizes.iter().sum::<usize>() as f64 / sizes.len() as f64
            },
        },
        "levels": detection.levels,
        "modularity": detection.modularity,
    });

    save_json(&summary, output_dir, "summary.json")
}

fn save_json<T: Serialize + ?Sized>(value: &T, output_dir: &str, name: &str) -> Result<()> {
    let path = Path::new(output_dir).join(name);
    log::debug!("Writing {}", path.display());

    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;

    Ok(())
}
