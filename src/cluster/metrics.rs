//! Partition statistics computed from scratch on the host graph

use crate::config::IndexOptions;
use crate::error::{IndexError, IndexResult};
use crate::graph::builder::edge_weight;
use crate::graph::HostGraph;
use std::collections::HashMap;

/// Per-community accumulators for a single sweep over the edges
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    internal: f64,
    incoming: f64,
    outgoing: f64,
}

fn community_of<G: HostGraph>(
    communities: &HashMap<G::NodeId, usize>,
    node: G::NodeId,
) -> IndexResult<usize> {
    communities
        .get(&node)
        .copied()
        .ok_or_else(|| IndexError::InvalidInput(format!("node {:?} has no community", node)))
}

fn accumulate<G: HostGraph>(
    graph: &G,
    communities: &HashMap<G::NodeId, usize>,
    options: &IndexOptions,
) -> IndexResult<(HashMap<usize, Accumulator>, f64)> {
    let directed = graph.is_directed();
    let mut stats: HashMap<usize, Accumulator> = HashMap::new();
    let mut m = 0.0;

    for edge in graph.edges() {
        let (source, target) = graph
            .extremities(edge)
            .ok_or_else(|| IndexError::InvalidInput(format!("dangling edge {:?}", edge)))?;

        let cs = community_of::<G>(communities, source)?;
        let ct = community_of::<G>(communities, target)?;
        let weight = edge_weight(graph, edge, options);
        m += weight;

        if cs == ct {
            stats.entry(cs).or_default().internal += if directed { weight } else { 2.0 * weight };
        }

        stats.entry(cs).or_default().outgoing += weight;
        stats.entry(ct).or_default().incoming += weight;
    }

    Ok((stats, m))
}

/// Modularity of `graph` partitioned by `communities`, in O(V + E).
///
/// Independent of the Louvain indices: every edge is read straight from the
/// host, so it serves as a cross-check of their incremental bookkeeping.
pub fn modularity<G: HostGraph>(
    graph: &G,
    communities: &HashMap<G::NodeId, usize>,
    options: &IndexOptions,
) -> IndexResult<f64> {
    let (stats, m) = accumulate(graph, communities, options)?;

    if m == 0.0 {
        return Ok(0.0);
    }

    let q = if graph.is_directed() {
        stats
            .values()
            .map(|s| s.internal / m - options.resolution * s.incoming * s.outgoing / (m * m))
            .sum()
    } else {
        let m2 = 2.0 * m;
        stats
            .values()
            .map(|s| {
                s.internal / m2 - options.resolution * ((s.incoming + s.outgoing) / m2).powi(2)
            })
            .sum()
    };

    Ok(q)
}

/// `(internal, incident)` weight of every community.
///
/// Internal weight counts each edge once; incident weight counts every edge
/// with at least one endpoint in the community once.
pub fn community_weights<G: HostGraph>(
    graph: &G,
    communities: &HashMap<G::NodeId, usize>,
    options: &IndexOptions,
) -> IndexResult<HashMap<usize, (f64, f64)>> {
    let mut weights: HashMap<usize, (f64, f64)> = HashMap::new();

    for edge in graph.edges() {
        let (source, target) = graph
            .extremities(edge)
            .ok_or_else(|| IndexError::InvalidInput(format!("dangling edge {:?}", edge)))?;

        let cs = community_of::<G>(communities, source)?;
        let ct = community_of::<G>(communities, target)?;
        let weight = edge_weight(graph, edge, options);

        if cs == ct {
            let entry = weights.entry(cs).or_default();
            entry.0 += weight;
            entry.1 += weight;
        } else {
            weights.entry(cs).or_default().1 += weight;
            weights.entry(ct).or_default().1 += weight;
        }
    }

    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UndirectedGraph;

    #[test]
    fn two_triangles_modularity() {
        let mut graph = UndirectedGraph::new();
        let edges = [
            ("a", "b"),
            ("b", "c"),
            ("c", "a"),
            ("d", "e"),
            ("e", "f"),
            ("f", "d"),
            ("c", "d"),
        ];
        for (source, target) in edges {
            graph.merge_weighted_edge(source, target, 1.0);
        }

        let communities: HashMap<_, _> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .enumerate()
            .map(|(i, label)| (graph.node_index(label).unwrap(), i / 3))
            .collect();

        // 2 * (6/14 - (7/14)^2)
        let q = modularity(&graph, &communities, &IndexOptions::default()).unwrap();
        assert!((q - 5.0 / 14.0).abs() < 1e-12);

        let weights = community_weights(&graph, &communities, &IndexOptions::default()).unwrap();
        assert_eq!(weights[&0], (3.0, 4.0));
    }

    #[test]
    fn missing_node_is_rejected() {
        let mut graph = UndirectedGraph::new();
        graph.merge_weighted_edge("a", "b", 1.0);

        let communities = HashMap::new();
        assert!(modularity(&graph, &communities, &IndexOptions::default()).is_err());
    }
}
