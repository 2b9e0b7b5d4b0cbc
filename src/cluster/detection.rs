//! Reference Louvain driver built on the index operations

use crate::config::{DetectionConfig, IndexOptions};
use crate::error::IndexResult;
use crate::graph::HostGraph;
use crate::louvain::{
    DirectedDegrees, DirectedLouvainIndex, LouvainIndex, UndirectedDegrees, UndirectedLouvainIndex,
};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// State of the index after one local-moving phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: usize,
    pub communities: usize,
    pub arcs: usize,
    pub moves: usize,
    pub modularity: f64,
}

/// Outcome of a full detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub levels: Vec<LevelSummary>,
    pub modularity: f64,
}

/// Dense per-community accumulators reused across nodes
#[derive(Debug)]
pub struct Scratch {
    incoming: Vec<f64>,
    outgoing: Vec<f64>,
    seen: Vec<bool>,
    touched: Vec<usize>,
}

impl Scratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            incoming: vec![0.0; capacity],
            outgoing: vec![0.0; capacity],
            seen: vec![false; capacity],
            touched: Vec::new(),
        }
    }

    #[inline]
    fn touch(&mut self, community: usize) {
        if !self.seen[community] {
            self.seen[community] = true;
            self.touched.push(community);
        }
    }

    fn reset(&mut self) {
        for &c in &self.touched {
            self.incoming[c] = 0.0;
            self.outgoing[c] = 0.0;
            self.seen[c] = false;
        }
        self.touched.clear();
    }
}

/// One local-moving sweep: every node greedily joins the neighboring
/// community with the best modularity gain
pub trait LocalMoving: LouvainIndex {
    /// Visit every live node once and return how many were moved
    fn sweep(&mut self, scratch: &mut Scratch, min_gain: f64) -> usize;
}

impl<N: Copy + Eq + Hash> LocalMoving for UndirectedLouvainIndex<N> {
    fn sweep(&mut self, scratch: &mut Scratch, min_gain: f64) -> usize {
        let mut moves = 0;

        for i in 0..self.community_count() {
            let current = self.belonging(i);
            let mut degree = 0.0;

            for j in self.bounds(i) {
                let weight = self.core().weight(j);
                let community = self.belonging(self.core().neighbor(j));

                degree += weight;
                scratch.touch(community);
                scratch.outgoing[community] += weight;
            }

            let own = scratch.outgoing[current];
            let mut best = current;
            let mut best_gain = self.delta_with_own_community(i, degree, own, current);

            for &community in &scratch.touched {
                if community == current {
                    continue;
                }

                let gain = self.delta(i, degree, scratch.outgoing[community], community);
                if gain > best_gain + min_gain {
                    best = community;
                    best_gain = gain;
                }
            }

            if best != current {
                let figures = UndirectedDegrees {
                    degree,
                    current_community_degree: own,
                    target_community_degree: scratch.outgoing[best],
                };
                self.move_node(i, figures, best);
                moves += 1;
            }

            scratch.reset();
        }

        moves
    }
}

impl<N: Copy + Eq + Hash> LocalMoving for DirectedLouvainIndex<N> {
    fn sweep(&mut self, scratch: &mut Scratch, min_gain: f64) -> usize {
        let mut moves = 0;

        for i in 0..self.community_count() {
            let current = self.belonging(i);
            let mut in_degree = 0.0;
            let mut out_degree = 0.0;

            for j in self.out_bounds(i) {
                let weight = self.core().weight(j);
                let community = self.belonging(self.core().neighbor(j));

                out_degree += weight;
                scratch.touch(community);
                scratch.outgoing[community] += weight;
            }

            for j in self.in_bounds(i) {
                let weight = self.core().weight(j);
                let community = self.belonging(self.core().neighbor(j));

                in_degree += weight;
                scratch.touch(community);
                scratch.incoming[community] += weight;
            }

            let own = scratch.incoming[current] + scratch.outgoing[current];
            let mut best = current;
            let mut best_gain =
                self.delta_with_own_community(i, in_degree, out_degree, own, current);

            for &community in &scratch.touched {
                if community == current {
                    continue;
                }

                let linked = scratch.incoming[community] + scratch.outgoing[community];
                let gain = self.delta(i, in_degree, out_degree, linked, community);
                if gain > best_gain + min_gain {
                    best = community;
                    best_gain = gain;
                }
            }

            if best != current {
                let figures = DirectedDegrees {
                    in_degree,
                    out_degree,
                    current_community_in_degree: scratch.incoming[current],
                    current_community_out_degree: scratch.outgoing[current],
                    target_community_in_degree: scratch.incoming[best],
                    target_community_out_degree: scratch.outgoing[best],
                };
                self.move_node(i, figures, best);
                moves += 1;
            }

            scratch.reset();
        }

        moves
    }
}

/// Alternate local moving and coarsening until a level makes no move.
///
/// On return the index's current level holds the final partition.
pub fn detect<I: LocalMoving>(index: &mut I, config: &DetectionConfig) -> Detection {
    let mut scratch = Scratch::new(index.community_count());
    let mut levels = Vec::new();

    loop {
        let mut moves = 0;

        for pass in 0..config.max_passes {
            let moved = index.sweep(&mut scratch, config.min_gain);
            log::debug!("Level {} pass {}: {} moves", index.level(), pass, moved);

            moves += moved;
            if moved == 0 {
                break;
            }
        }

        let summary = LevelSummary {
            level: index.level(),
            communities: index.community_count(),
            arcs: index.arc_count(),
            moves,
            modularity: index.modularity(),
        };

        log::info!(
            "Level {}: {} moves over {} nodes, modularity {:.6}",
            summary.level,
            summary.moves,
            summary.communities,
            summary.modularity
        );

        levels.push(summary);

        if moves == 0 {
            break;
        }

        index.zoom_out();

        if index.level() >= config.max_levels || index.community_count() <= 1 {
            break;
        }
    }

    Detection {
        modularity: index.modularity(),
        levels,
    }
}

/// Build an undirected index over `graph` and run the driver on it
pub fn detect_undirected<G>(
    graph: &G,
    options: &IndexOptions,
    config: &DetectionConfig,
) -> IndexResult<(UndirectedLouvainIndex<G::NodeId>, Detection)>
where
    G: HostGraph,
{
    let mut index = UndirectedLouvainIndex::new(graph, options)?;
    let detection = detect(&mut index, config);
    Ok((index, detection))
}

/// Build a directed index over `graph` and run the driver on it
pub fn detect_directed<G>(
    graph: &G,
    options: &IndexOptions,
    config: &DetectionConfig,
) -> IndexResult<(DirectedLouvainIndex<G::NodeId>, Detection)>
where
    G: HostGraph,
{
    let mut index = DirectedLouvainIndex::new(graph, options)?;
    let detection = detect(&mut index, config);
    Ok((index, detection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::metrics;
    use crate::graph::{DirectedGraph, UndirectedGraph};

    fn ring_of_cliques(cliques: usize, size: usize) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        for c in 0..cliques {
            for a in 0..size {
                for b in (a + 1)..size {
                    edges.push((format!("{c}-{a}"), format!("{c}-{b}")));
                }
            }
            edges.push((format!("{c}-0"), format!("{}-1", (c + 1) % cliques)));
        }
        edges
    }

    #[test]
    fn finds_the_cliques_of_a_ring() {
        let mut graph = UndirectedGraph::new();
        for (source, target) in ring_of_cliques(6, 5) {
            graph.merge_weighted_edge(&source, &target, 1.0);
        }

        let options = IndexOptions::default().keep_dendrogram(true);
        let (index, detection) =
            detect_undirected(&graph, &options, &DetectionConfig::default()).unwrap();

        let communities = index.collect();
        for c in 0..6 {
            let first = communities[&graph.node_index(&format!("{c}-0")).unwrap()];
            for a in 1..5 {
                assert_eq!(communities[&graph.node_index(&format!("{c}-{a}")).unwrap()], first);
            }
        }

        let recomputed = metrics::modularity(&graph, &communities, &options).unwrap();
        assert!((recomputed - detection.modularity).abs() < 1e-9);
        assert!(detection.modularity > 0.6);

        let gains: Vec<f64> = detection.levels.iter().map(|l| l.modularity).collect();
        assert!(gains.windows(2).all(|w| w[1] >= w[0] - 1e-12));
    }

    #[test]
    fn directed_detection_agrees_with_recomputation() {
        let mut graph = DirectedGraph::new();
        for (source, target) in ring_of_cliques(4, 4) {
            graph.merge_weighted_edge(&source, &target, 1.0);
            graph.merge_weighted_edge(&target, &source, 1.0);
        }

        let options = IndexOptions::default();
        let (index, detection) =
            detect_directed(&graph, &options, &DetectionConfig::default()).unwrap();

        let communities = index.collect();
        let recomputed = metrics::modularity(&graph, &communities, &options).unwrap();
        assert!((recomputed - detection.modularity).abs() < 1e-9);
        assert!(detection.modularity > 0.5);
    }

    #[test]
    fn edgeless_graph_stops_immediately() {
        let mut graph = UndirectedGraph::new();
        graph.merge_node("a");
        graph.merge_node("b");

        let options = IndexOptions::default();
        let (index, detection) =
            detect_undirected(&graph, &options, &DetectionConfig::default()).unwrap();

        assert_eq!(index.level(), 0);
        assert_eq!(detection.levels.len(), 1);
        assert_eq!(detection.levels[0].moves, 0);
    }
}
