//! Louvain index over undirected graphs

use crate::config::IndexOptions;
use crate::error::{IndexError, IndexResult};
use crate::graph::builder::{build_adjacency, Totals};
use crate::graph::HostGraph;
use crate::louvain::csr::{carry_over, CommunityCore};
use crate::louvain::LouvainIndex;
use petgraph::stable_graph::NodeIndex;
use std::fmt;
use std::hash::Hash;

/// Degree figures of a node with respect to its current and a target community.
///
/// `degree` excludes self-loops; the community degrees are the weights of the
/// node's arcs landing in each community, counted once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UndirectedDegrees {
    pub degree: f64,
    pub current_community_degree: f64,
    pub target_community_degree: f64,
}

/// Louvain index for undirected graphs.
///
/// Each edge occupies one arc per endpoint. `total_weights[c]` sums the
/// degrees (self-loops counted twice) of the members of `c`, so over live
/// communities it always adds up to `2M`.
#[derive(Clone)]
pub struct UndirectedLouvainIndex<N = NodeIndex> {
    core: CommunityCore<N>,
    total_weights: Vec<f64>,
}

impl<N: Copy + Eq + Hash> UndirectedLouvainIndex<N> {
    /// Index `graph`, every node starting in its own community
    pub fn new<G>(graph: &G, options: &IndexOptions) -> IndexResult<Self>
    where
        G: HostGraph<NodeId = N>,
    {
        let adjacency = build_adjacency(graph, options, false)?;
        let (core, totals) =
            CommunityCore::from_adjacency(adjacency, options.resolution, options.history);

        let Totals::Undirected(total_weights) = totals else {
            return Err(IndexError::DirectionMismatch {
                expected: "undirected",
                found: "directed",
            });
        };

        log::info!(
            "Built undirected Louvain index: {} nodes, {} arcs, total weight {}",
            core.communities,
            core.arcs,
            core.total_weight
        );
        log::debug!("Estimated index memory: {} bytes", core.memory_usage());

        Ok(Self { core, total_weights })
    }

    /// Total incident weight of every live community
    pub fn total_weights(&self) -> &[f64] {
        self.core.live(&self.total_weights)
    }

    /// Internal weight of every live community
    pub fn internal_weights(&self) -> &[f64] {
        self.core.live(&self.core.internal_weights)
    }

    /// Degree figures of node `i` for a move into `target`, from live state.
    /// O(degree(i)).
    pub fn degrees(&self, i: usize, target: usize) -> UndirectedDegrees {
        let current = self.core.belonging(i);
        let mut figures = UndirectedDegrees::default();

        for j in self.core.bounds(i) {
            let weight = self.core.weight(j);
            let community = self.core.belonging(self.core.neighbor(j));

            figures.degree += weight;

            if community == target {
                figures.target_community_degree += weight;
            }

            if community == current {
                figures.current_community_degree += weight;
            }
        }

        figures
    }

    /// Move node `i` into `target` in O(1), given correct degree figures.
    ///
    /// Moving a node into the community it already belongs to is a no-op.
    pub fn move_node(&mut self, i: usize, figures: UndirectedDegrees, target: usize) {
        let current = self.core.belonging(i);

        if current == target {
            return;
        }

        let loops = self.core.loops(i);
        let contribution = figures.degree + loops;

        self.total_weights[current] -= contribution;
        self.total_weights[target] += contribution;

        self.core.internal_weights[current] -= figures.current_community_degree * 2.0 + loops;
        self.core.internal_weights[target] += figures.target_community_degree * 2.0 + loops;

        self.core.belongings.set(i, target);
    }

    /// Move node `i` into `target`, computing its degree figures first
    pub fn expensive_move(&mut self, i: usize, target: usize) {
        let figures = self.degrees(i, target);
        self.move_node(i, figures, target);
    }

    /// Modularity gain of inserting node `i`, considered isolated, into
    /// `target`. O(1).
    ///
    /// `target` must not be the community currently holding `i`; use
    /// [`delta_with_own_community`](Self::delta_with_own_community) for that.
    pub fn delta(&self, i: usize, degree: f64, target_community_degree: f64, target: usize) -> f64 {
        let m = self.core.total_weight;
        let degree = degree + self.core.loops(i);

        target_community_degree / m
            - self.core.resolution * (self.total_weights[target] * degree) / (2.0 * m * m)
    }

    /// Same gain as [`delta`](Self::delta), for the community `i` is already
    /// part of: the node's own contribution is removed from the community total.
    pub fn delta_with_own_community(
        &self,
        i: usize,
        degree: f64,
        target_community_degree: f64,
        target: usize,
    ) -> f64 {
        let m = self.core.total_weight;
        let degree = degree + self.core.loops(i);

        target_community_degree / m
            - self.core.resolution * ((self.total_weights[target] - degree) * degree)
                / (2.0 * m * m)
    }
}

impl<N: Copy + Eq + Hash> LouvainIndex for UndirectedLouvainIndex<N> {
    type Node = N;

    fn core(&self) -> &CommunityCore<N> {
        &self.core
    }

    fn modularity(&self) -> f64 {
        if self.core.total_weight == 0.0 {
            return 0.0;
        }

        let m2 = self.core.total_weight * 2.0;

        (0..self.core.communities)
            .map(|c| {
                self.core.internal_weights[c] / m2
                    - (self.total_weights[c] / m2).powi(2) * self.core.resolution
            })
            .sum()
    }

    fn zoom_out(&mut self) {
        let origins = self.core.coarsen();
        carry_over(&mut self.total_weights, &origins);

        log::info!(
            "Zoomed out to level {}: {} communities, {} arcs",
            self.core.level,
            self.core.communities,
            self.core.arcs
        );
    }
}

impl<N: fmt::Debug> fmt::Debug for UndirectedLouvainIndex<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndirectedLouvainIndex")
            .field("core", &self.core)
            .field("total_weights", &&self.total_weights[..self.core.communities])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryMode;
    use crate::graph::UndirectedGraph;

    const TOLERANCE: f64 = 1e-9;

    fn graph(edges: &[(&str, &str, f64)]) -> UndirectedGraph {
        let mut graph = UndirectedGraph::new();
        for &(source, target, weight) in edges {
            graph.merge_weighted_edge(source, target, weight);
        }
        graph
    }

    fn two_triangles() -> UndirectedGraph {
        graph(&[
            ("a", "b", 1.0),
            ("b", "c", 1.0),
            ("c", "a", 1.0),
            ("d", "e", 1.0),
            ("e", "f", 1.0),
            ("f", "d", 1.0),
            ("c", "d", 1.0),
        ])
    }

    fn assert_conserved(index: &UndirectedLouvainIndex) {
        let sum: f64 = index.total_weights().iter().sum();
        assert!((sum - 2.0 * index.total_weight()).abs() < TOLERANCE);
    }

    #[test]
    fn null_move_is_exactly_idempotent() {
        let mut index =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();
        index.expensive_move(1, 0);
        index.expensive_move(2, 0);

        let before = (index.total_weights().to_vec(), index.internal_weights().to_vec());
        let belongings: Vec<usize> = (0..6).map(|i| index.belonging(i)).collect();

        let figures = index.degrees(2, 0);
        assert_eq!(figures.current_community_degree, figures.target_community_degree);
        index.move_node(2, figures, 0);

        assert_eq!(before, (index.total_weights().to_vec(), index.internal_weights().to_vec()));
        assert_eq!(belongings, (0..6).map(|i| index.belonging(i)).collect::<Vec<_>>());
    }

    #[test]
    fn moves_conserve_total_weight() {
        let mut index =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();
        assert_conserved(&index);

        for (node, target) in [(1, 0), (2, 0), (4, 3), (5, 3), (2, 3), (2, 0)] {
            index.expensive_move(node, target);
            assert_conserved(&index);
        }

        assert_eq!(index.internal_weights()[0], 6.0);
        assert_eq!(index.internal_weights()[3], 6.0);
    }

    #[test]
    fn delta_matches_modularity_difference() {
        let mut isolated =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();
        isolated.expensive_move(1, 0);

        let mut joined = isolated.clone();
        joined.expensive_move(2, 0);

        let figures = isolated.degrees(2, 0);
        let delta = isolated.delta(2, figures.degree, figures.target_community_degree, 0);
        let observed = joined.modularity() - isolated.modularity();
        assert!((delta - observed).abs() < TOLERANCE);

        let own = joined.degrees(2, 0);
        let delta_own =
            joined.delta_with_own_community(2, own.degree, own.target_community_degree, 0);
        assert!((delta_own - observed).abs() < TOLERANCE);
    }

    #[test]
    fn delta_accounts_for_resolution() {
        let options = IndexOptions::default().with_resolution(0.5);
        let isolated = UndirectedLouvainIndex::new(&two_triangles(), &options).unwrap();

        let mut joined = isolated.clone();
        joined.expensive_move(3, 2);

        let figures = isolated.degrees(3, 2);
        let delta = isolated.delta(3, figures.degree, figures.target_community_degree, 2);
        assert!((delta - (joined.modularity() - isolated.modularity())).abs() < TOLERANCE);
    }

    #[test]
    fn zoom_out_preserves_modularity_and_renumbers() {
        let options = IndexOptions::default().keep_dendrogram(true);
        let mut index = UndirectedLouvainIndex::new(&two_triangles(), &options).unwrap();

        for (node, target) in [(1, 0), (2, 0), (4, 3), (5, 3)] {
            index.expensive_move(node, target);
        }

        let before = index.modularity();
        index.zoom_out();

        assert!((index.modularity() - before).abs() < TOLERANCE);
        assert_eq!(index.community_count(), 2);
        assert_eq!(index.arc_count(), 2);
        assert_eq!(index.level(), 1);
        assert_eq!(index.belonging(0), 0);
        assert_eq!(index.belonging(1), 1);
        assert_eq!(index.internal_weights(), &[6.0, 6.0]);
        assert_eq!(index.total_weights(), &[7.0, 7.0]);
        assert_conserved(&index);
    }

    #[test]
    fn community_survives_its_owner_leaving() {
        let mut index =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();

        // b and c join a's community, then a itself leaves for d's
        index.expensive_move(1, 0);
        index.expensive_move(2, 0);
        index.expensive_move(0, 3);

        let before = index.modularity();
        index.zoom_out();

        assert_eq!(index.community_count(), 4);
        assert!((index.modularity() - before).abs() < TOLERANCE);
        assert_conserved(&index);

        let communities = index.collect();
        let b = index.core().nodes()[1];
        let c = index.core().nodes()[2];
        assert_eq!(communities[&b], communities[&c]);
    }

    #[test]
    fn isolated_node_survives_coarsening() {
        let mut host = two_triangles();
        host.merge_node("z");

        let mut index = UndirectedLouvainIndex::new(&host, &IndexOptions::default()).unwrap();
        assert!(index.bounds(6).is_empty());
        assert_eq!(index.degrees(6, 0), UndirectedDegrees::default());

        index.expensive_move(1, 0);
        index.zoom_out();

        assert_eq!(index.community_count(), 6);
        assert!(index.bounds(5).is_empty());
        assert_eq!(index.total_weights()[5], 0.0);
    }

    #[test]
    fn flattened_history_only_serves_current_level() {
        let mut index =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();
        assert_eq!(index.core().history().mode(), HistoryMode::FlattenedOnly);

        index.expensive_move(1, 0);
        index.zoom_out();

        assert!(index.collect_level(0).is_err());
        assert_eq!(index.collect().len(), 6);
    }

    #[test]
    fn debug_output_is_truncated_to_live_prefix() {
        let mut index =
            UndirectedLouvainIndex::new(&two_triangles(), &IndexOptions::default()).unwrap();
        for (node, target) in [(1, 0), (2, 0), (4, 3), (5, 3)] {
            index.expensive_move(node, target);
        }
        index.zoom_out();

        let rendered = format!("{:?}", index);
        assert!(rendered.contains("total_weights: [7.0, 7.0]"));
        assert!(rendered.contains("starts: [0, 1, 2]"));
    }
}
