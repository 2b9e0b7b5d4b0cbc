//! Louvain index over directed graphs

use crate::config::IndexOptions;
use crate::error::{IndexError, IndexResult};
use crate::graph::builder::{build_adjacency, Totals};
use crate::graph::HostGraph;
use crate::louvain::csr::{carry_over, CommunityCore};
use crate::louvain::LouvainIndex;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Range;

/// In/out degree figures of a node with respect to its current and a target
/// community. Self-loops are excluded from every figure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectedDegrees {
    pub in_degree: f64,
    pub out_degree: f64,
    pub current_community_in_degree: f64,
    pub current_community_out_degree: f64,
    pub target_community_in_degree: f64,
    pub target_community_out_degree: f64,
}

impl DirectedDegrees {
    /// Weight linking the node to the target community, both directions
    pub fn target_community_degree(&self) -> f64 {
        self.target_community_in_degree + self.target_community_out_degree
    }

    /// Weight linking the node to its current community, both directions
    pub fn current_community_degree(&self) -> f64 {
        self.current_community_in_degree + self.current_community_out_degree
    }
}

/// Louvain index for directed graphs.
///
/// Node `i` stores its outbound arcs in `starts[i]..offsets[i]` and its
/// inbound arcs in `offsets[i]..starts[i + 1]`. Over live communities both
/// `total_in_weights` and `total_out_weights` add up to `M`.
#[derive(Clone)]
pub struct DirectedLouvainIndex<N = NodeIndex> {
    core: CommunityCore<N>,
    total_in_weights: Vec<f64>,
    total_out_weights: Vec<f64>,
}

impl<N: Copy + Eq + Hash> DirectedLouvainIndex<N> {
    /// Index `graph`, every node starting in its own community
    pub fn new<G>(graph: &G, options: &IndexOptions) -> IndexResult<Self>
    where
        G: HostGraph<NodeId = N>,
    {
        let adjacency = build_adjacency(graph, options, true)?;
        let (core, totals) =
            CommunityCore::from_adjacency(adjacency, options.resolution, options.history);

        let Totals::Directed { incoming, outgoing } = totals else {
            return Err(IndexError::DirectionMismatch {
                expected: "directed",
                found: "undirected",
            });
        };

        log::info!(
            "Built directed Louvain index: {} nodes, {} arcs, total weight {}",
            core.communities,
            core.arcs,
            core.total_weight
        );
        log::debug!("Estimated index memory: {} bytes", core.memory_usage());

        Ok(Self {
            core,
            total_in_weights: incoming,
            total_out_weights: outgoing,
        })
    }

    /// Packed range of node `i`'s outbound arcs
    pub fn out_bounds(&self, i: usize) -> Range<usize> {
        self.core.starts.get(i)..self.core.split(i)
    }

    /// Packed range of node `i`'s inbound arcs
    pub fn in_bounds(&self, i: usize) -> Range<usize> {
        self.core.split(i)..self.core.starts.get(i + 1)
    }

    /// Inbound neighborhood of every live node, by label
    pub fn project_in(&self) -> HashMap<N, Vec<N>> {
        self.core.project_with(|i| self.in_bounds(i))
    }

    /// Outbound neighborhood of every live node, by label
    pub fn project_out(&self) -> HashMap<N, Vec<N>> {
        self.core.project_with(|i| self.out_bounds(i))
    }

    pub fn total_in_weights(&self) -> &[f64] {
        self.core.live(&self.total_in_weights)
    }

    pub fn total_out_weights(&self) -> &[f64] {
        self.core.live(&self.total_out_weights)
    }

    pub fn internal_weights(&self) -> &[f64] {
        self.core.live(&self.core.internal_weights)
    }

    /// Degree figures of node `i` for a move into `target`, from live state.
    /// O(degree(i)).
    pub fn degrees(&self, i: usize, target: usize) -> DirectedDegrees {
        let current = self.core.belonging(i);
        let split = self.core.split(i);
        let mut figures = DirectedDegrees::default();

        for j in self.core.bounds(i) {
            let weight = self.core.weight(j);
            let community = self.core.belonging(self.core.neighbor(j));

            if j < split {
                figures.out_degree += weight;

                if community == target {
                    figures.target_community_out_degree += weight;
                }

                if community == current {
                    figures.current_community_out_degree += weight;
                }
            } else {
                figures.in_degree += weight;

                if community == target {
                    figures.target_community_in_degree += weight;
                }

                if community == current {
                    figures.current_community_in_degree += weight;
                }
            }
        }

        figures
    }

    /// Move node `i` into `target` in O(1), given correct degree figures.
    ///
    /// Moving a node into the community it already belongs to is a no-op.
    pub fn move_node(&mut self, i: usize, figures: DirectedDegrees, target: usize) {
        let current = self.core.belonging(i);

        if current == target {
            return;
        }

        let loops = self.core.loops(i);

        self.total_in_weights[current] -= figures.in_degree + loops;
        self.total_in_weights[target] += figures.in_degree + loops;

        self.total_out_weights[current] -= figures.out_degree + loops;
        self.total_out_weights[target] += figures.out_degree + loops;

        self.core.internal_weights[current] -= figures.current_community_degree() + loops;
        self.core.internal_weights[target] += figures.target_community_degree() + loops;

        self.core.belongings.set(i, target);
    }

    /// Move node `i` into `target`, computing its degree figures first
    pub fn expensive_move(&mut self, i: usize, target: usize) {
        let figures = self.degrees(i, target);
        self.move_node(i, figures, target);
    }

    /// Modularity gain of inserting node `i`, considered isolated, into
    /// `target`. `target_community_degree` counts both arc directions. O(1).
    ///
    /// `target` must not be the community currently holding `i`.
    pub fn delta(
        &self,
        i: usize,
        in_degree: f64,
        out_degree: f64,
        target_community_degree: f64,
        target: usize,
    ) -> f64 {
        let m = self.core.total_weight;
        let loops = self.core.loops(i);

        let in_degree = in_degree + loops;
        let out_degree = out_degree + loops;

        target_community_degree / m
            - self.core.resolution
                * (out_degree * self.total_in_weights[target]
                    + in_degree * self.total_out_weights[target])
                / (m * m)
    }

    /// Same gain as [`delta`](Self::delta), for the community `i` is already
    /// part of.
    pub fn delta_with_own_community(
        &self,
        i: usize,
        in_degree: f64,
        out_degree: f64,
        target_community_degree: f64,
        target: usize,
    ) -> f64 {
        let m = self.core.total_weight;
        let loops = self.core.loops(i);

        let in_degree = in_degree + loops;
        let out_degree = out_degree + loops;

        target_community_degree / m
            - self.core.resolution
                * (out_degree * (self.total_in_weights[target] - in_degree)
                    + in_degree * (self.total_out_weights[target] - out_degree))
                / (m * m)
    }
}

impl<N: Copy + Eq + Hash> LouvainIndex for DirectedLouvainIndex<N> {
    type Node = N;

    fn core(&self) -> &CommunityCore<N> {
        &self.core
    }

    fn modularity(&self) -> f64 {
        let m = self.core.total_weight;

        if m == 0.0 {
            return 0.0;
        }

        (0..self.core.communities)
            .map(|c| {
                self.core.internal_weights[c] / m
                    - (self.total_in_weights[c] * self.total_out_weights[c]) / (m * m)
                        * self.core.resolution
            })
            .sum()
    }

    fn zoom_out(&mut self) {
        let origins = self.core.coarsen();
        carry_over(&mut self.total_in_weights, &origins);
        carry_over(&mut self.total_out_weights, &origins);

        log::info!(
            "Zoomed out to level {}: {} communities, {} arcs",
            self.core.level,
            self.core.communities,
            self.core.arcs
        );
    }
}

impl<N: fmt::Debug> fmt::Debug for DirectedLouvainIndex<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.core.communities;

        f.debug_struct("DirectedLouvainIndex")
            .field("core", &self.core)
            .field("total_in_weights", &&self.total_in_weights[..c])
            .field("total_out_weights", &&self.total_out_weights[..c])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DirectedGraph;

    const TOLERANCE: f64 = 1e-9;

    fn cycle_pair() -> DirectedGraph {
        let mut graph = DirectedGraph::new();
        for (source, target, weight) in [
            ("a", "b", 2.0),
            ("b", "c", 1.0),
            ("c", "a", 3.0),
            ("d", "e", 1.0),
            ("e", "d", 1.0),
            ("c", "d", 1.0),
            ("e", "e", 2.0),
        ] {
            graph.merge_weighted_edge(source, target, weight);
        }
        graph
    }

    fn weighted() -> IndexOptions {
        IndexOptions::default().weighted(true)
    }

    fn assert_conserved(index: &DirectedLouvainIndex) {
        let m = index.total_weight();
        let incoming: f64 = index.total_in_weights().iter().sum();
        let outgoing: f64 = index.total_out_weights().iter().sum();
        assert!((incoming - m).abs() < TOLERANCE);
        assert!((outgoing - m).abs() < TOLERANCE);
    }

    #[test]
    fn bounds_split_outbound_and_inbound() {
        let index = DirectedLouvainIndex::new(&cycle_pair(), &weighted()).unwrap();

        // c: out to a and d, in from b
        assert_eq!(index.out_bounds(2).len(), 2);
        assert_eq!(index.in_bounds(2).len(), 1);
        assert_eq!(index.bounds(2).len(), 3);

        let nodes = index.core().nodes().to_vec();
        let mut out_of_c = index.project_out()[&nodes[2]].clone();
        out_of_c.sort();
        assert_eq!(out_of_c, vec![nodes[0], nodes[3]]);
        assert_eq!(index.project_in()[&nodes[2]], vec![nodes[1]]);
    }

    #[test]
    fn self_loop_counts_once_in_each_direction() {
        let index = DirectedLouvainIndex::new(&cycle_pair(), &weighted()).unwrap();

        assert_eq!(index.total_weight(), 11.0);
        assert_eq!(index.core().loops(4), 2.0);
        assert_eq!(index.internal_weights()[4], 2.0);
        assert_eq!(index.total_in_weights()[4], 3.0);
        assert_eq!(index.total_out_weights()[4], 3.0);
        assert_conserved(&index);
    }

    #[test]
    fn null_move_is_exactly_idempotent() {
        let mut index = DirectedLouvainIndex::new(&cycle_pair(), &weighted()).unwrap();
        index.expensive_move(1, 0);

        let snapshot = format!("{:?}", index);
        let figures = index.degrees(1, 0);
        index.move_node(1, figures, 0);

        assert_eq!(snapshot, format!("{:?}", index));
    }

    #[test]
    fn delta_matches_modularity_difference() {
        let mut isolated = DirectedLouvainIndex::new(&cycle_pair(), &weighted()).unwrap();
        isolated.expensive_move(1, 0);
        isolated.expensive_move(4, 3);

        for (node, target) in [(2, 0), (2, 3), (0, 3)] {
            let mut joined = isolated.clone();
            let figures = isolated.degrees(node, target);
            let delta = isolated.delta(
                node,
                figures.in_degree,
                figures.out_degree,
                figures.target_community_degree(),
                target,
            );

            // moving out of a shared community first isolates the node
            let own = isolated.degrees(node, isolated.belonging(node));
            let leaving = if isolated.belonging(node) == node {
                0.0
            } else {
                isolated.delta_with_own_community(
                    node,
                    own.in_degree,
                    own.out_degree,
                    own.target_community_degree(),
                    isolated.belonging(node),
                )
            };

            joined.expensive_move(node, target);
            let observed = joined.modularity() - isolated.modularity();
            assert!(
                (delta - leaving - observed).abs() < TOLERANCE,
                "move {node} -> {target}: {delta} - {leaving} vs {observed}"
            );
            assert_conserved(&joined);
        }
    }

    #[test]
    fn zoom_out_keeps_in_and_out_adjacency_apart() {
        let mut index = DirectedLouvainIndex::new(&cycle_pair(), &weighted()).unwrap();
        index.expensive_move(1, 0);
        index.expensive_move(2, 0);
        index.expensive_move(4, 3);

        let before = index.modularity();
        index.zoom_out();

        assert!((index.modularity() - before).abs() < TOLERANCE);
        assert_eq!(index.community_count(), 2);
        assert_eq!(index.internal_weights(), &[6.0, 4.0]);
        assert_eq!(index.total_out_weights(), &[7.0, 4.0]);
        assert_eq!(index.total_in_weights(), &[6.0, 5.0]);

        assert_eq!(index.out_bounds(0).len(), 1);
        assert_eq!(index.in_bounds(0).len(), 0);
        assert_eq!(index.out_bounds(1).len(), 0);
        assert_eq!(index.in_bounds(1).len(), 1);
        assert_eq!(index.core().loops(1), 4.0);
        assert_conserved(&index);
    }
}
