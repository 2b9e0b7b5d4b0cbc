//! Louvain community indices
//!
//! Both indices store the graph in a packed, offset-addressed adjacency and
//! track, for every community, the aggregates modularity needs. They support:
//!
//! - O(1) node moves given precomputed degree figures (`move_node`), or
//!   O(degree) moves computing them from live state (`expensive_move`)
//! - O(C) modularity and O(1) modularity deltas
//! - O(C + E) coarsening (`zoom_out`) into the graph induced by the current
//!   communities, recording the node→community hierarchy
//!
//! The number of communities only ever decreases within a level: an emptied
//! community id is retired until the next `zoom_out` renumbers everything.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.
//!
//! Dugué & Perez (2015). "Directed Louvain: maximizing modularity in directed
//! networks." hal-01231784.

pub mod csr;
pub mod directed;
pub mod history;
pub mod pointer;
pub mod undirected;

use crate::error::IndexResult;
use crate::graph::HostGraph;
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

pub use csr::CommunityCore;
pub use directed::{DirectedDegrees, DirectedLouvainIndex};
pub use history::History;
pub use pointer::PointerArray;
pub use undirected::{UndirectedDegrees, UndirectedLouvainIndex};

/// Operations shared by the undirected and directed indices
pub trait LouvainIndex {
    type Node: Copy + Eq + Hash;

    fn core(&self) -> &CommunityCore<Self::Node>;

    /// Modularity of the current partition, O(C). Zero for an edgeless graph.
    fn modularity(&self) -> f64;

    /// Collapse the current communities into the nodes of the next level
    fn zoom_out(&mut self);

    /// `C`: live nodes, which are also the usable community ids
    fn community_count(&self) -> usize {
        self.core().communities
    }

    /// `E`: live arcs
    fn arc_count(&self) -> usize {
        self.core().arcs
    }

    /// `M`
    fn total_weight(&self) -> f64 {
        self.core().total_weight
    }

    fn resolution(&self) -> f64 {
        self.core().resolution
    }

    fn level(&self) -> usize {
        self.core().level
    }

    /// Packed range of every arc of node `i`
    fn bounds(&self, i: usize) -> Range<usize> {
        self.core().bounds(i)
    }

    /// Community of node `i` at the current level
    fn belonging(&self, i: usize) -> usize {
        self.core().belonging(i)
    }

    /// Neighborhood of every live node, by label. Diagnostic, O(E).
    fn project(&self) -> HashMap<Self::Node, Vec<Self::Node>> {
        let core = self.core();
        core.project_with(|i| core.bounds(i))
    }

    /// Community of every original node at the current level
    fn collect(&self) -> HashMap<Self::Node, usize> {
        self.collect_level(self.level()).unwrap_or_default()
    }

    /// Community of every original node at `level`
    fn collect_level(&self, level: usize) -> IndexResult<HashMap<Self::Node, usize>> {
        self.core().collect_level(level)
    }

    /// Write the current communities onto `graph` under `property`
    fn assign<G>(&self, graph: &mut G, property: &str) -> IndexResult<()>
    where
        G: HostGraph<NodeId = Self::Node>,
    {
        self.assign_level(graph, property, self.level())
    }

    fn assign_level<G>(&self, graph: &mut G, property: &str, level: usize) -> IndexResult<()>
    where
        G: HostGraph<NodeId = Self::Node>,
    {
        self.core().assign_level(graph, property, level)
    }
}
