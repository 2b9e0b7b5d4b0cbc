//! Host graph contract and graph-side indices

pub mod attributed;
pub mod builder;
pub mod compressed;

use serde_json::Value;
use std::fmt::Debug;
use std::hash::Hash;

pub use attributed::{AttributedGraph, DirectedGraph, UndirectedGraph};
pub use builder::{build_adjacency, Adjacency};
pub use compressed::OutboundNeighborhoodIndex;

/// Read-only traversal contract an index needs from the graph it indexes.
///
/// Node enumeration order is significant: it defines the dense index of every
/// node. `set_node_attribute` is the only mutating call and is used solely to
/// write results back.
pub trait HostGraph {
    type NodeId: Copy + Eq + Hash + Debug;
    type EdgeId: Copy + Eq + Debug;

    fn is_directed(&self) -> bool;

    /// Number of nodes
    fn order(&self) -> usize;

    /// Number of edges, self-loops included
    fn size(&self) -> usize;

    fn nodes(&self) -> impl Iterator<Item = Self::NodeId> + '_;

    fn edges(&self) -> impl Iterator<Item = Self::EdgeId> + '_;

    /// Edges touching `node`, each listed once (self-loops included)
    fn incident_edges(&self, node: Self::NodeId) -> impl Iterator<Item = Self::EdgeId> + '_;

    /// `(source, target)` of an edge, `None` if the edge is unknown
    fn extremities(&self, edge: Self::EdgeId) -> Option<(Self::NodeId, Self::NodeId)>;

    /// The endpoint of `edge` that is not `node` (`node` itself for a self-loop)
    fn opposite(&self, node: Self::NodeId, edge: Self::EdgeId) -> Option<Self::NodeId> {
        let (source, target) = self.extremities(edge)?;
        if source == node {
            Some(target)
        } else if target == node {
            Some(source)
        } else {
            None
        }
    }

    fn edge_attribute(&self, edge: Self::EdgeId, name: &str) -> Option<&Value>;

    fn set_node_attribute(&mut self, node: Self::NodeId, name: &str, value: Value);
}

/// Human readable direction of a host, used in error messages
pub(crate) fn direction_name(directed: bool) -> &'static str {
    if directed {
        "directed"
    } else {
        "undirected"
    }
}
