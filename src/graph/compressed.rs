//! Memory-efficient outbound neighborhood index

use crate::error::{IndexError, IndexResult};
use crate::graph::HostGraph;
use crate::louvain::pointer::PointerArray;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;

/// Compressed sparse representation of every node's outbound neighbors.
///
/// For undirected hosts every neighbor is outbound. Unlike the Louvain
/// indices this carries no weights and no community state.
#[derive(Debug, Clone)]
pub struct OutboundNeighborhoodIndex<N> {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's neighbors begin
    /// offsets[i] to offsets[i+1] defines the range for node i
    pub offsets: PointerArray,

    /// Neighbor array: concatenated lists of target node indices
    pub edges: PointerArray,

    /// Host node behind each index
    pub nodes: Vec<N>,
}

impl<N: Copy + Eq + Hash> OutboundNeighborhoodIndex<N> {
    /// Index the outbound neighborhood of `graph`, in node enumeration order
    pub fn from_graph<G>(graph: &G) -> IndexResult<Self>
    where
        G: HostGraph<NodeId = N>,
    {
        let nodes: Vec<N> = graph.nodes().collect();
        let ids: HashMap<N, usize> = nodes.iter().enumerate().map(|(i, &node)| (node, i)).collect();
        let directed = graph.is_directed();

        let outbound = |node: N, edge: G::EdgeId| -> IndexResult<Option<usize>> {
            if directed {
                let is_source = graph
                    .extremities(edge)
                    .map(|(source, _)| source == node)
                    .unwrap_or(false);

                if !is_source {
                    return Ok(None);
                }
            }

            graph
                .opposite(node, edge)
                .and_then(|n| ids.get(&n).copied())
                .map(Some)
                .ok_or_else(|| {
                    IndexError::InvalidInput(format!("edge {:?} has an unknown endpoint", edge))
                })
        };

        // First pass: out-degrees, so both arrays get their final width
        let mut degrees = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            let mut degree = 0;
            for edge in graph.incident_edges(node) {
                if outbound(node, edge)?.is_some() {
                    degree += 1;
                }
            }
            degrees.push(degree);
        }

        let total: usize = degrees.iter().sum();
        let mut offsets = PointerArray::for_max_value(total, nodes.len() + 1);
        let mut edges = PointerArray::for_max_value(nodes.len().saturating_sub(1), total);

        let mut n = 0;
        for (i, &node) in nodes.iter().enumerate() {
            offsets.set(i, n);

            for edge in graph.incident_edges(node) {
                if let Some(neighbor) = outbound(node, edge)? {
                    if n == offsets.get(i) + degrees[i] {
                        return Err(IndexError::InvalidInput(format!(
                            "incident edges of node {} changed while indexing",
                            i
                        )));
                    }
                    edges.set(n, neighbor);
                    n += 1;
                }
            }
        }
        offsets.set(nodes.len(), n);

        let index = Self {
            node_count: nodes.len(),
            offsets,
            edges,
            nodes,
        };

        log::debug!(
            "Indexed {} outbound neighbors for {} nodes ({} bytes)",
            n,
            index.node_count,
            index.memory_usage()
        );

        Ok(index)
    }

    /// Packed range of node `node`'s neighbors
    pub fn bounds(&self, node: usize) -> (usize, usize) {
        (self.offsets.get(node), self.offsets.get(node + 1))
    }

    /// Get outbound neighbors of a node
    pub fn outgoing_edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let (start, end) = self.bounds(node);
        (start..end).map(move |j| self.edges.get(j))
    }

    /// Get out-degree of a node
    pub fn out_degree(&self, node: usize) -> usize {
        let (start, end) = self.bounds(node);
        end - start
    }

    /// Sort all adjacency lists (enables `has_edge`)
    pub fn sort_adjacency_lists(&mut self) {
        for node in 0..self.node_count {
            let (start, end) = self.bounds(node);
            if start < end {
                self.edges.sort_range(start..end);
            }
        }
    }

    /// Check if there's an edge from src to dst. Lists must be sorted.
    pub fn has_edge(&self, src: usize, dst: usize) -> bool {
        let (mut low, mut high) = self.bounds(src);

        while low < high {
            let mid = low + (high - low) / 2;
            match self.edges.get(mid).cmp(&dst) {
                Ordering::Equal => return true,
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }

        false
    }

    /// Neighborhood of every node, by host node
    pub fn project(&self) -> HashMap<N, Vec<N>> {
        (0..self.node_count)
            .map(|i| {
                let neighbors = self.outgoing_edges(i).map(|j| self.nodes[j]).collect();
                (self.nodes[i], neighbors)
            })
            .collect()
    }

    /// Key per-index `results` by host node
    pub fn collect<T: Clone>(&self, results: &[T]) -> HashMap<N, T> {
        self.nodes
            .iter()
            .zip(results.iter())
            .map(|(&node, value)| (node, value.clone()))
            .collect()
    }

    /// Write per-index `results` onto `graph` under `property`
    pub fn assign<G, T>(&self, graph: &mut G, property: &str, results: &[T])
    where
        G: HostGraph<NodeId = N>,
        T: Clone + Into<Value>,
    {
        for (&node, value) in self.nodes.iter().zip(results.iter()) {
            graph.set_node_attribute(node, property, value.clone().into());
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>()
            + self.offsets.memory_usage()
            + self.edges.memory_usage()
            + self.nodes.len() * mem::size_of::<N>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::attributed::Attributes;
    use crate::graph::{DirectedGraph, UndirectedGraph};
    use petgraph::stable_graph::NodeIndex;

    fn follows() -> DirectedGraph {
        let mut graph = DirectedGraph::new();
        for (source, target) in [("1", "2"), ("2", "3"), ("2", "1"), ("4", "5")] {
            graph.merge_edge(source, target, Attributes::new());
        }
        graph
    }

    #[test]
    fn indexes_outbound_neighborhood() {
        let graph = follows();
        let mut index = OutboundNeighborhoodIndex::from_graph(&graph).unwrap();
        index.sort_adjacency_lists();

        assert_eq!(index.edges.prefix(4), vec![1, 0, 2, 4]);
        assert_eq!(index.offsets.prefix(6), vec![0, 1, 3, 3, 4, 4]);
        assert!(index.has_edge(1, 0));
        assert!(index.has_edge(1, 2));
        assert!(!index.has_edge(0, 2));
        assert!(!index.has_edge(2, 0));

        for (node, neighbors) in index.project() {
            let label = graph.label(node).unwrap();
            let mut expected = graph.outbound_neighbors(label);
            let mut found: Vec<&str> = neighbors.iter().filter_map(|&n| graph.label(n)).collect();
            expected.sort_unstable();
            found.sort_unstable();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn collects_and_assigns_results() {
        let mut graph = follows();
        let index = OutboundNeighborhoodIndex::from_graph(&graph).unwrap();
        let results = [0.1, 0.2, 0.3, 0.4, 0.5];

        let collected = index.collect(&results);
        assert_eq!(collected[&graph.node_index("3").unwrap()], 0.3);

        index.assign(&mut graph, "result", &results);
        assert_eq!(graph.node_attribute("5", "result"), Some(&Value::from(0.5)));
    }

    #[test]
    fn undirected_neighbors_are_all_outbound() {
        let mut graph = UndirectedGraph::new();
        graph.merge_edge("a", "b", Attributes::new());
        graph.merge_edge("b", "c", Attributes::new());

        let index = OutboundNeighborhoodIndex::from_graph(&graph).unwrap();
        assert_eq!(index.out_degree(1), 2);
        assert_eq!(index.edges.len(), 4);
    }

    #[test]
    fn arrays_widen_past_u8() {
        let mut graph = DirectedGraph::new();
        for leaf in 0..300 {
            graph.merge_edge("hub", &leaf.to_string(), Attributes::new());
        }

        let index = OutboundNeighborhoodIndex::from_graph(&graph).unwrap();

        assert_eq!(index.edges.width(), 2);
        assert_eq!(index.offsets.width(), 2);
        assert_eq!(index.out_degree(0), 300);
        assert_eq!(index.offsets.get(index.node_count), 300);

        let neighbors: Vec<usize> = index.outgoing_edges(0).collect();
        assert_eq!(neighbors.len(), 300);
        assert!(neighbors.contains(&300));
    }

    #[test]
    fn memory_usage_counts_packed_arrays() {
        let index = OutboundNeighborhoodIndex::from_graph(&follows()).unwrap();

        // u8 pointers: 6 offsets, 4 edges
        let expected = mem::size_of::<OutboundNeighborhoodIndex<NodeIndex>>()
            + 6
            + 4
            + 5 * mem::size_of::<NodeIndex>();
        assert_eq!(index.memory_usage(), expected);
    }
}
