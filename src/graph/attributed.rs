//! Labeled, attribute-carrying graph used as the default index host

use crate::graph::HostGraph;
use itertools::Itertools;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction, EdgeType, Undirected};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Attribute bag attached to nodes and edges
pub type Attributes = Map<String, Value>;

/// Node payload: the external label plus its attributes
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub label: String,
    pub attributes: Attributes,
}

/// Edge payload
#[derive(Debug, Clone, Default)]
pub struct EdgeData {
    pub attributes: Attributes,
}

/// Graph with string node labels and JSON attributes on nodes and edges.
///
/// Nodes are enumerated in insertion order. `merge_edge` never creates a
/// parallel edge: merging onto an existing edge overwrites the attributes it
/// names, and for undirected graphs `(a, b)` and `(b, a)` are the same edge.
#[derive(Debug, Clone)]
pub struct AttributedGraph<Ty: EdgeType> {
    inner: StableGraph<NodeData, EdgeData, Ty>,
    id_to_index: HashMap<String, NodeIndex>,
}

pub type DirectedGraph = AttributedGraph<Directed>;
pub type UndirectedGraph = AttributedGraph<Undirected>;

impl<Ty: EdgeType> Default for AttributedGraph<Ty> {
    fn default() -> Self {
        Self::with_capacity(0, 0)
    }
}

impl<Ty: EdgeType> AttributedGraph<Ty> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new graph with pre-allocated capacity
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            inner: StableGraph::with_capacity(nodes, edges),
            id_to_index: HashMap::with_capacity(nodes),
        }
    }

    /// Get or create the node carrying `label`
    pub fn merge_node(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(label) {
            return idx;
        }

        let idx = self.inner.add_node(NodeData {
            label: label.to_string(),
            attributes: Attributes::new(),
        });
        self.id_to_index.insert(label.to_string(), idx);

        idx
    }

    /// Add or update the edge between two labels
    pub fn merge_edge(&mut self, source: &str, target: &str, attributes: Attributes) -> EdgeIndex {
        let src = self.merge_node(source);
        let dst = self.merge_node(target);

        match self.inner.find_edge(src, dst) {
            Some(edge) => {
                if let Some(data) = self.inner.edge_weight_mut(edge) {
                    data.attributes.extend(attributes);
                }
                edge
            }
            None => self.inner.add_edge(src, dst, EdgeData { attributes }),
        }
    }

    /// Merge an edge carrying a single numeric `weight` attribute
    pub fn merge_weighted_edge(&mut self, source: &str, target: &str, weight: f64) -> EdgeIndex {
        let mut attributes = Attributes::new();
        attributes.insert("weight".to_string(), Value::from(weight));
        self.merge_edge(source, target, attributes)
    }

    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.id_to_index.get(label).copied()
    }

    pub fn label(&self, node: NodeIndex) -> Option<&str> {
        self.inner.node_weight(node).map(|data| data.label.as_str())
    }

    pub fn node_attribute(&self, label: &str, name: &str) -> Option<&Value> {
        let idx = self.node_index(label)?;
        self.inner.node_weight(idx)?.attributes.get(name)
    }

    /// Labels of the nodes `label` points to (every neighbor when undirected)
    pub fn outbound_neighbors(&self, label: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(label) else {
            return Vec::new();
        };

        self.inner
            .neighbors(idx)
            .unique()
            .filter_map(|n| self.label(n))
            .collect()
    }

    pub fn inner(&self) -> &StableGraph<NodeData, EdgeData, Ty> {
        &self.inner
    }
}

impl<Ty: EdgeType> HostGraph for AttributedGraph<Ty> {
    type NodeId = NodeIndex;
    type EdgeId = EdgeIndex;

    fn is_directed(&self) -> bool {
        self.inner.is_directed()
    }

    fn order(&self) -> usize {
        self.inner.node_count()
    }

    fn size(&self) -> usize {
        self.inner.edge_count()
    }

    fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.inner.edge_indices()
    }

    fn incident_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.inner
            .edges_directed(node, Direction::Outgoing)
            .chain(self.inner.edges_directed(node, Direction::Incoming))
            .map(|edge| edge.id())
            .unique()
    }

    fn extremities(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.inner.edge_endpoints(edge)
    }

    fn edge_attribute(&self, edge: EdgeIndex, name: &str) -> Option<&Value> {
        self.inner.edge_weight(edge)?.attributes.get(name)
    }

    fn set_node_attribute(&mut self, node: NodeIndex, name: &str, value: Value) {
        if let Some(data) = self.inner.node_weight_mut(node) {
            data.attributes.insert(name.to_string(), value);
        }
    }
}
