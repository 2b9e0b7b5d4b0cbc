//! One-pass construction of the packed adjacency consumed by the Louvain indices

use crate::config::IndexOptions;
use crate::error::{IndexError, IndexResult};
use crate::graph::{direction_name, HostGraph};
use crate::louvain::pointer::PointerArray;
use serde_json::Value;
use std::collections::HashMap;

/// Per-community null-model totals, split by direction when needed
#[derive(Debug, Clone, PartialEq)]
pub enum Totals {
    Undirected(Vec<f64>),
    Directed {
        incoming: Vec<f64>,
        outgoing: Vec<f64>,
    },
}

/// Packed neighborhood plus the initial singleton-community aggregates.
///
/// Arcs of node `i` live in `starts[i]..starts[i + 1]`. For directed graphs
/// `offsets[i]` splits them into outbound (`starts[i]..offsets[i]`) and
/// inbound (`offsets[i]..starts[i + 1]`) arcs. Self-loops never occupy arcs.
#[derive(Debug, Clone)]
pub struct Adjacency<N> {
    pub nodes: Vec<N>,
    pub starts: PointerArray,
    pub offsets: Option<PointerArray>,
    pub neighborhood: PointerArray,
    pub weights: Vec<f64>,
    pub loops: Vec<f64>,
    pub internal_weights: Vec<f64>,
    pub totals: Totals,
    /// Total graph weight, each edge counted once
    pub total_weight: f64,
    pub arc_count: usize,
}

/// Weight of `edge` under `options`, falling back to 1 for missing or
/// non-numeric values
pub fn edge_weight<G: HostGraph>(graph: &G, edge: G::EdgeId, options: &IndexOptions) -> f64 {
    if !options.weighted {
        return 1.0;
    }

    match graph.edge_attribute(edge, &options.weight_attribute) {
        Some(Value::Number(number)) => number.as_f64().filter(|w| !w.is_nan()).unwrap_or(1.0),
        _ => 1.0,
    }
}

/// Build the packed adjacency of `graph` in O(V + E).
///
/// Cursors start at each node's slot end and move backward as arcs are
/// written, so once every edge has been visited `starts[i]` (and `offsets[i]`)
/// hold the first occupied slot of their range.
pub fn build_adjacency<G: HostGraph>(
    graph: &G,
    options: &IndexOptions,
    directed: bool,
) -> IndexResult<Adjacency<G::NodeId>> {
    if graph.is_directed() != directed {
        return Err(IndexError::DirectionMismatch {
            expected: direction_name(directed),
            found: direction_name(graph.is_directed()),
        });
    }

    let order = graph.order();

    let nodes: Vec<G::NodeId> = graph.nodes().collect();
    if nodes.len() != order {
        return Err(IndexError::InvalidInput(format!(
            "graph reports {} nodes but enumerates {}",
            order,
            nodes.len()
        )));
    }

    let ids: HashMap<G::NodeId, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    // First pass: arc counts per node, self-loops excluded
    let mut out_degrees = vec![0usize; order];
    let mut in_degrees = vec![0usize; order];

    for (i, &node) in nodes.iter().enumerate() {
        for edge in graph.incident_edges(node) {
            let neighbor = graph
                .opposite(node, edge)
                .ok_or_else(|| {
                    IndexError::InvalidInput(format!(
                        "edge {:?} is not incident to {:?}",
                        edge, node
                    ))
                })?;

            if neighbor == node {
                continue;
            }

            if !ids.contains_key(&neighbor) {
                return Err(IndexError::InvalidInput(format!("unknown node {:?}", neighbor)));
            }

            let outbound = !directed
                || graph
                    .extremities(edge)
                    .map(|(source, _)| source == node)
                    .unwrap_or(false);

            if outbound {
                out_degrees[i] += 1;
            } else {
                in_degrees[i] += 1;
            }
        }
    }

    // Cursor widths come from the enumerated arcs, never from `size()`
    let arc_count = out_degrees.iter().chain(in_degrees.iter()).sum::<usize>();

    let mut starts = PointerArray::for_max_value(arc_count, order + 1);
    let mut offsets = directed.then(|| PointerArray::for_max_value(arc_count, order));

    let mut n = 0;
    for i in 0..order {
        n += out_degrees[i];
        starts.set(i, n);

        if let Some(offsets) = offsets.as_mut() {
            n += in_degrees[i];
            offsets.set(i, n);
        }
    }

    starts.set(order, arc_count);

    log::debug!(
        "Allocating {} arcs for {} nodes (host reports {} edges)",
        arc_count,
        order,
        graph.size()
    );

    let mut neighborhood = PointerArray::for_max_value(order.saturating_sub(1), arc_count);
    let mut weights = vec![0.0; arc_count];
    let mut loops = vec![0.0; order];
    let mut internal_weights = vec![0.0; order];
    let mut incoming = vec![0.0; order];
    let mut outgoing = if directed { vec![0.0; order] } else { Vec::new() };
    let mut total_weight = 0.0;

    // Second pass: single sweep over the edges
    for edge in graph.edges() {
        let (source, target) = graph
            .extremities(edge)
            .ok_or_else(|| IndexError::InvalidInput(format!("dangling edge {:?}", edge)))?;

        let (Some(&s), Some(&t)) = (ids.get(&source), ids.get(&target)) else {
            return Err(IndexError::InvalidInput(format!(
                "edge {:?} has an unknown endpoint",
                edge
            )));
        };

        let weight = edge_weight(graph, edge, options);
        total_weight += weight;

        if s == t {
            let contribution = if directed { weight } else { weight * 2.0 };

            loops[s] += contribution;
            internal_weights[s] += contribution;
            incoming[s] += contribution;
            if directed {
                outgoing[s] += contribution;
            }
            continue;
        }

        if out_degrees[s] == 0 {
            return Err(IndexError::InvalidInput(format!(
                "edge {:?} was not enumerated by its source",
                edge
            )));
        }
        out_degrees[s] -= 1;
        let source_slot = starts.decrement(s);

        let target_slot = match offsets.as_mut() {
            Some(offsets) => {
                if in_degrees[t] == 0 {
                    return Err(IndexError::InvalidInput(format!(
                        "edge {:?} was not enumerated by its target",
                        edge
                    )));
                }
                in_degrees[t] -= 1;
                outgoing[s] += weight;
                incoming[t] += weight;
                offsets.decrement(t)
            }
            None => {
                if out_degrees[t] == 0 {
                    return Err(IndexError::InvalidInput(format!(
                        "edge {:?} was not enumerated by its target",
                        edge
                    )));
                }
                out_degrees[t] -= 1;
                incoming[s] += weight;
                incoming[t] += weight;
                starts.decrement(t)
            }
        };

        neighborhood.set(source_slot, t);
        weights[source_slot] = weight;

        neighborhood.set(target_slot, s);
        weights[target_slot] = weight;
    }

    if out_degrees.iter().chain(in_degrees.iter()).any(|&left| left != 0) {
        return Err(IndexError::InvalidInput(
            "edge enumeration disagrees with per-node enumeration".to_string(),
        ));
    }

    let totals = if directed {
        Totals::Directed { incoming, outgoing }
    } else {
        Totals::Undirected(incoming)
    };

    Ok(Adjacency {
        nodes,
        starts,
        offsets,
        neighborhood,
        weights,
        loops,
        internal_weights,
        totals,
        total_weight,
        arc_count,
    })
}
