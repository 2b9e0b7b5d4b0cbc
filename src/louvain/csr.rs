//! Packed adjacency and community state shared by both index directions

use crate::config::HistoryMode;
use crate::error::{IndexError, IndexResult};
use crate::graph::builder::{Adjacency, Totals};
use crate::graph::HostGraph;
use crate::louvain::history::History;
use crate::louvain::pointer::PointerArray;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::ops::Range;

/// Inter-community weights gathered while coarsening, keyed by neighbor id
type InducedAdjacency = Vec<BTreeMap<usize, f64>>;

/// CSR neighborhood, node→community assignment and the aggregates that do not
/// depend on edge direction.
///
/// All arrays are allocated once at construction. Coarsening only shrinks the
/// live prefixes: `C` node slots, `C + 1` bounds and `E` arcs.
#[derive(Clone)]
pub struct CommunityCore<N> {
    pub(crate) nodes: Vec<N>,
    /// `C`: live node (and community) slots at this level
    pub(crate) communities: usize,
    /// `E`: live arcs
    pub(crate) arcs: usize,
    /// `M`: total graph weight, each edge counted once
    pub(crate) total_weight: f64,
    pub(crate) resolution: f64,
    pub(crate) level: usize,

    pub(crate) starts: PointerArray,
    pub(crate) offsets: Option<PointerArray>,
    pub(crate) neighborhood: PointerArray,
    pub(crate) weights: Vec<f64>,

    pub(crate) loops: Vec<f64>,
    pub(crate) belongings: PointerArray,
    pub(crate) internal_weights: Vec<f64>,

    pub(crate) history: History,
}

impl<N: Copy + Eq + Hash> CommunityCore<N> {
    /// Level-0 state, every node its own community. The direction-specific
    /// totals are handed back to the caller.
    pub(crate) fn from_adjacency(
        adjacency: Adjacency<N>,
        resolution: f64,
        mode: HistoryMode,
    ) -> (Self, Totals) {
        let Adjacency {
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
        } = adjacency;

        let order = nodes.len();

        let core = Self {
            nodes,
            communities: order,
            arcs: arc_count,
            total_weight,
            resolution,
            level: 0,
            starts,
            offsets,
            neighborhood,
            weights,
            loops,
            belongings: PointerArray::identity(order),
            internal_weights,
            history: History::new(mode, order),
        };

        (core, totals)
    }

    /// Packed range of node `i`'s arcs
    #[inline]
    pub fn bounds(&self, i: usize) -> Range<usize> {
        self.starts.get(i)..self.starts.get(i + 1)
    }

    /// First inbound arc of node `i`; the end of its range when undirected
    #[inline]
    pub(crate) fn split(&self, i: usize) -> usize {
        match &self.offsets {
            Some(offsets) => offsets.get(i),
            None => self.starts.get(i + 1),
        }
    }

    /// Node (or community) at the far end of arc `j`
    #[inline]
    pub fn neighbor(&self, j: usize) -> usize {
        self.neighborhood.get(j)
    }

    #[inline]
    pub fn weight(&self, j: usize) -> f64 {
        self.weights[j]
    }

    #[inline]
    pub fn belonging(&self, i: usize) -> usize {
        self.belongings.get(i)
    }

    #[inline]
    pub fn loops(&self, i: usize) -> f64 {
        self.loops[i]
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Map the neighbors of arcs in `range(i)` for every live node to labels
    pub(crate) fn project_with<F>(&self, range: F) -> HashMap<N, Vec<N>>
    where
        F: Fn(usize) -> Range<usize>,
    {
        (0..self.communities)
            .map(|i| {
                let neighbors = range(i).map(|j| self.nodes[self.neighbor(j)]).collect();
                (self.nodes[i], neighbors)
            })
            .collect()
    }

    fn mapping(&self, level: usize) -> IndexResult<&PointerArray> {
        self.history
            .mapping(level, self.level)
            .ok_or(IndexError::LevelUnavailable {
                requested: level,
                current: self.level,
            })
    }

    /// Community of every original node at `level`
    pub(crate) fn collect_level(&self, level: usize) -> IndexResult<HashMap<N, usize>> {
        let mapping = self.mapping(level)?;

        Ok(self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, mapping.get(i)))
            .collect())
    }

    /// Write the community of every original node at `level` onto `graph`
    pub(crate) fn assign_level<G>(
        &self,
        graph: &mut G,
        property: &str,
        level: usize,
    ) -> IndexResult<()>
    where
        G: HostGraph<NodeId = N>,
    {
        let mapping = self.mapping(level)?;

        for (i, &node) in self.nodes.iter().enumerate() {
            graph.set_node_attribute(node, property, Value::from(mapping.get(i)));
        }

        Ok(())
    }

    /// Collapse communities into the nodes of a new, smaller graph.
    ///
    /// Returns `origins`, where `origins[k]` is the old community id that
    /// became induced node `k`, so callers can carry their direction-specific
    /// totals over. Runs in O(C + E) for the level being coarsened.
    pub(crate) fn coarsen(&mut self) -> Vec<usize> {
        let previous = self.communities;
        let directed = self.offsets.is_some();

        // Renumber communities densely, in first-seen order
        let mut labels = vec![usize::MAX; previous];
        let mut origins = Vec::new();

        for i in 0..previous {
            let community = self.belongings.get(i);

            if labels[community] == usize::MAX {
                labels[community] = origins.len();
                origins.push(community);
            }

            self.belongings.set(i, labels[community]);
        }

        let induced = origins.len();
        self.history.record(&self.belongings, induced);

        // Aggregate arcs crossing community boundaries
        let mut outbound: InducedAdjacency = vec![BTreeMap::new(); induced];
        let mut inbound: InducedAdjacency = if directed {
            vec![BTreeMap::new(); induced]
        } else {
            Vec::new()
        };

        for i in 0..previous {
            let ci = self.belongings.get(i);
            let split = self.split(i);

            for j in self.bounds(i) {
                let cj = self.belongings.get(self.neighborhood.get(j));

                if ci == cj {
                    continue;
                }

                let adjacency = if j < split { &mut outbound[ci] } else { &mut inbound[ci] };
                *adjacency.entry(cj).or_insert(0.0) += self.weights[j];
            }
        }

        let internal: Vec<f64> = origins.iter().map(|&c| self.internal_weights[c]).collect();

        // Rewrite the packed arrays in place
        let mut n = 0;
        for ci in 0..induced {
            self.internal_weights[ci] = internal[ci];
            self.loops[ci] = internal[ci];
            self.belongings.set(ci, ci);
            self.starts.set(ci, n);

            for (&cj, &weight) in &outbound[ci] {
                self.neighborhood.set(n, cj);
                self.weights[n] = weight;
                n += 1;
            }

            if let Some(offsets) = self.offsets.as_mut() {
                offsets.set(ci, n);

                for (&cj, &weight) in &inbound[ci] {
                    self.neighborhood.set(n, cj);
                    self.weights[n] = weight;
                    n += 1;
                }
            }
        }

        self.starts.set(induced, n);

        log::debug!(
            "Coarsened level {}: {} -> {} communities, {} -> {} arcs",
            self.level,
            previous,
            induced,
            self.arcs,
            n
        );

        self.communities = induced;
        self.arcs = n;
        self.level += 1;

        origins
    }

    /// Estimate memory usage in bytes, retained history included
    pub fn memory_usage(&self) -> usize {
        let pointers = self.starts.memory_usage()
            + self.offsets.as_ref().map_or(0, PointerArray::memory_usage)
            + self.neighborhood.memory_usage()
            + self.belongings.memory_usage();
        let floats = (self.weights.len() + self.loops.len() + self.internal_weights.len())
            * mem::size_of::<f64>();
        let history: usize = self.history.levels().iter().map(|level| level.memory_usage()).sum();

        let nodes = self.nodes.len() * mem::size_of::<N>();

        mem::size_of::<Self>() + nodes + pointers + floats + history
    }

    /// Live prefix of a community-indexed array
    pub(crate) fn live<'a>(&self, values: &'a [f64]) -> &'a [f64] {
        &values[..self.communities]
    }
}

impl<N: fmt::Debug> fmt::Debug for CommunityCore<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.communities;
        let e = self.arcs;

        let mut debug = f.debug_struct("CommunityCore");
        debug
            .field("C", &c)
            .field("M", &self.total_weight)
            .field("E", &e)
            .field("resolution", &self.resolution)
            .field("level", &self.level)
            .field("nodes", &self.nodes)
            .field("starts", &self.starts.prefix(c + 1));

        if let Some(offsets) = &self.offsets {
            debug.field("offsets", &offsets.prefix(c));
        }

        debug
            .field("neighborhood", &self.neighborhood.prefix(e))
            .field("weights", &&self.weights[..e])
            .field("loops", &&self.loops[..c])
            .field("belongings", &self.belongings.prefix(c))
            .field("internal_weights", &&self.internal_weights[..c])
            .field("history", &self.history)
            .finish()
    }
}

/// Gather `values[origins[k]]` into `values[k]` for every induced node
pub(crate) fn carry_over(values: &mut [f64], origins: &[usize]) {
    let carried: Vec<f64> = origins.iter().map(|&c| values[c]).collect();
    values[..carried.len()].copy_from_slice(&carried);
}
