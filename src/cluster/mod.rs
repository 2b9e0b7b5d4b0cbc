//! Community detection driver and partition summaries

pub mod detection;
pub mod metrics;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A community of the final partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// Community id, as collected from the index
    pub id: usize,

    /// Labels of the member nodes, sorted
    pub members: Vec<String>,

    /// Size of the community
    pub size: usize,

    /// Weight of the edges with both endpoints inside the community
    pub internal_weight: f64,

    /// Weight of the edges with at least one endpoint inside the community
    pub incident_weight: f64,
}

/// Group a node→community mapping into communities, largest first.
///
/// `weights` maps a community id to its `(internal, incident)` weights, as
/// produced by [`metrics::community_weights`].
pub fn communities_from_mapping<N, F>(
    mapping: &HashMap<N, usize>,
    weights: &HashMap<usize, (f64, f64)>,
    label: F,
) -> Vec<Community>
where
    N: Copy + Eq + Hash,
    F: Fn(N) -> String,
{
    let mut communities: Vec<Community> = mapping
        .iter()
        .map(|(&node, &community)| (community, label(node)))
        .into_group_map()
        .into_iter()
        .map(|(id, mut members)| {
            members.sort();
            let (internal_weight, incident_weight) =
                weights.get(&id).copied().unwrap_or((0.0, 0.0));

            Community {
                id,
                size: members.len(),
                members,
                internal_weight,
                incident_weight,
            }
        })
        .collect();

    communities.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
    communities
}
