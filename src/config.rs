//! Configuration for index construction and community detection

use serde::{Deserialize, Serialize};

/// Default edge attribute read when weights are enabled
pub const DEFAULT_WEIGHT_ATTRIBUTE: &str = "weight";

/// How the node→community hierarchy is retained across coarsening levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryMode {
    /// Keep one mapping array per level
    Full,

    /// Keep a single mapping, rewritten in place on each coarsening
    #[default]
    FlattenedOnly,
}

/// Options used when building a Louvain index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Read edge weights from `weight_attribute` instead of counting every edge as 1
    pub weighted: bool,

    /// Edge attribute holding the weight
    pub weight_attribute: String,

    /// Modularity resolution (gamma)
    pub resolution: f64,

    /// Hierarchy retention mode
    pub history: HistoryMode,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            weighted: false,
            weight_attribute: DEFAULT_WEIGHT_ATTRIBUTE.to_string(),
            resolution: 1.0,
            history: HistoryMode::default(),
        }
    }
}

impl IndexOptions {

    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn with_weight_attribute(mut self, attribute: &str) -> Self {
        self.weight_attribute = attribute.to_string();
        self
    }

    /// Set the resolution. Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Keep every level of the dendrogram instead of a flattened mapping
    pub fn keep_dendrogram(mut self, keep: bool) -> Self {
        self.history = if keep {
            HistoryMode::Full
        } else {
            HistoryMode::FlattenedOnly
        };
        self
    }
}

/// Limits for the reference Louvain driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of coarsening levels
    pub max_levels: usize,

    /// Maximum local-moving sweeps per level
    pub max_passes: usize,

    /// Smallest modularity delta considered an improvement
    pub min_gain: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_levels: 32,
            max_passes: 64,
            min_gain: 1e-10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = IndexOptions::default();
        assert!(!options.weighted);
        assert_eq!(options.weight_attribute, "weight");
        assert_eq!(options.resolution, 1.0);
        assert_eq!(options.history, HistoryMode::FlattenedOnly);
    }

    #[test]
    fn keep_dendrogram_toggles_history_mode() {
        let options = IndexOptions::default().keep_dendrogram(true);
        assert_eq!(options.history, HistoryMode::Full);
        assert_eq!(
            options.keep_dendrogram(false).history,
            HistoryMode::FlattenedOnly
        );
    }
}
