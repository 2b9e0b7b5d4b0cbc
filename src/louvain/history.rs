//! Node→community hierarchy recorded across coarsening levels

use crate::config::HistoryMode;
use crate::louvain::pointer::PointerArray;
use serde::Serialize;

/// Mapping of every original node to its community, per level.
///
/// `Dendrogram` keeps one array per level (level 0 is the identity);
/// `Flattened` keeps only the current level, composed in place.
#[derive(Debug, Clone, Serialize)]
pub enum History {
    Dendrogram(Vec<PointerArray>),
    Flattened(PointerArray),
}

impl History {
    /// Identity mapping over `order` original nodes
    pub fn new(mode: HistoryMode, order: usize) -> Self {
        match mode {
            HistoryMode::Full => History::Dendrogram(vec![PointerArray::identity(order)]),
            HistoryMode::FlattenedOnly => History::Flattened(PointerArray::identity(order)),
        }
    }

    pub fn mode(&self) -> HistoryMode {
        match self {
            History::Dendrogram(_) => HistoryMode::Full,
            History::Flattened(_) => HistoryMode::FlattenedOnly,
        }
    }

    /// Compose the latest mapping with the renumbered belongings of the level
    /// being coarsened: `renumbered[i]` is the new community of node `i` at
    /// that level, and `communities` bounds the new ids.
    pub fn record(&mut self, renumbered: &PointerArray, communities: usize) {
        match self {
            History::Dendrogram(levels) => {
                let Some(current) = levels.last() else {
                    return;
                };

                let order = current.len();
                let mut next = PointerArray::for_max_value(communities.saturating_sub(1), order);
                for i in 0..order {
                    next.set(i, renumbered.get(current.get(i)));
                }

                levels.push(next);
            }
            History::Flattened(mapping) => {
                for i in 0..mapping.len() {
                    let community = renumbered.get(mapping.get(i));
                    mapping.set(i, community);
                }
            }
        }
    }

    /// Mapping at `level`, if retained. `current` is the index's level.
    pub fn mapping(&self, level: usize, current: usize) -> Option<&PointerArray> {
        match self {
            History::Dendrogram(levels) => levels.get(level),
            History::Flattened(mapping) => (level == current).then_some(mapping),
        }
    }

    /// Every retained level, oldest first
    pub fn levels(&self) -> Vec<&PointerArray> {
        match self {
            History::Dendrogram(levels) => levels.iter().collect(),
            History::Flattened(mapping) => vec![mapping],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renumbering(values: &[usize]) -> PointerArray {
        let mut array = PointerArray::for_max_value(values.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            array.set(i, v);
        }
        array
    }

    #[test]
    fn dendrogram_composes_levels() {
        let mut history = History::new(HistoryMode::Full, 4);

        history.record(&renumbering(&[0, 0, 1, 1]), 2);
        history.record(&renumbering(&[0, 0]), 1);

        assert_eq!(history.mapping(0, 2).unwrap().prefix(4), vec![0, 1, 2, 3]);
        assert_eq!(history.mapping(1, 2).unwrap().prefix(4), vec![0, 0, 1, 1]);
        assert_eq!(history.mapping(2, 2).unwrap().prefix(4), vec![0, 0, 0, 0]);
        assert!(history.mapping(3, 2).is_none());
    }

    #[test]
    fn flattened_only_answers_current_level() {
        let mut history = History::new(HistoryMode::FlattenedOnly, 3);
        history.record(&renumbering(&[1, 0, 1]), 2);

        assert_eq!(history.mapping(1, 1).unwrap().prefix(3), vec![1, 0, 1]);
        assert!(history.mapping(0, 1).is_none());
        assert_eq!(history.mode(), HistoryMode::FlattenedOnly);
    }
}
