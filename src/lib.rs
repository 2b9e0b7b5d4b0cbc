//! Louvain community-detection indices over attributed graphs

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod louvain;
pub mod storage;

pub use config::{DetectionConfig, HistoryMode, IndexOptions};
pub use error::{IndexError, IndexResult};
pub use louvain::{DirectedLouvainIndex, LouvainIndex, UndirectedLouvainIndex};

pub use anyhow::{Result, anyhow};
