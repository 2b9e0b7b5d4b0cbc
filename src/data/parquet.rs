//! Parquet edge lists

use crate::data::EdgeRecord;
use crate::graph::attributed::Attributes;
use anyhow::Result;
use polars::prelude::*;
use serde_json::Value;

pub const SOURCE_COLUMN: &str = "source";
pub const TARGET_COLUMN: &str = "target";

/// Load a `source`/`target` edge list, with an optional numeric weight column.
///
/// Identifier columns of any type are read through a cast to strings. Rows
/// with a missing endpoint are skipped; a missing weight leaves the edge
/// without the attribute, so it counts as 1.
pub fn load_edge_list(path: &str, weight_attribute: &str) -> Result<Vec<EdgeRecord>> {
    log::info!("Reading parquet file: {}", path);

    if !std::path::Path::new(path).exists() {
        return Err(anyhow::anyhow!("File not found: {}", path));
    }

    let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
    log::debug!("File schema: {:?}", df.schema());

    let sources = df.column(SOURCE_COLUMN)?.cast(&DataType::String)?;
    let targets = df.column(TARGET_COLUMN)?.cast(&DataType::String)?;
    let sources = sources.str()?;
    let targets = targets.str()?;

    let weights = match df.column(weight_attribute) {
        Ok(column) => Some(column.cast(&DataType::Float64)?),
        Err(_) => None,
    };
    let weights = weights.as_ref().map(|w| w.f64()).transpose()?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        let (Some(source), Some(target)) = (sources.get(i), targets.get(i)) else {
            skipped += 1;
            continue;
        };

        let mut attributes = Attributes::new();
        if let Some(weight) = weights.and_then(|w| w.get(i)) {
            attributes.insert(weight_attribute.to_string(), Value::from(weight));
        }

        records.push(EdgeRecord {
            source: source.to_string(),
            target: target.to_string(),
            attributes,
        });
    }

    if skipped > 0 {
        log::warn!("Skipped {} rows with a missing endpoint", skipped);
    }
    log::info!("Loaded {} edges", records.len());

    Ok(records)
}
