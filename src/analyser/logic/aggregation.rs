use super::types::{GroupSummaryTable, MergedTable, columns};
use crate::error::{ResultExt as _, Result};
use polars::prelude::*;

/// Collapses the merged table to one row per (park, category, status) with
/// the species count and the group means of acreage and coordinates.
///
/// Means skip missing values. Rows are sorted by the group keys so written
/// tables are stable; callers must not rely on the order otherwise.
///
/// # Errors
///
/// Returns a polars error if the group-by fails, or `Schema` if the
/// result does not validate as a group summary.
pub fn aggregate(merged: &MergedTable) -> Result<GroupSummaryTable> {
    let keys = [
        columns::PARK_NAME,
        columns::CATEGORY,
        columns::CONSERVATION_STATUS,
    ];

    let df = merged
        .df()
        .clone()
        .lazy()
        .group_by(keys.map(col))
        .agg([
            len().cast(DataType::UInt32).alias(columns::SPECIES_COUNT),
            col(columns::ACRES).mean().alias(columns::MEAN_ACRES),
            col(columns::LATITUDE).mean().alias(columns::MEAN_LATITUDE),
            col(columns::LONGITUDE).mean().alias(columns::MEAN_LONGITUDE),
        ])
        .sort(keys, SortMultipleOptions::default())
        .collect()
        .context("Failed to aggregate merged table")?;

    tracing::info!(
        "Aggregated {} merged rows into {} groups",
        merged.height(),
        df.height()
    );
    GroupSummaryTable::new(df)
}
