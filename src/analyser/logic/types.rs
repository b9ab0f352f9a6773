use crate::error::{ParkStatsError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column headers after normalization.
pub mod columns {
    pub const PARK_CODE: &str = "Park Code";
    pub const PARK_NAME: &str = "Park Name";
    pub const STATE: &str = "State";
    pub const ACRES: &str = "Acres";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";

    pub const SPECIES_ID: &str = "Species ID";
    pub const CATEGORY: &str = "Category";
    pub const SCIENTIFIC_NAME: &str = "Scientific Name";
    pub const ABUNDANCE: &str = "Abundance";
    pub const SEASONALITY: &str = "Seasonality";
    pub const CONSERVATION_STATUS: &str = "Conservation Status";

    pub const SPECIES_COUNT: &str = "Species Count";
    pub const MEAN_ACRES: &str = "Mean Acres";
    pub const MEAN_LATITUDE: &str = "Mean Latitude";
    pub const MEAN_LONGITUDE: &str = "Mean Longitude";

    /// Columns the merge never carries forward.
    pub const PRUNED: [&str; 4] = [SEASONALITY, ABUNDANCE, SPECIES_ID, PARK_CODE];
}

/// Sentinel for species without a recognised protective status.
pub const NOT_LISTED: &str = "Not Listed";
/// Raw status value treated the same as a missing one.
pub const UNKNOWN_STATUS: &str = "Unknown";

pub const PARK_COLUMNS: [&str; 4] = [
    columns::PARK_NAME,
    columns::ACRES,
    columns::LATITUDE,
    columns::LONGITUDE,
];

pub const SPECIES_COLUMNS: [&str; 4] = [
    columns::PARK_NAME,
    columns::CATEGORY,
    columns::SCIENTIFIC_NAME,
    columns::CONSERVATION_STATUS,
];

pub const MERGED_COLUMNS: [&str; 7] = [
    columns::PARK_NAME,
    columns::CATEGORY,
    columns::SCIENTIFIC_NAME,
    columns::CONSERVATION_STATUS,
    columns::ACRES,
    columns::LATITUDE,
    columns::LONGITUDE,
];

pub const SUMMARY_COLUMNS: [&str; 7] = [
    columns::PARK_NAME,
    columns::CATEGORY,
    columns::CONSERVATION_STATUS,
    columns::SPECIES_COUNT,
    columns::MEAN_ACRES,
    columns::MEAN_LATITUDE,
    columns::MEAN_LONGITUDE,
];

/// Fails with a schema error naming every `required` column missing from `df`.
///
/// # Errors
///
/// Returns `Schema` naming every missing column.
pub fn require_columns(df: &DataFrame, required: &[&str], table: &str) -> Result<()> {
    let present: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParkStatsError::Schema(format!(
            "{table} table is missing column(s): {} (found: {})",
            missing.join(", "),
            present.join(", ")
        )))
    }
}

/// One analysis-ready species observation joined with its park.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub park_name: String,
    pub category: String,
    pub scientific_name: String,
    pub conservation_status: String,
    pub acres: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Species count and park means for one (park, category, status) group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub park_name: String,
    pub category: String,
    pub conservation_status: String,
    pub species_count: u32,
    pub mean_acres: f64,
    pub mean_latitude: f64,
    pub mean_longitude: f64,
}

/// The cleaned and joined species table.
///
/// Construction checks the schema, so downstream code can address the
/// analysis columns without re-validating them.
#[derive(Clone, Debug)]
pub struct MergedTable {
    df: DataFrame,
}

impl MergedTable {
    /// # Errors
    ///
    /// Returns `Schema` when a merged column is missing.
    pub fn new(df: DataFrame) -> Result<Self> {
        require_columns(&df, &MERGED_COLUMNS, "Merged")?;
        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// # Errors
    ///
    /// Returns `DataProcessing` when a cell is missing, or a polars error
    /// when a column cannot be cast.
    pub fn records(&self) -> Result<Vec<MergedRecord>> {
        let park_name = str_column(&self.df, columns::PARK_NAME)?;
        let category = str_column(&self.df, columns::CATEGORY)?;
        let scientific_name = str_column(&self.df, columns::SCIENTIFIC_NAME)?;
        let status = str_column(&self.df, columns::CONSERVATION_STATUS)?;
        let acres = f64_column(&self.df, columns::ACRES)?;
        let latitude = f64_column(&self.df, columns::LATITUDE)?;
        let longitude = f64_column(&self.df, columns::LONGITUDE)?;

        let mut records = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            let (
                Some(park_name),
                Some(category),
                Some(scientific_name),
                Some(conservation_status),
                Some(acres),
                Some(latitude),
                Some(longitude),
            ) = (
                park_name.get(i).cloned().flatten(),
                category.get(i).cloned().flatten(),
                scientific_name.get(i).cloned().flatten(),
                status.get(i).cloned().flatten(),
                acres.get(i).copied().flatten(),
                latitude.get(i).copied().flatten(),
                longitude.get(i).copied().flatten(),
            )
            else {
                return Err(ParkStatsError::DataProcessing(format!(
                    "Merged row {i} contains a missing value"
                )));
            };
            records.push(MergedRecord {
                park_name,
                category,
                scientific_name,
                conservation_status,
                acres,
                latitude,
                longitude,
            });
        }
        Ok(records)
    }
}

/// The per-group summary table produced by the aggregator.
#[derive(Clone, Debug)]
pub struct GroupSummaryTable {
    df: DataFrame,
}

impl GroupSummaryTable {
    /// # Errors
    ///
    /// Returns `Schema` when a summary column is missing.
    pub fn new(df: DataFrame) -> Result<Self> {
        require_columns(&df, &SUMMARY_COLUMNS, "Group summary")?;
        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Sum of species counts across every group.
    ///
    /// # Errors
    ///
    /// Fails when the count column cannot be cast to floats.
    pub fn total_count(&self) -> Result<u64> {
        let counts = f64_column(&self.df, columns::SPECIES_COUNT)?;
        Ok(counts.into_iter().flatten().map(|c| c as u64).sum())
    }

    /// # Errors
    ///
    /// Returns `DataProcessing` when a cell is missing, or a polars error
    /// when a column cannot be cast.
    pub fn records(&self) -> Result<Vec<GroupSummary>> {
        let park_name = str_column(&self.df, columns::PARK_NAME)?;
        let category = str_column(&self.df, columns::CATEGORY)?;
        let status = str_column(&self.df, columns::CONSERVATION_STATUS)?;
        let count = f64_column(&self.df, columns::SPECIES_COUNT)?;
        let acres = f64_column(&self.df, columns::MEAN_ACRES)?;
        let latitude = f64_column(&self.df, columns::MEAN_LATITUDE)?;
        let longitude = f64_column(&self.df, columns::MEAN_LONGITUDE)?;

        let mut records = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            let (
                Some(park_name),
                Some(category),
                Some(conservation_status),
                Some(species_count),
                Some(mean_acres),
                Some(mean_latitude),
                Some(mean_longitude),
            ) = (
                park_name.get(i).cloned().flatten(),
                category.get(i).cloned().flatten(),
                status.get(i).cloned().flatten(),
                count.get(i).copied().flatten(),
                acres.get(i).copied().flatten(),
                latitude.get(i).copied().flatten(),
                longitude.get(i).copied().flatten(),
            )
            else {
                return Err(ParkStatsError::DataProcessing(format!(
                    "Group summary row {i} contains a missing value"
                )));
            };
            records.push(GroupSummary {
                park_name,
                category,
                conservation_status,
                species_count: species_count as u32,
                mean_acres,
                mean_latitude,
                mean_longitude,
            });
        }
        Ok(records)
    }
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(ToOwned::to_owned))
        .collect())
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// A missing-value fill applied to one column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub filled: usize,
    /// Mean of the non-missing values; `None` when the column had none.
    pub fill_value: Option<f64>,
}

/// Breakdown of conservation statuses rewritten to the sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNormalisation {
    pub missing: usize,
    pub empty: usize,
    pub unknown: usize,
}

impl StatusNormalisation {
    pub fn total(&self) -> usize {
        self.missing + self.empty + self.unknown
    }
}

/// Everything the cleaner/merger changed, for tracing and assertions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub park_rows_loaded: usize,
    pub species_rows_loaded: usize,
    pub unnamed_columns_dropped: usize,
    pub statuses_normalised: StatusNormalisation,
    pub not_listed_rows_removed: usize,
    pub species_rows_retained: usize,
    pub duplicate_parks_dropped: usize,
    pub acres_coerced_to_missing: usize,
    pub latitude_coerced_to_missing: usize,
    pub longitude_coerced_to_missing: usize,
    pub latitude_imputation: ImputationRecord,
    pub longitude_imputation: ImputationRecord,
    pub unmatched_species_rows: usize,
    pub columns_pruned: Vec<String>,
    pub rows_dropped_in_scrub: usize,
    pub merged_rows: usize,
}
