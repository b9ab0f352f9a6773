//! Cleaning and merging of the park and species tables.
//!
//! The steps run in a fixed order and each one returns what it changed, so
//! [`clean_and_merge`] can assemble a [`CleaningReport`] that explains how
//! the merged table was derived from the sources:
//!
//! 1. header normalization ([`super::naming`])
//! 2. conservation status normalization and the "Not Listed" filter
//! 3. park numeric coercion and coordinate mean imputation
//! 4. left join of species onto parks by park name
//! 5. pruning of unused columns
//! 6. final scrub of empty strings and incomplete rows
//!
//! Species without a recognised conservation status are removed in step 2.
//! This narrows the dataset to protected species only and is deliberate.

use super::io::SourceTables;
use super::naming::normalise_frame_headers;
use super::types::{
    CleaningReport, ImputationRecord, MergedTable, NOT_LISTED, PARK_COLUMNS, SPECIES_COLUMNS,
    StatusNormalisation, UNKNOWN_STATUS, columns, require_columns,
};
use crate::error::{ResultExt as _, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Values that became missing while coercing park numerics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoercionCounts {
    pub acres: usize,
    pub latitude: usize,
    pub longitude: usize,
}

/// # Errors
///
/// Returns `Schema` when either table lacks a required column, and
/// `DataProcessing` or a polars error when a cleaning step fails.
pub fn clean_and_merge(sources: SourceTables) -> Result<(MergedTable, CleaningReport)> {
    let mut report = CleaningReport {
        park_rows_loaded: sources.parks.height(),
        species_rows_loaded: sources.species.height(),
        ..Default::default()
    };

    let (parks, dropped_parks) =
        normalise_frame_headers(sources.parks).context("Failed to normalise park headers")?;
    let (species, dropped_species) =
        normalise_frame_headers(sources.species).context("Failed to normalise species headers")?;
    report.unnamed_columns_dropped = dropped_parks + dropped_species;
    if report.unnamed_columns_dropped > 0 {
        tracing::info!(
            "Dropped {} column(s) without a header",
            report.unnamed_columns_dropped
        );
    }

    require_columns(&parks, &PARK_COLUMNS, "Parks")?;
    require_columns(&species, &SPECIES_COLUMNS, "Species")?;

    let (species, statuses) = normalise_conservation_status(species)?;
    report.statuses_normalised = statuses;
    let before_filter = species.height();
    let species = retain_listed_species(species)?;
    report.not_listed_rows_removed = before_filter - species.height();
    report.species_rows_retained = species.height();
    tracing::info!(
        "Conservation status: {} rewritten to '{NOT_LISTED}', {} rows removed, {} retained",
        report.statuses_normalised.total(),
        report.not_listed_rows_removed,
        report.species_rows_retained
    );

    let (parks, coerced) = coerce_park_numerics(parks)?;
    report.acres_coerced_to_missing = coerced.acres;
    report.latitude_coerced_to_missing = coerced.latitude;
    report.longitude_coerced_to_missing = coerced.longitude;

    let (parks, latitude) = impute_column_mean(parks, columns::LATITUDE)?;
    let (parks, longitude) = impute_column_mean(parks, columns::LONGITUDE)?;
    report.latitude_imputation = latitude;
    report.longitude_imputation = longitude;

    let (parks, duplicates) = deduplicate_parks(parks)?;
    report.duplicate_parks_dropped = duplicates;

    report.unmatched_species_rows = count_unmatched_species(&species, &parks)?;
    let merged = join_parks(species, parks)?;

    let (merged, pruned) = prune_columns(merged)?;
    report.columns_pruned = pruned;

    let before_scrub = merged.height();
    let merged = scrub_missing(merged)?;
    report.rows_dropped_in_scrub = before_scrub - merged.height();
    report.merged_rows = merged.height();
    tracing::info!(
        "Merged table: {} rows ({} unmatched species rows, {} rows dropped in scrub)",
        report.merged_rows,
        report.unmatched_species_rows,
        report.rows_dropped_in_scrub
    );

    Ok((MergedTable::new(merged)?, report))
}

/// Rewrites missing, empty and "Unknown" statuses to the "Not Listed" sentinel.
///
/// # Errors
///
/// Fails when the status column cannot be read as text.
pub fn normalise_conservation_status(
    species: DataFrame,
) -> Result<(DataFrame, StatusNormalisation)> {
    let mut counts = StatusNormalisation::default();
    {
        let status = species
            .column(columns::CONSERVATION_STATUS)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        for value in status.str()?.into_iter() {
            match value {
                None => counts.missing += 1,
                Some("") => counts.empty += 1,
                Some(UNKNOWN_STATUS) => counts.unknown += 1,
                Some(_) => {}
            }
        }
    }

    let status = col(columns::CONSERVATION_STATUS).cast(DataType::String);
    let normalised = when(
        status
            .clone()
            .is_null()
            .or(status.clone().eq(lit("")))
            .or(status.clone().eq(lit(UNKNOWN_STATUS))),
    )
    .then(lit(NOT_LISTED))
    .otherwise(status)
    .alias(columns::CONSERVATION_STATUS);

    let df = species
        .lazy()
        .with_column(normalised)
        .collect()
        .context("Failed to normalise conservation status")?;
    Ok((df, counts))
}

/// Keeps only species with a recognised conservation status.
///
/// # Errors
///
/// Fails when the status column cannot be filtered.
pub fn retain_listed_species(species: DataFrame) -> Result<DataFrame> {
    species
        .lazy()
        .filter(col(columns::CONSERVATION_STATUS).neq(lit(NOT_LISTED)))
        .collect()
        .context("Failed to filter conservation status")
}

fn count_non_null(df: &DataFrame, column: &str) -> Result<usize> {
    let c = df.column(column)?;
    Ok(c.len() - c.null_count())
}

/// Parses acreage and coordinates as numbers; unparsable values become
/// missing, and so do negative acreages.
///
/// # Errors
///
/// Fails when a park numeric column cannot be cast.
pub fn coerce_park_numerics(parks: DataFrame) -> Result<(DataFrame, CoercionCounts)> {
    let [acres_before, latitude_before, longitude_before] = [
        count_non_null(&parks, columns::ACRES)?,
        count_non_null(&parks, columns::LATITUDE)?,
        count_non_null(&parks, columns::LONGITUDE)?,
    ];

    let acres = col(columns::ACRES).cast(DataType::Float64);
    let df = parks
        .lazy()
        .with_columns([
            when(acres.clone().lt(lit(0.0)))
                .then(lit(NULL).cast(DataType::Float64))
                .otherwise(acres)
                .alias(columns::ACRES),
            col(columns::LATITUDE)
                .cast(DataType::Float64)
                .alias(columns::LATITUDE),
            col(columns::LONGITUDE)
                .cast(DataType::Float64)
                .alias(columns::LONGITUDE),
        ])
        .collect()
        .context("Failed to coerce park numerics")?;

    let counts = CoercionCounts {
        acres: acres_before - count_non_null(&df, columns::ACRES)?,
        latitude: latitude_before - count_non_null(&df, columns::LATITUDE)?,
        longitude: longitude_before - count_non_null(&df, columns::LONGITUDE)?,
    };
    if counts != CoercionCounts::default() {
        tracing::warn!(
            "Coerced to missing: {} acreage, {} latitude, {} longitude value(s)",
            counts.acres,
            counts.latitude,
            counts.longitude
        );
    }
    Ok((df, counts))
}

/// Replaces missing values of a numeric column with the mean of its
/// non-missing values. Running it again on the result changes nothing.
///
/// # Errors
///
/// Fails when `column` is absent or not numeric.
pub fn impute_column_mean(df: DataFrame, column: &str) -> Result<(DataFrame, ImputationRecord)> {
    let values = df.column(column)?.as_materialized_series().cast(&DataType::Float64)?;
    let filled = values.null_count();
    let fill_value = values.f64()?.mean();

    let record = ImputationRecord {
        column: column.to_owned(),
        filled: if fill_value.is_some() { filled } else { 0 },
        fill_value,
    };
    if record.filled == 0 {
        return Ok((df, record));
    }

    let target = col(column).cast(DataType::Float64);
    let df = df
        .lazy()
        .with_column(target.clone().fill_null(target.mean()).alias(column))
        .collect()
        .with_context(|| format!("Failed to impute '{column}'"))?;

    tracing::info!(
        "Imputed {} missing '{column}' value(s) with mean {:.6}",
        record.filled,
        fill_value.unwrap_or(f64::NAN)
    );
    Ok((df, record))
}

/// Keeps the first record of every park name.
///
/// # Errors
///
/// Fails when the park-name column is absent.
pub fn deduplicate_parks(parks: DataFrame) -> Result<(DataFrame, usize)> {
    let before = parks.height();
    let df = parks
        .lazy()
        .filter(col(columns::PARK_NAME).is_first_distinct())
        .collect()
        .context("Failed to deduplicate parks")?;

    let dropped = before - df.height();
    if dropped > 0 {
        tracing::warn!("Dropped {dropped} duplicate park record(s)");
    }
    Ok((df, dropped))
}

fn count_unmatched_species(species: &DataFrame, parks: &DataFrame) -> Result<usize> {
    let park_names = parks
        .column(columns::PARK_NAME)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let known: HashSet<&str> = park_names.str()?.into_iter().flatten().collect();

    let species_parks = species
        .column(columns::PARK_NAME)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(species_parks
        .str()?
        .into_iter()
        .filter(|name| name.is_none_or(|name| !known.contains(name)))
        .count())
}

/// Left join of species onto parks by park name.
///
/// # Errors
///
/// Fails when either frame lacks the park-name key.
pub fn join_parks(species: DataFrame, parks: DataFrame) -> Result<DataFrame> {
    let park_name = || col(columns::PARK_NAME).cast(DataType::String);
    let species = species.lazy().with_column(park_name());
    let parks = parks.lazy().with_column(park_name());

    species
        .left_join(parks, col(columns::PARK_NAME), col(columns::PARK_NAME))
        .collect()
        .context("Failed to join species with parks")
}

/// Drops the columns the analysis never reads.
///
/// # Errors
///
/// Fails when the projection cannot be collected.
pub fn prune_columns(df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let pruned: Vec<String> = columns::PRUNED
        .iter()
        .filter(|name| present.iter().any(|p| p == *name))
        .map(|name| (*name).to_owned())
        .collect();

    if pruned.is_empty() {
        return Ok((df, pruned));
    }
    let kept: Vec<Expr> = present
        .iter()
        .filter(|name| !pruned.contains(name))
        .map(|name| col(name.as_str()))
        .collect();
    let df = df
        .lazy()
        .select(kept)
        .collect()
        .context("Failed to prune columns")?;
    Ok((df, pruned))
}

/// Treats empty strings as missing and drops every row with a missing cell.
///
/// # Errors
///
/// Fails when the null filter cannot be collected.
pub fn scrub_missing(df: DataFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|c| {
            let name = c.name().as_str();
            if c.dtype() == &DataType::String {
                when(col(name).eq(lit("")))
                    .then(lit(NULL).cast(DataType::String))
                    .otherwise(col(name))
                    .alias(name)
            } else {
                col(name)
            }
        })
        .collect();

    df.lazy()
        .select(exprs)
        .drop_nulls(None)
        .collect()
        .context("Failed to scrub missing values")
}
