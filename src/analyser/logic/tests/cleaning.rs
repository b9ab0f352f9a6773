use super::{raw_parks, raw_sources, raw_species};
use crate::analyser::logic::cleaning::{
    clean_and_merge, coerce_park_numerics, deduplicate_parks, impute_column_mean, join_parks,
    normalise_conservation_status, prune_columns, retain_listed_species, scrub_missing,
};
use crate::analyser::logic::io::SourceTables;
use crate::analyser::logic::naming::normalise_frame_headers;
use crate::analyser::logic::types::{NOT_LISTED, columns};
use crate::error::ParkStatsError;
use anyhow::Result;
use approx::assert_relative_eq;
use polars::prelude::*;

fn status_values(df: &DataFrame) -> Result<Vec<Option<String>>> {
    Ok(df
        .column(columns::CONSERVATION_STATUS)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(ToOwned::to_owned))
        .collect())
}

fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    Ok(df
        .column(column)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect())
}

#[test]
fn test_merged_table_has_no_missing_cells() -> Result<()> {
    let (merged, _) = clean_and_merge(raw_sources())?;
    assert_eq!(merged.height(), 3);
    for column in merged.df().get_columns() {
        assert_eq!(column.null_count(), 0, "'{}' has missing cells", column.name());
        if column.dtype() == &DataType::String {
            let series = column.as_materialized_series();
            let empties = series.str()?.into_iter().filter(|v| *v == Some("")).count();
            assert_eq!(empties, 0, "'{}' has empty strings", column.name());
        }
    }
    Ok(())
}

#[test]
fn test_merged_table_excludes_not_listed() -> Result<()> {
    let (merged, _) = clean_and_merge(raw_sources())?;
    let statuses = status_values(merged.df())?;
    assert!(statuses.iter().all(|s| s.as_deref() != Some(NOT_LISTED)));

    let mut kept: Vec<String> = merged
        .records()?
        .into_iter()
        .map(|r| r.scientific_name)
        .collect();
    kept.sort();
    assert_eq!(
        kept,
        vec!["Alces alces", "Crotalus viridis", "Haliaeetus leucocephalus"]
    );
    Ok(())
}

#[test]
fn test_cleaning_report_counts() -> Result<()> {
    let (_, report) = clean_and_merge(raw_sources())?;

    assert_eq!(report.park_rows_loaded, 3);
    assert_eq!(report.species_rows_loaded, 9);
    assert_eq!(report.statuses_normalised.missing, 1);
    assert_eq!(report.statuses_normalised.empty, 1);
    assert_eq!(report.statuses_normalised.unknown, 1);
    assert_eq!(report.not_listed_rows_removed, 3);
    assert_eq!(report.species_rows_retained, 6);
    assert_eq!(report.acres_coerced_to_missing, 1);
    assert_eq!(report.latitude_coerced_to_missing, 1);
    assert_eq!(report.longitude_coerced_to_missing, 0);
    assert_eq!(report.latitude_imputation.filled, 1);
    assert_relative_eq!(
        report.latitude_imputation.fill_value.unwrap_or_default(),
        41.515,
        epsilon = 1e-9
    );
    assert_eq!(report.longitude_imputation.filled, 0);
    assert_eq!(report.duplicate_parks_dropped, 0);
    assert_eq!(report.unmatched_species_rows, 1);
    assert_eq!(
        report.columns_pruned,
        vec![
            columns::SEASONALITY,
            columns::ABUNDANCE,
            columns::SPECIES_ID,
            columns::PARK_CODE
        ]
    );
    // Badlands (no acreage), Yosemite (no park) and the unnamed plant
    assert_eq!(report.rows_dropped_in_scrub, 3);
    assert_eq!(report.merged_rows, 3);
    Ok(())
}

#[test]
fn test_status_normalisation_exact_matches_only() -> Result<()> {
    let species = df!(
        "Conservation Status" => [Some("Unknown"), Some(""), None, Some("unknown"), Some(" Endangered")]
    )?;
    let (df, counts) = normalise_conservation_status(species)?;
    assert_eq!(counts.total(), 3);
    assert_eq!(
        status_values(&df)?,
        vec![
            Some(NOT_LISTED.to_owned()),
            Some(NOT_LISTED.to_owned()),
            Some(NOT_LISTED.to_owned()),
            Some("unknown".to_owned()),
            Some(" Endangered".to_owned()),
        ]
    );

    let retained = retain_listed_species(df)?;
    assert_eq!(retained.height(), 2);
    Ok(())
}

#[test]
fn test_imputation_is_idempotent() -> Result<()> {
    let parks = df!(
        "Latitude" => [Some(10.0), None, Some(30.0), None]
    )?;
    let (once, first) = impute_column_mean(parks, columns::LATITUDE)?;
    assert_eq!(first.filled, 2);
    assert_eq!(first.fill_value, Some(20.0));

    let (twice, second) = impute_column_mean(once.clone(), columns::LATITUDE)?;
    assert_eq!(second.filled, 0);
    assert!(once.equals(&twice));

    let values: Vec<Option<f64>> = f64_values(&twice, columns::LATITUDE)?;
    assert_eq!(values, vec![Some(10.0), Some(20.0), Some(30.0), Some(20.0)]);
    Ok(())
}

#[test]
fn test_negative_and_invalid_acres_become_missing() -> Result<()> {
    let parks = df!(
        "Acres" => ["100", "-5", "n/a"],
        "Latitude" => ["1.5", "2.5", "3.5"],
        "Longitude" => ["-1", "-2", "west"]
    )?;
    let (df, counts) = coerce_park_numerics(parks)?;
    assert_eq!(counts.acres, 2);
    assert_eq!(counts.latitude, 0);
    assert_eq!(counts.longitude, 1);

    let acres: Vec<Option<f64>> = f64_values(&df, columns::ACRES)?;
    assert_eq!(acres, vec![Some(100.0), None, None]);
    Ok(())
}

#[test]
fn test_duplicate_parks_keep_first() -> Result<()> {
    let parks = df!(
        "Park Name" => ["Acadia", "Arches", "Acadia"],
        "Acres" => [1.0, 2.0, 3.0]
    )?;
    let (df, dropped) = deduplicate_parks(parks)?;
    assert_eq!(dropped, 1);
    let acres: Vec<Option<f64>> = f64_values(&df, columns::ACRES)?;
    assert_eq!(acres, vec![Some(1.0), Some(2.0)]);
    Ok(())
}

#[test]
fn test_scrub_drops_empty_strings_and_nulls() -> Result<()> {
    let df = df!(
        "Category" => [Some("Bird"), Some(""), Some("Fish"), None],
        "Acres" => [Some(1.0), Some(2.0), None, Some(4.0)]
    )?;
    let scrubbed = scrub_missing(df)?;
    assert_eq!(scrubbed.height(), 1);
    Ok(())
}

#[test]
fn test_prune_ignores_absent_columns() -> Result<()> {
    let df = df!(
        "Park Name" => ["Acadia"],
        "Abundance" => ["Rare"]
    )?;
    let (pruned_df, pruned) = prune_columns(df)?;
    assert_eq!(pruned, vec![columns::ABUNDANCE]);
    assert_eq!(pruned_df.width(), 1);
    Ok(())
}

#[test]
fn test_missing_join_key_is_schema_error() {
    let species = raw_species().drop("Park_Name").unwrap();
    let result = clean_and_merge(SourceTables {
        parks: raw_parks(),
        species,
    });
    assert!(matches!(result, Err(ParkStatsError::Schema(msg)) if msg.contains("Park Name")));
}

#[test]
fn test_missing_scientific_name_is_schema_error() {
    let species = raw_species().drop("Scientific_Name").unwrap();
    let result = clean_and_merge(SourceTables {
        parks: raw_parks(),
        species,
    });
    assert!(matches!(result, Err(ParkStatsError::Schema(msg)) if msg.contains("Scientific Name")));
}

#[test]
fn test_missing_park_coordinates_is_schema_error() {
    let parks = raw_parks().drop("Latitude").unwrap();
    let result = clean_and_merge(SourceTables {
        parks,
        species: raw_species(),
    });
    assert!(matches!(result, Err(ParkStatsError::Schema(_))));
}

#[test]
fn test_join_keeps_unmatched_species_with_missing_park_fields() -> Result<()> {
    let (parks, _) = normalise_frame_headers(raw_parks())?;
    let (parks, _) = coerce_park_numerics(parks)?;
    let species = df!(
        "Park Name" => ["Acadia National Park", "Nowhere"],
        "Category" => ["Bird", "Bird"]
    )?;
    let joined = join_parks(species, parks)?;
    assert_eq!(joined.height(), 2);
    assert_eq!(joined.column(columns::ACRES)?.null_count(), 1);
    Ok(())
}
