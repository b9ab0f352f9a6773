use crate::analyser::inference::report::{Outcome, run_inference};
use crate::analyser::logic::aggregation::aggregate;
use crate::analyser::inference::types::PermutationMode;
use crate::analyser::logic::types::MergedTable;
use crate::config::{AnalysisConfig, ResamplingConfig};
use crate::error::{ErrorKind, ParkStatsError};
use anyhow::{Context as _, Result};
use approx::assert_abs_diff_eq;
use polars::prelude::*;

/// Birds only, so any test of the category effect is degenerate.
fn single_category_table() -> Result<MergedTable> {
    let parks = ["Acadia", "Acadia", "Acadia", "Arches", "Arches", "Zion", "Zion", "Olympic", "Olympic"];
    let acres = [100.0, 100.0, 100.0, 50.0, 50.0, 300.0, 300.0, 20.0, 20.0];
    let latitude = [44.0, 44.0, 44.0, 38.0, 38.0, 36.0, 36.0, 47.0, 47.0];
    let longitude = [-68.0, -68.0, -68.0, -109.0, -109.0, -112.0, -112.0, -122.0, -122.0];
    let statuses = [
        "Endangered", "Endangered", "Threatened", "Endangered", "Threatened",
        "Endangered", "Threatened", "Endangered", "Threatened",
    ];
    let names: Vec<String> = (0..parks.len()).map(|i| format!("Species {i}")).collect();
    let df = df!(
        "Park Name" => parks,
        "Category" => ["Bird"; 9],
        "Scientific Name" => names,
        "Conservation Status" => statuses,
        "Acres" => acres,
        "Latitude" => latitude,
        "Longitude" => longitude
    )?;
    Ok(MergedTable::new(df)?)
}

/// Three parks, two categories and both statuses, with latitude a fixed
/// multiple of acreage.
fn proportional_table() -> Result<MergedTable> {
    let mut parks = Vec::new();
    let mut categories = Vec::new();
    let mut statuses = Vec::new();
    let mut acres = Vec::new();
    let mut latitude = Vec::new();
    let mut cell = 0;
    for (park, area) in [("Acadia", 1000.0), ("Arches", 2000.0), ("Zion", 3000.0)] {
        for category in ["Bird", "Mammal"] {
            for status in ["Endangered", "Threatened"] {
                for _ in 0..=(cell % 3) {
                    parks.push(park);
                    categories.push(category);
                    statuses.push(status);
                    acres.push(area);
                    latitude.push(0.001 * area);
                }
                cell += 1;
            }
        }
    }
    let names: Vec<String> = (0..parks.len()).map(|i| format!("Species {i}")).collect();
    let longitude = vec![-100.0; parks.len()];
    let df = df!(
        "Park Name" => parks,
        "Category" => categories,
        "Scientific Name" => names,
        "Conservation Status" => statuses,
        "Acres" => acres,
        "Latitude" => latitude,
        "Longitude" => longitude
    )?;
    Ok(MergedTable::new(df)?)
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        resampling: ResamplingConfig::seeded(200, 1),
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_failed_routine_does_not_abort_the_report() -> Result<()> {
    let merged = single_category_table()?;
    let groups = aggregate(&merged)?;
    let report = run_inference(&merged, &groups, &config())?;

    assert_eq!(report.merged_rows, 9);
    assert_eq!(report.groups, 8);
    assert!(report.welch_t_test.is_completed());
    assert!(report.correlation.is_completed());
    assert!(report.permutation_test.is_completed());
    assert!(report.linear_regression.is_completed());
    assert_eq!(
        report.two_way_anova.failure_kind(),
        Some(ErrorKind::DegenerateInput)
    );
    assert!(
        report
            .failures()
            .contains(&("two_way_anova", ErrorKind::DegenerateInput))
    );
    assert_eq!(report.levene_test.failure_kind(), Some(ErrorKind::DegenerateInput));
    assert_eq!(report.kruskal_wallis.failure_kind(), Some(ErrorKind::DegenerateInput));
    Ok(())
}

#[test]
fn test_proportional_latitude_gives_perfect_correlation() -> Result<()> {
    let merged = proportional_table()?;
    let groups = aggregate(&merged)?;
    let report = run_inference(&merged, &groups, &config())?;

    assert_eq!(report.merged_rows, 24);
    assert_eq!(report.groups, 12);
    let correlation = report.correlation.completed().context("correlation failed")?;
    assert_abs_diff_eq!(correlation.r, 1.0, epsilon = 1e-9);
    assert!(correlation.p_value < 1e-6);
    let permutation = report.permutation_test.completed().context("permutation test failed")?;
    assert_abs_diff_eq!(permutation.observed_r, 1.0, epsilon = 1e-9);
    assert!(report.levene_test.is_completed());
    assert!(report.kruskal_wallis.is_completed());
    Ok(())
}

#[test]
fn test_display_mode_keeps_null_distribution() -> Result<()> {
    let merged = single_category_table()?;
    let groups = aggregate(&merged)?;
    let mut config = config();
    config.resampling.permutation_mode = PermutationMode::Display;
    let report = run_inference(&merged, &groups, &config)?;

    let permutation = report.permutation_test.completed().context("permutation test failed")?;
    assert_eq!(permutation.null_distribution.as_ref().map(Vec::len), Some(200));
    Ok(())
}

#[test]
fn test_report_serialises_outcomes_with_status() -> Result<()> {
    let merged = single_category_table()?;
    let groups = aggregate(&merged)?;
    let report = run_inference(&merged, &groups, &config())?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["welch_t_test"]["status"], "completed");
    assert_eq!(json["two_way_anova"]["status"], "failed");
    assert_eq!(json["two_way_anova"]["result"]["kind"], "degenerate_input");
    assert!(json["permutation_test"]["result"].get("null_distribution").is_none());
    Ok(())
}

#[test]
fn test_same_seed_gives_same_report() -> Result<()> {
    let merged = single_category_table()?;
    let groups = aggregate(&merged)?;
    let first = run_inference(&merged, &groups, &config())?;
    let second = run_inference(&merged, &groups, &config())?;
    assert_eq!(first.bootstrap, second.bootstrap);
    assert_eq!(first.permutation_test, second.permutation_test);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected_before_running() -> Result<()> {
    let merged = single_category_table()?;
    let groups = aggregate(&merged)?;
    let config = AnalysisConfig {
        confidence_level: 1.5,
        ..config()
    };
    assert!(matches!(
        run_inference(&merged, &groups, &config),
        Err(ParkStatsError::Config(_))
    ));
    Ok(())
}

#[test]
fn test_outcome_from_result() {
    let failed: Outcome<f64> = Err(ParkStatsError::Numeric("singular".to_owned())).into();
    assert_eq!(failed.failure_kind(), Some(ErrorKind::Numeric));
    assert!(failed.completed().is_none());

    let done: Outcome<f64> = Ok(1.0).into();
    assert_eq!(done.completed(), Some(&1.0));
}
