//! End-to-end flows: load, clean and merge, aggregate, then infer.

use super::aggregation::aggregate;
use super::cleaning::clean_and_merge;
use super::io::load_sources;
use super::types::{CleaningReport, GroupSummaryTable, MergedTable};
use crate::analyser::inference::{InferenceReport, run_inference};
use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Output of the cleaning stage.
pub struct CleanRun {
    pub merged: MergedTable,
    pub cleaning: CleaningReport,
}

/// Output of cleaning plus aggregation.
pub struct PipelineRun {
    pub merged: MergedTable,
    pub groups: GroupSummaryTable,
    pub cleaning: CleaningReport,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub cleaning: CleaningReport,
    pub inference: InferenceReport,
}

/// # Errors
///
/// Propagates load and cleaning errors.
pub fn clean_flow(parks: &Path, species: &Path) -> Result<CleanRun> {
    let start = Instant::now();
    let sources = load_sources(parks, species)?;
    let (merged, cleaning) = clean_and_merge(sources).context("Cleaning failed")?;
    tracing::info!(
        "Cleaned and merged {} rows in {:.2?}",
        merged.height(),
        start.elapsed()
    );
    Ok(CleanRun { merged, cleaning })
}

/// # Errors
///
/// Propagates load, cleaning and aggregation errors.
pub fn pipeline_flow(parks: &Path, species: &Path) -> Result<PipelineRun> {
    let CleanRun { merged, cleaning } = clean_flow(parks, species)?;
    let groups = aggregate(&merged).context("Aggregation failed")?;
    Ok(PipelineRun {
        merged,
        groups,
        cleaning,
    })
}

/// # Errors
///
/// Propagates load, cleaning and aggregation errors, and `Config` for an
/// invalid `config`. Failures inside individual routines are captured in
/// the report instead.
pub fn analyze_flow(parks: &Path, species: &Path, config: &AnalysisConfig) -> Result<AnalysisRun> {
    let run = pipeline_flow(parks, species)?;
    let start = Instant::now();
    let inference = run_inference(&run.merged, &run.groups, config)?;
    tracing::info!("Inference finished in {:.2?}", start.elapsed());
    Ok(AnalysisRun {
        cleaning: run.cleaning,
        inference,
    })
}
