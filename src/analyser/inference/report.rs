use super::anova::two_way_anova;
use super::glm::poisson_regression;
use super::groups::{kruskal_wallis, levene_test};
use super::parametric::{pearson_correlation, welch_t_test};
use super::regression::linear_regression;
use super::resampling::{bootstrap, permutation_test};
use super::types::{
    AnovaTable, BootstrapResult, Correlation, KruskalWallisResult, LeveneResult,
    LinearRegressionSummary, PermutationResult, PoissonRegressionSummary,
    WelchTest,
};
use crate::analyser::logic::types::{GroupSummaryTable, MergedTable};
use crate::config::AnalysisConfig;
use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// Result of one routine inside a report: either its output or the reason
/// it could not run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Outcome<T> {
    Completed(T),
    Failed { kind: ErrorKind, message: String },
}

impl<T> Outcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(err) => Self::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

fn attempt<T>(routine: &str, run: impl FnOnce() -> Result<T>) -> Outcome<T> {
    let outcome = Outcome::from(run());
    if let Outcome::Failed { message, .. } = &outcome {
        tracing::warn!("{routine} skipped: {message}");
    } else {
        tracing::info!("{routine} completed");
    }
    outcome
}

/// Every inference routine over one cleaned dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    pub merged_rows: usize,
    pub groups: usize,
    pub confidence_level: f64,
    /// Acreage against latitude over the merged rows.
    pub welch_t_test: Outcome<WelchTest>,
    pub correlation: Outcome<Correlation>,
    pub bootstrap: Outcome<BootstrapResult>,
    pub permutation_test: Outcome<PermutationResult>,
    /// Group-level models of species count.
    pub linear_regression: Outcome<LinearRegressionSummary>,
    pub poisson_regression: Outcome<PoissonRegressionSummary>,
    pub two_way_anova: Outcome<AnovaTable>,
    pub levene_test: Outcome<LeveneResult>,
    pub kruskal_wallis: Outcome<KruskalWallisResult>,
}

impl InferenceReport {
    /// Names of the routines that failed, with the kind of failure.
    pub fn failures(&self) -> Vec<(&'static str, ErrorKind)> {
        [
            ("welch_t_test", self.welch_t_test.failure_kind()),
            ("correlation", self.correlation.failure_kind()),
            ("bootstrap", self.bootstrap.failure_kind()),
            ("permutation_test", self.permutation_test.failure_kind()),
            ("linear_regression", self.linear_regression.failure_kind()),
            ("poisson_regression", self.poisson_regression.failure_kind()),
            ("two_way_anova", self.two_way_anova.failure_kind()),
            ("levene_test", self.levene_test.failure_kind()),
            ("kruskal_wallis", self.kruskal_wallis.failure_kind()),
        ]
        .into_iter()
        .filter_map(|(name, kind)| kind.map(|kind| (name, kind)))
        .collect()
    }
}

/// Runs every routine, recording a failure in place of a result instead of
/// aborting the rest.
///
/// # Errors
///
/// Returns `Config` for an invalid `config`. Failures of individual
/// routines are recorded in the report.
pub fn run_inference(
    merged: &MergedTable,
    groups: &GroupSummaryTable,
    config: &AnalysisConfig,
) -> Result<InferenceReport> {
    config.validate()?;
    let records = merged.records()?;
    let summaries = groups.records()?;
    let acres: Vec<f64> = records.iter().map(|r| r.acres).collect();
    let latitude: Vec<f64> = records.iter().map(|r| r.latitude).collect();
    let level = config.confidence_level;

    tracing::info!(
        "Running inference on {} merged rows and {} groups",
        records.len(),
        summaries.len()
    );

    let report = InferenceReport {
        merged_rows: records.len(),
        groups: summaries.len(),
        confidence_level: level,
        welch_t_test: attempt("Welch t test", || welch_t_test(&acres, &latitude, level)),
        correlation: attempt("Correlation", || {
            pearson_correlation(&acres, &latitude, level)
        }),
        bootstrap: attempt("Bootstrap", || bootstrap(&records, &config.resampling, level)),
        permutation_test: attempt("Permutation test", || {
            permutation_test(
                &acres,
                &latitude,
                &config.resampling,
                config.resampling.permutation_mode,
            )
        }),
        linear_regression: attempt("Linear regression", || linear_regression(&summaries)),
        poisson_regression: attempt("Poisson regression", || poisson_regression(&summaries)),
        two_way_anova: attempt("Two-way ANOVA", || two_way_anova(&summaries)),
        levene_test: attempt("Levene test", || levene_test(&summaries)),
        kruskal_wallis: attempt("Kruskal-Wallis test", || kruskal_wallis(&summaries)),
    };

    let failures = report.failures();
    if !failures.is_empty() {
        tracing::warn!("{} of 9 routines failed", failures.len());
    }
    Ok(report)
}

