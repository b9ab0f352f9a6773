//! Statistical routines over the merged table and the group summaries.
//!
//! Every routine is stateless and returns a serializable result record.
//! [`run_inference`] runs them all and records failures per routine.

pub mod anova;
pub mod design;
pub mod distributions;
pub mod glm;
pub mod groups;
pub mod parametric;
pub mod regression;
pub mod report;
pub mod resampling;
pub mod sample;
pub mod types;

pub use anova::two_way_anova;
pub use glm::{IrlsConfig, glm_residuals, poisson_regression, poisson_regression_with};
pub use groups::{kruskal_wallis, levene_test};
pub use parametric::{pearson_correlation, welch_t_test};
pub use regression::linear_regression;
pub use report::{InferenceReport, Outcome, run_inference};
pub use resampling::{
    bootstrap, bootstrap_pairs_with_rng, bootstrap_with_rng, permutation_test,
    permutation_test_with_rng,
};
pub use types::{
    AnovaRow, AnovaTable, BootstrapResult, Coefficient, ConfidenceInterval, Correlation,
    GlmResiduals, KruskalWallisResult, LeveneResult, LinearRegressionSummary, PermutationMode,
    PermutationResult, PoissonRegressionSummary, WelchTest, find_coefficient,
};

#[cfg(test)]
mod tests;
