use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Welch two-sample test of the difference in means.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    /// `mean_x - mean_y`
    pub estimate: f64,
    pub confidence_interval: ConfidenceInterval,
    pub n_x: usize,
    pub n_y: usize,
}

/// Pearson product-moment correlation and its t test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub r: f64,
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
    pub n: usize,
    /// Fisher-z interval, absent below four pairs.
    pub confidence_interval: Option<ConfidenceInterval>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub n_samp: usize,
    pub sample_size: usize,
    pub observed_t: f64,
    pub observed_r: f64,
    pub t_interval: ConfidenceInterval,
    pub r_interval: ConfidenceInterval,
    /// Resamples whose statistics were not finite (for example a resample
    /// drawing one row repeatedly) and were left out of the percentiles.
    pub degenerate_resamples: usize,
}

/// How much of the permutation null distribution to hand back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermutationMode {
    /// Only the p-value and the observed statistic.
    #[default]
    Pure,
    /// Also keep every permuted correlation for a plotting layer.
    Display,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    pub observed_r: f64,
    pub p_value: f64,
    pub n_samp: usize,
    /// Permutations with |r| at least as large as the observed |r|.
    pub as_extreme: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_distribution: Option<Vec<f64>>,
}

/// One row of a coefficient table. Aliased terms carry no estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: Option<f64>,
    pub std_error: Option<f64>,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

impl Coefficient {
    pub fn aliased(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            estimate: None,
            std_error: None,
            statistic: None,
            p_value: None,
        }
    }

    pub fn is_aliased(&self) -> bool {
        self.estimate.is_none()
    }
}

pub fn find_coefficient<'a>(coefficients: &'a [Coefficient], term: &str) -> Option<&'a Coefficient> {
    coefficients.iter().find(|c| c.term == term)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionSummary {
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_df_model: usize,
    pub f_df_residual: usize,
    pub f_p_value: f64,
    pub residual_std_error: f64,
    pub n: usize,
}

/// Residual diagnostics of a fitted GLM, one entry per observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlmResiduals {
    pub response: Vec<f64>,
    pub pearson: Vec<f64>,
    pub deviance: Vec<f64>,
    pub hat: Vec<f64>,
    pub studentized: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoissonRegressionSummary {
    pub coefficients: Vec<Coefficient>,
    pub deviance: f64,
    pub null_deviance: f64,
    pub df_residual: usize,
    pub df_null: usize,
    pub aic: f64,
    pub iterations: usize,
    pub converged: bool,
    pub n: usize,
    pub fitted: Vec<f64>,
    pub residuals: GlmResiduals,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub term: String,
    pub sum_sq: f64,
    pub df: usize,
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Type III ANOVA table; the last row holds the residuals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    pub rows: Vec<AnovaRow>,
}

impl AnovaTable {
    pub fn row(&self, term: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == term)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeveneResult {
    pub f_statistic: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub p_value: f64,
    pub groups: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KruskalWallisResult {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
    pub groups: usize,
}
