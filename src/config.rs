use crate::analyser::inference::PermutationMode;
use crate::error::{ParkStatsError, Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of resamples for bootstrap and permutation routines.
pub const DEFAULT_N_SAMP: usize = 10_000;

/// Repetition count and randomness for the resampling routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplingConfig {
    pub n_samp: usize,
    /// Seed for the routine's generator; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Fan iterations out over the rayon pool. Results do not change.
    pub parallel: bool,
    /// Whether the permutation test keeps its null distribution.
    pub permutation_mode: PermutationMode,
}

impl Default for ResamplingConfig {
    fn default() -> Self {
        Self {
            n_samp: DEFAULT_N_SAMP,
            seed: None,
            parallel: false,
            permutation_mode: PermutationMode::Pure,
        }
    }
}

impl ResamplingConfig {
    pub fn seeded(n_samp: usize, seed: u64) -> Self {
        Self {
            n_samp,
            seed: Some(seed),
            parallel: false,
            permutation_mode: PermutationMode::Pure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Coverage of every reported confidence interval.
    pub confidence_level: f64,
    pub resampling: ResamplingConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            resampling: ResamplingConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// # Errors
    ///
    /// Returns `Config` for a level outside (0, 1) or zero resamples.
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ParkStatsError::Config(format!(
                "confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.resampling.n_samp == 0 {
            return Err(ParkStatsError::Config(
                "resampling.n_samp must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Fails when the file cannot be read or does not hold a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&json)
    }
}
