//! Bootstrap and permutation inference.
//!
//! Both loops take their randomness from a generator passed in by the
//! caller. The generator draws one seed per iteration and every iteration
//! runs on its own [`StdRng`] built from that seed, so iterations are
//! independent of each other and of the order they run in. That is what
//! lets `parallel` fan them out over rayon without changing the result.

use super::parametric::{correlation_coefficient, welch_statistic};
use super::sample::{mean, quantile_sorted, require_finite, require_observations, sort_values};
use super::types::{BootstrapResult, ConfidenceInterval, PermutationMode, PermutationResult};
use crate::analyser::logic::types::MergedRecord;
use crate::config::ResamplingConfig;
use crate::error::{ParkStatsError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng, RngCore, SeedableRng as _};
use rayon::prelude::*;

/// Tolerance when comparing a permuted |r| with the observed |r|, so that
/// rounding in the summation order does not make ties look less extreme.
const EXTREMITY_TOLERANCE: f64 = 1e-12;

/// Generator for one routine invocation.
pub fn routine_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_iterations<T, F>(seeds: &[u64], parallel: bool, iteration: F) -> Vec<T>
where
    T: Send,
    F: Fn(&mut StdRng) -> T + Sync + Send,
{
    let run = |&seed: &u64| iteration(&mut StdRng::seed_from_u64(seed));
    if parallel {
        seeds.par_iter().map(run).collect()
    } else {
        seeds.iter().map(run).collect()
    }
}

fn draw_seeds<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> Vec<u64> {
    (0..n).map(|_| rng.next_u64()).collect()
}

/// Percentile interval of the finite values, or `None` if there are none.
fn percentile_interval(values: &mut Vec<f64>, level: f64) -> Option<ConfidenceInterval> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    sort_values(values);
    let tail = (1.0 - level) / 2.0;
    Some(ConfidenceInterval {
        level,
        lower: quantile_sorted(values, tail),
        upper: quantile_sorted(values, 1.0 - tail),
    })
}

/// Bootstrap intervals for the Welch statistic and the correlation of
/// acreage against latitude.
///
/// # Errors
///
/// See [`bootstrap_pairs_with_rng`].
pub fn bootstrap(
    records: &[MergedRecord],
    config: &ResamplingConfig,
    level: f64,
) -> Result<BootstrapResult> {
    let mut rng = routine_rng(config.seed);
    bootstrap_with_rng(records, config.n_samp, config.parallel, level, &mut rng)
}

/// [`bootstrap`] driven by a caller-supplied generator.
///
/// # Errors
///
/// See [`bootstrap_pairs_with_rng`].
pub fn bootstrap_with_rng<R: Rng + ?Sized>(
    records: &[MergedRecord],
    n_samp: usize,
    parallel: bool,
    level: f64,
    rng: &mut R,
) -> Result<BootstrapResult> {
    let acres: Vec<f64> = records.iter().map(|r| r.acres).collect();
    let latitude: Vec<f64> = records.iter().map(|r| r.latitude).collect();
    bootstrap_pairs_with_rng(&acres, &latitude, n_samp, parallel, level, rng)
}

/// Resamples rows `(x[i], y[i])` with replacement and recomputes the Welch
/// statistic of x against y and their correlation.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] for unpaired input, fewer than two
///   pairs or zero resamples.
/// - [`ParkStatsError::Numeric`] for non-finite input, or when no resample
///   yields finite statistics.
pub fn bootstrap_pairs_with_rng<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    n_samp: usize,
    parallel: bool,
    level: f64,
    rng: &mut R,
) -> Result<BootstrapResult> {
    if x.len() != y.len() {
        return Err(ParkStatsError::InsufficientData(format!(
            "bootstrap needs paired observations, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    require_observations(n, 2, "bootstrap")?;
    require_observations(n_samp, 1, "bootstrap resamples")?;
    require_finite(x, "bootstrap (x)")?;
    require_finite(y, "bootstrap (y)")?;

    let (observed_t, _) = welch_statistic(x, y);
    let observed_r = correlation_coefficient(x, y);

    let seeds = draw_seeds(rng, n_samp);
    let statistics = run_iterations(&seeds, parallel, |local| {
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            let i = local.gen_range(0..n);
            if let (Some(&a), Some(&b)) = (x.get(i), y.get(i)) {
                xs.push(a);
                ys.push(b);
            }
        }
        (welch_statistic(&xs, &ys).0, correlation_coefficient(&xs, &ys))
    });

    let degenerate_resamples = statistics
        .iter()
        .filter(|(t, r)| !t.is_finite() || !r.is_finite())
        .count();
    let (mut t_values, mut r_values): (Vec<f64>, Vec<f64>) = statistics
        .into_iter()
        .filter(|(t, r)| t.is_finite() && r.is_finite())
        .unzip();

    let no_finite = || {
        ParkStatsError::Numeric(format!(
            "bootstrap: none of the {n_samp} resamples produced finite statistics"
        ))
    };
    let t_interval = percentile_interval(&mut t_values, level).ok_or_else(no_finite)?;
    let r_interval = percentile_interval(&mut r_values, level).ok_or_else(no_finite)?;

    if degenerate_resamples > 0 {
        tracing::debug!("bootstrap: skipped {degenerate_resamples} degenerate resample(s)");
    }

    Ok(BootstrapResult {
        n_samp,
        sample_size: n,
        observed_t,
        observed_r,
        t_interval,
        r_interval,
        degenerate_resamples,
    })
}

/// Two-sided permutation test of the correlation between `x` and `y`.
///
/// # Errors
///
/// See [`permutation_test_with_rng`].
pub fn permutation_test(
    x: &[f64],
    y: &[f64],
    config: &ResamplingConfig,
    mode: PermutationMode,
) -> Result<PermutationResult> {
    let mut rng = routine_rng(config.seed);
    permutation_test_with_rng(x, y, config.n_samp, config.parallel, mode, &mut rng)
}

/// [`permutation_test`] driven by a caller-supplied generator.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] for unpaired input, fewer than two
///   pairs or zero resamples.
/// - [`ParkStatsError::Numeric`] for non-finite or zero-variance input.
pub fn permutation_test_with_rng<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    n_samp: usize,
    parallel: bool,
    mode: PermutationMode,
    rng: &mut R,
) -> Result<PermutationResult> {
    if x.len() != y.len() {
        return Err(ParkStatsError::InsufficientData(format!(
            "permutation test needs paired observations, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    require_observations(x.len(), 2, "permutation test")?;
    require_observations(n_samp, 1, "permutation test resamples")?;
    require_finite(x, "permutation test (x)")?;
    require_finite(y, "permutation test (y)")?;

    let observed_r = correlation_coefficient(x, y);
    if observed_r.is_nan() {
        return Err(ParkStatsError::Numeric(
            "permutation test: correlation is undefined for a zero-variance input".to_owned(),
        ));
    }

    let seeds = draw_seeds(rng, n_samp);
    let permuted = run_iterations(&seeds, parallel, |local| {
        let mut shuffled = y.to_vec();
        shuffled.shuffle(local);
        correlation_coefficient(x, &shuffled)
    });

    let threshold = observed_r.abs() - EXTREMITY_TOLERANCE;
    let as_extreme = permuted.iter().filter(|r| r.abs() >= threshold).count();
    let p_value = as_extreme as f64 / n_samp as f64;

    let null_distribution = match mode {
        PermutationMode::Pure => None,
        PermutationMode::Display => {
            let mut sorted = permuted.clone();
            sort_values(&mut sorted);
            tracing::info!(
                "Permutation null distribution: n={n_samp}, mean={:.4}, 2.5%={:.4}, 97.5%={:.4}, observed r={observed_r:.4}, p={p_value:.4}",
                mean(&sorted),
                quantile_sorted(&sorted, 0.025),
                quantile_sorted(&sorted, 0.975),
            );
            Some(permuted)
        }
    };

    Ok(PermutationResult {
        observed_r,
        p_value,
        n_samp,
        as_extreme,
        null_distribution,
    })
}
