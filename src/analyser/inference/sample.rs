//! Descriptive helpers and input checks shared by the routines.

use crate::error::{ParkStatsError, Result};
use std::collections::BTreeSet;

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with the `n - 1` denominator.
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0)
}

/// Linear-interpolation quantile (Hyndman & Fan type 7) of sorted data.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let h = last as f64 * p.clamp(0.0, 1.0);
    let lo = (h.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    match (sorted.get(lo), sorted.get(hi)) {
        (Some(below), Some(above)) => below + (h - lo as f64) * (above - below),
        _ => f64::NAN,
    }
}

pub fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sort_values(&mut sorted);
    quantile_sorted(&sorted, 0.5)
}

/// Ranks with ties sharing their average rank, plus the tie sizes.
pub fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut ties = Vec::new();
    let mut start = 0;
    for run in order.chunk_by(|a, b| a.1 == b.1) {
        // positions start..start+len share ranks start+1..=start+len
        let rank = (2 * start + run.len() + 1) as f64 / 2.0;
        for &(idx, _) in run {
            if let Some(slot) = ranks.get_mut(idx) {
                *slot = rank;
            }
        }
        if run.len() > 1 {
            ties.push(run.len());
        }
        start += run.len();
    }
    (ranks, ties)
}

/// Distinct levels of a factor in sorted order.
pub fn factor_levels<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.as_ref().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// # Errors
///
/// [`ParkStatsError::InsufficientData`] when `len < min`.
pub fn require_observations(len: usize, min: usize, what: &str) -> Result<()> {
    if len < min {
        return Err(ParkStatsError::InsufficientData(format!(
            "{what} needs at least {min} observations, found {len}"
        )));
    }
    Ok(())
}

/// Fails unless every value is finite, naming the offending input.
///
/// # Errors
///
/// [`ParkStatsError::Numeric`] at the first NaN or infinite value.
pub fn require_finite(values: &[f64], what: &str) -> Result<()> {
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(ParkStatsError::Numeric(format!(
            "{what} contains a non-finite value at position {pos}"
        )));
    }
    Ok(())
}

/// # Errors
///
/// [`ParkStatsError::DegenerateInput`] when the factor has fewer than two
/// levels.
pub fn require_levels(levels: &[String], factor: &str) -> Result<()> {
    if levels.len() < 2 {
        return Err(ParkStatsError::DegenerateInput(format!(
            "{factor} has {} level(s); at least 2 are needed to test its effect",
            levels.len()
        )));
    }
    Ok(())
}
