//! Tail probabilities and quantiles of the reference distributions.
//!
//! Thin wrappers over `statrs` that map construction failures (for example
//! zero degrees of freedom) to [`ParkStatsError::Numeric`] and treat
//! infinite statistics as infinitely extreme.
//!
//! Every function here fails with [`ParkStatsError::Numeric`] when the
//! distribution cannot be built or the statistic is NaN.

use crate::error::{ParkStatsError, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF as _, FisherSnedecor, Normal, StudentsT};

fn numeric<E: std::fmt::Display>(what: &str) -> impl FnOnce(E) -> ParkStatsError + '_ {
    move |e| ParkStatsError::Numeric(format!("{what}: {e}"))
}

fn students_t(df: f64) -> Result<StudentsT> {
    StudentsT::new(0.0, 1.0, df).map_err(numeric("Student's t"))
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(numeric("Normal"))
}

/// Two-sided p-value of a t statistic.
///
/// # Errors
///
/// [`ParkStatsError::Numeric`] for a NaN statistic or invalid degrees of
/// freedom.
pub fn t_two_sided_p(t: f64, df: f64) -> Result<f64> {
    if t.is_nan() {
        return Err(ParkStatsError::Numeric("t statistic is NaN".to_owned()));
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    Ok((2.0 * students_t(df)?.sf(t.abs())).min(1.0))
}

/// # Errors
///
/// [`ParkStatsError::Numeric`] for invalid degrees of freedom.
pub fn t_quantile(p: f64, df: f64) -> Result<f64> {
    Ok(students_t(df)?.inverse_cdf(p))
}

/// Upper-tail p-value of an F statistic.
///
/// # Errors
///
/// [`ParkStatsError::Numeric`] for a NaN statistic or invalid degrees of
/// freedom.
pub fn f_upper_p(f: f64, df1: f64, df2: f64) -> Result<f64> {
    if f.is_nan() {
        return Err(ParkStatsError::Numeric("F statistic is NaN".to_owned()));
    }
    if f.is_infinite() {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(df1, df2).map_err(numeric("F distribution"))?;
    Ok(dist.sf(f.max(0.0)))
}

/// Upper-tail p-value of a chi-squared statistic.
///
/// # Errors
///
/// [`ParkStatsError::Numeric`] for a NaN statistic or invalid degrees of
/// freedom.
pub fn chi2_upper_p(x: f64, df: f64) -> Result<f64> {
    if x.is_nan() {
        return Err(ParkStatsError::Numeric(
            "chi-squared statistic is NaN".to_owned(),
        ));
    }
    if x.is_infinite() {
        return Ok(0.0);
    }
    let dist = ChiSquared::new(df).map_err(numeric("chi-squared distribution"))?;
    Ok(dist.sf(x.max(0.0)))
}

/// Two-sided p-value of a standard normal statistic.
///
/// # Errors
///
/// [`ParkStatsError::Numeric`] for a NaN statistic.
pub fn normal_two_sided_p(z: f64) -> Result<f64> {
    if z.is_nan() {
        return Err(ParkStatsError::Numeric("z statistic is NaN".to_owned()));
    }
    if z.is_infinite() {
        return Ok(0.0);
    }
    Ok((2.0 * standard_normal()?.sf(z.abs())).min(1.0))
}

/// # Errors
///
/// [`ParkStatsError::Numeric`] if the standard normal cannot be built.
pub fn normal_quantile(p: f64) -> Result<f64> {
    Ok(standard_normal()?.inverse_cdf(p))
}
