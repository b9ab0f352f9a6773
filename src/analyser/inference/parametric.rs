use super::distributions::{normal_quantile, t_quantile, t_two_sided_p};
use super::sample::{mean, require_finite, require_observations, variance};
use super::types::{ConfidenceInterval, Correlation, WelchTest};
use crate::error::{ParkStatsError, Result};

/// Welch t statistic and its Satterthwaite degrees of freedom.
///
/// Non-finite when both samples have zero variance.
pub fn welch_statistic(x: &[f64], y: &[f64]) -> (f64, f64) {
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let (vx, vy) = (variance(x) / nx, variance(y) / ny);
    let se2 = vx + vy;
    let t = (mean(x) - mean(y)) / se2.sqrt();
    let df = se2.powi(2) / (vx.powi(2) / (nx - 1.0) + vy.powi(2) / (ny - 1.0));
    (t, df)
}

/// Two-sample t test without assuming equal variances.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] when either sample has fewer than
///   two observations.
/// - [`ParkStatsError::Numeric`] for non-finite input or when both samples
///   have zero variance.
pub fn welch_t_test(x: &[f64], y: &[f64], confidence: f64) -> Result<WelchTest> {
    require_observations(x.len(), 2, "Welch test (first sample)")?;
    require_observations(y.len(), 2, "Welch test (second sample)")?;
    require_finite(x, "Welch test (first sample)")?;
    require_finite(y, "Welch test (second sample)")?;

    let (statistic, df) = welch_statistic(x, y);
    if !statistic.is_finite() || !df.is_finite() {
        return Err(ParkStatsError::Numeric(
            "Welch test: both samples have zero variance".to_owned(),
        ));
    }

    let (mean_x, mean_y) = (mean(x), mean(y));
    let estimate = mean_x - mean_y;
    let se = (variance(x) / x.len() as f64 + variance(y) / y.len() as f64).sqrt();
    let margin = t_quantile(0.5 + confidence / 2.0, df)? * se;

    Ok(WelchTest {
        statistic,
        df,
        p_value: t_two_sided_p(statistic, df)?,
        mean_x,
        mean_y,
        estimate,
        confidence_interval: ConfidenceInterval {
            level: confidence,
            lower: estimate - margin,
            upper: estimate + margin,
        },
        n_x: x.len(),
        n_y: y.len(),
    })
}

/// Pearson's r; NaN when either input has zero variance.
pub fn correlation_coefficient(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Pearson correlation with its t test and Fisher-z confidence interval.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] for unpaired input or fewer than
///   three pairs.
/// - [`ParkStatsError::Numeric`] for non-finite input or a zero-variance
///   sample.
pub fn pearson_correlation(x: &[f64], y: &[f64], confidence: f64) -> Result<Correlation> {
    if x.len() != y.len() {
        return Err(ParkStatsError::InsufficientData(format!(
            "correlation needs paired observations, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    require_observations(x.len(), 3, "correlation")?;
    require_finite(x, "correlation (x)")?;
    require_finite(y, "correlation (y)")?;

    let r = correlation_coefficient(x, y);
    if r.is_nan() {
        return Err(ParkStatsError::Numeric(
            "correlation is undefined for a zero-variance input".to_owned(),
        ));
    }

    let n = x.len();
    let df = (n - 2) as f64;
    let statistic = if 1.0 - r * r <= 0.0 {
        f64::INFINITY.copysign(r)
    } else {
        r * (df / (1.0 - r * r)).sqrt()
    };

    let confidence_interval = if n > 3 {
        let z = r.atanh();
        let margin = normal_quantile(0.5 + confidence / 2.0)? / ((n - 3) as f64).sqrt();
        Some(ConfidenceInterval {
            level: confidence,
            lower: (z - margin).tanh(),
            upper: (z + margin).tanh(),
        })
    } else {
        None
    };

    Ok(Correlation {
        r,
        statistic,
        df,
        p_value: t_two_sided_p(statistic, df)?,
        n,
        confidence_interval,
    })
}
