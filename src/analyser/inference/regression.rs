use super::design::{DesignMatrix, least_squares};
use super::distributions::{f_upper_p, t_two_sided_p};
use super::sample::require_finite;
use super::types::{Coefficient, LinearRegressionSummary};
use crate::analyser::logic::types::{GroupSummary, columns};
use crate::error::{ParkStatsError, Result};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

/// Ordinary least squares of species count on mean acres, mean latitude
/// and mean longitude across the group summaries.
///
/// Point estimates and R² come from `linfa`; the standard errors come from
/// the QR factorisation of the same design.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] with no more groups than
///   estimable coefficients.
/// - [`ParkStatsError::Numeric`] for non-finite predictors, when every
///   predictor is aliased, or for a perfect fit.
pub fn linear_regression(groups: &[GroupSummary]) -> Result<LinearRegressionSummary> {
    let y: Vec<f64> = groups.iter().map(|g| f64::from(g.species_count)).collect();
    let predictors = [
        (columns::MEAN_ACRES, groups.iter().map(|g| g.mean_acres).collect::<Vec<_>>()),
        (columns::MEAN_LATITUDE, groups.iter().map(|g| g.mean_latitude).collect()),
        (columns::MEAN_LONGITUDE, groups.iter().map(|g| g.mean_longitude).collect()),
    ];
    for (name, values) in &predictors {
        require_finite(values, name)?;
    }

    let mut design = DesignMatrix::with_intercept(groups.len());
    for (name, values) in &predictors {
        design.add_numeric(name, values.clone());
    }
    let aliased = design.aliased();
    let fit = least_squares(&design, &aliased, &y, None)?;

    // linfa fits its own intercept, so it only sees the kept predictors.
    let kept_predictors: Vec<&Vec<f64>> = predictors
        .iter()
        .zip(aliased.iter().skip(1))
        .filter_map(|((_, values), &is_aliased)| (!is_aliased).then_some(values))
        .collect();
    if kept_predictors.is_empty() {
        return Err(ParkStatsError::Numeric(
            "linear regression: every predictor is constant or collinear".to_owned(),
        ));
    }
    let n = groups.len();
    let x = Array2::from_shape_fn((n, kept_predictors.len()), |(i, k)| {
        kept_predictors
            .get(k)
            .and_then(|values| values.get(i))
            .copied()
            .unwrap_or(f64::NAN)
    });
    let dataset = Dataset::new(x, Array1::from(y));
    let model = LinearRegression::default()
        .fit(&dataset)
        .map_err(|e| ParkStatsError::Numeric(format!("linear regression failed: {e}")))?;
    let prediction = model.predict(&dataset);
    let r_squared = prediction
        .r2(&dataset)
        .map_err(|e| ParkStatsError::Numeric(format!("linear regression R²: {e}")))?;

    let rank = fit.rank();
    let df_residual = n - rank;
    let rss: f64 = prediction
        .iter()
        .zip(dataset.targets())
        .map(|(p, y)| (y - p).powi(2))
        .sum();
    let sigma2 = rss / df_residual as f64;
    if sigma2 <= 0.0 || !sigma2.is_finite() {
        return Err(ParkStatsError::Numeric(
            "linear regression: residual variance is zero (perfect fit)".to_owned(),
        ));
    }

    let mut slopes = model.params().iter().copied();
    let estimates: Vec<Option<f64>> = std::iter::once(Some(model.intercept()))
        .chain(
            aliased
                .iter()
                .skip(1)
                .map(|&is_aliased| if is_aliased { None } else { slopes.next() }),
        )
        .collect();

    let coefficients = t_tests(
        &design.names(),
        estimates,
        &fit.unscaled_variances(),
        sigma2,
        df_residual as f64,
    )?;

    let df_model = rank - 1;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;
    let f_statistic = (r_squared / df_model as f64) / ((1.0 - r_squared) / df_residual as f64);

    tracing::debug!(
        "Linear regression on {n} groups: R²={r_squared:.4}, F={f_statistic:.3} on {df_model} and {df_residual} df"
    );

    Ok(LinearRegressionSummary {
        coefficients,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_df_model: df_model,
        f_df_residual: df_residual,
        f_p_value: f_upper_p(f_statistic, df_model as f64, df_residual as f64)?,
        residual_std_error: sigma2.sqrt(),
        n,
    })
}

/// t tests of each estimate against zero; aliased terms stay empty.
fn t_tests(
    terms: &[&str],
    estimates: Vec<Option<f64>>,
    unscaled_variances: &[Option<f64>],
    sigma2: f64,
    df_residual: f64,
) -> Result<Vec<Coefficient>> {
    terms
        .iter()
        .zip(estimates)
        .zip(unscaled_variances)
        .map(|((&term, estimate), &variance)| match (estimate, variance) {
            (Some(estimate), Some(variance)) => {
                let std_error = (sigma2 * variance).sqrt();
                let statistic = estimate / std_error;
                Ok(Coefficient {
                    term: term.to_owned(),
                    estimate: Some(estimate),
                    std_error: Some(std_error),
                    statistic: Some(statistic),
                    p_value: Some(t_two_sided_p(statistic, df_residual)?),
                })
            }
            _ => Ok(Coefficient::aliased(term)),
        })
        .collect()
}
