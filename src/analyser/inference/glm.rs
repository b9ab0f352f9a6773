//! Poisson regression with a log link, fitted by iteratively reweighted
//! least squares.

use super::design::{Contrast, DesignMatrix, LeastSquaresFit, least_squares};
use super::distributions::normal_two_sided_p;
use super::sample::{mean, require_finite};
use super::types::{Coefficient, GlmResiduals, PoissonRegressionSummary};
use crate::analyser::logic::types::{GroupSummary, columns};
use crate::error::{ParkStatsError, Result};
use statrs::function::gamma::ln_gamma;

#[derive(Clone, Copy, Debug)]
pub struct IrlsConfig {
    pub max_iterations: usize,
    /// Relative change in deviance that counts as converged.
    pub tolerance: f64,
}

impl Default for IrlsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }
}

struct IrlsFit {
    wls: LeastSquaresFit,
    mu: Vec<f64>,
    deviance: f64,
    iterations: usize,
    converged: bool,
}

/// Unit deviance `2 (y ln(y/mu) - (y - mu))`, with `0 ln 0 = 0`.
fn unit_deviance(y: f64, mu: f64) -> f64 {
    let log_term = if y > 0.0 { y * (y / mu).ln() } else { 0.0 };
    2.0 * (log_term - (y - mu))
}

fn deviance(y: &[f64], mu: &[f64]) -> f64 {
    y.iter().zip(mu).map(|(&y, &mu)| unit_deviance(y, mu)).sum()
}

fn log_likelihood(y: &[f64], mu: &[f64]) -> f64 {
    y.iter()
        .zip(mu)
        .map(|(&y, &mu)| y * mu.ln() - mu - ln_gamma(y + 1.0))
        .sum()
}

fn fit_irls(design: &DesignMatrix, aliased: &[bool], y: &[f64], config: IrlsConfig) -> Result<IrlsFit> {
    let mut mu: Vec<f64> = y.iter().map(|y| y + 0.1).collect();
    let mut eta: Vec<f64> = mu.iter().map(|m| m.ln()).collect();
    let mut dev_old = deviance(y, &mu);

    for iteration in 1..=config.max_iterations {
        let z: Vec<f64> = eta
            .iter()
            .zip(y)
            .zip(&mu)
            .map(|((eta, y), mu)| eta + (y - mu) / mu)
            .collect();
        let wls = least_squares(design, aliased, &z, Some(&mu))?;

        eta.clone_from(&wls.fitted);
        mu = eta.iter().map(|e| e.exp()).collect();
        if mu.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(ParkStatsError::Numeric(format!(
                "Poisson regression diverged at iteration {iteration}"
            )));
        }

        let dev = deviance(y, &mu);
        let converged = (dev - dev_old).abs() / (dev.abs() + 0.1) < config.tolerance;
        if converged || iteration == config.max_iterations {
            return Ok(IrlsFit {
                wls,
                mu,
                deviance: dev,
                iterations: iteration,
                converged,
            });
        }
        dev_old = dev;
    }

    Err(ParkStatsError::Numeric(
        "Poisson regression needs at least one IRLS iteration".to_owned(),
    ))
}

/// The Poisson design: intercept, the three park-level means, then park,
/// category and conservation status under treatment contrasts.
fn poisson_design(groups: &[GroupSummary]) -> Result<DesignMatrix> {
    let mut design = DesignMatrix::with_intercept(groups.len());
    let numerics = [
        (columns::MEAN_ACRES, groups.iter().map(|g| g.mean_acres).collect::<Vec<_>>()),
        (columns::MEAN_LATITUDE, groups.iter().map(|g| g.mean_latitude).collect()),
        (columns::MEAN_LONGITUDE, groups.iter().map(|g| g.mean_longitude).collect()),
    ];
    for (name, values) in numerics {
        require_finite(&values, name)?;
        design.add_numeric(name, values);
    }

    let parks: Vec<&str> = groups.iter().map(|g| g.park_name.as_str()).collect();
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    let statuses: Vec<&str> = groups.iter().map(|g| g.conservation_status.as_str()).collect();
    design.add_factor(columns::PARK_NAME, &parks, Contrast::Treatment);
    design.add_factor(columns::CATEGORY, &categories, Contrast::Treatment);
    design.add_factor(columns::CONSERVATION_STATUS, &statuses, Contrast::Treatment);
    Ok(design)
}

/// Poisson regression of species count with [`IrlsConfig::default`].
///
/// # Errors
///
/// See [`poisson_regression_with`].
pub fn poisson_regression(groups: &[GroupSummary]) -> Result<PoissonRegressionSummary> {
    poisson_regression_with(groups, IrlsConfig::default())
}

/// Poisson regression of species count on the park means, park,
/// category and conservation status.
///
/// # Errors
///
/// - [`ParkStatsError::InsufficientData`] with no more groups than
///   estimable coefficients.
/// - [`ParkStatsError::Numeric`] for non-finite covariates, a singular
///   weighted system or a diverging fit.
pub fn poisson_regression_with(
    groups: &[GroupSummary],
    config: IrlsConfig,
) -> Result<PoissonRegressionSummary> {
    let y: Vec<f64> = groups.iter().map(|g| f64::from(g.species_count)).collect();
    let design = poisson_design(groups)?;
    let aliased = design.aliased();
    let n_aliased = aliased.iter().filter(|a| **a).count();
    if n_aliased > 0 {
        tracing::debug!("Poisson regression: {n_aliased} aliased coefficient(s) not estimated");
    }

    let fit = fit_irls(&design, &aliased, &y, config)?;
    if !fit.converged {
        tracing::warn!(
            "Poisson regression did not converge after {} iterations",
            fit.iterations
        );
    }

    let coefficients = design
        .names()
        .into_iter()
        .zip(&fit.wls.coefficients)
        .zip(fit.wls.unscaled_variances())
        .map(|((term, estimate), variance)| match (*estimate, variance) {
            (Some(estimate), Some(variance)) => {
                let std_error = variance.sqrt();
                let statistic = estimate / std_error;
                Ok(Coefficient {
                    term: term.to_owned(),
                    estimate: Some(estimate),
                    std_error: Some(std_error),
                    statistic: Some(statistic),
                    p_value: Some(normal_two_sided_p(statistic)?),
                })
            }
            _ => Ok(Coefficient::aliased(term)),
        })
        .collect::<Result<Vec<_>>>()?;

    let n = y.len();
    let rank = fit.wls.rank();
    let null_mu = vec![mean(&y); n];
    let aic = -2.0 * log_likelihood(&y, &fit.mu) + 2.0 * rank as f64;
    let residuals = glm_residuals(&y, &fit.mu, &fit.wls.hat);

    tracing::debug!(
        "Poisson regression: deviance {:.3} on {} df after {} iteration(s)",
        fit.deviance,
        n - rank,
        fit.iterations
    );

    Ok(PoissonRegressionSummary {
        coefficients,
        deviance: fit.deviance,
        null_deviance: deviance(&y, &null_mu),
        df_residual: n - rank,
        df_null: n - 1,
        aic,
        iterations: fit.iterations,
        converged: fit.converged,
        n,
        fitted: fit.mu,
        residuals,
    })
}

/// Residual diagnostics for a Poisson fit. Studentized residuals are NaN
/// where the leverage is one.
pub fn glm_residuals(y: &[f64], mu: &[f64], hat: &[f64]) -> GlmResiduals {
    let mut residuals = GlmResiduals::default();
    for ((&y, &mu), &h) in y.iter().zip(mu).zip(hat) {
        let raw = y - mu;
        let pearson = raw / mu.sqrt();
        let deviance = unit_deviance(y, mu).max(0.0).sqrt().copysign(raw);
        let studentized = (deviance.powi(2) + h * pearson.powi(2) / (1.0 - h))
            .sqrt()
            .copysign(deviance);

        residuals.response.push(raw);
        residuals.pearson.push(pearson);
        residuals.deviance.push(deviance);
        residuals.hat.push(h);
        residuals
            .studentized
            .push(if studentized.is_finite() { studentized } else { f64::NAN });
    }
    residuals
}
