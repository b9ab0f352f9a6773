use super::design::{Contrast, DesignMatrix, INTERCEPT, least_squares};
use super::distributions::f_upper_p;
use super::sample::{factor_levels, require_levels};
use super::types::{AnovaRow, AnovaTable};
use crate::analyser::logic::types::{GroupSummary, columns};
use crate::error::{ParkStatsError, Result};

pub const RESIDUALS: &str = "Residuals";

/// Additive two-way ANOVA of species count by category and conservation
/// status, with Type III sums of squares under sum-to-zero contrasts.
///
/// Each term's sum of squares is the increase in residual sum of squares
/// when that term alone is dropped from the full model.
///
/// # Errors
///
/// - [`ParkStatsError::DegenerateInput`] when either factor has fewer than
///   two levels.
/// - [`ParkStatsError::InsufficientData`] with no more groups than
///   estimable coefficients.
/// - [`ParkStatsError::Numeric`] when the residual sum of squares is zero.
pub fn two_way_anova(groups: &[GroupSummary]) -> Result<AnovaTable> {
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    let statuses: Vec<&str> = groups.iter().map(|g| g.conservation_status.as_str()).collect();
    require_levels(&factor_levels(&categories), columns::CATEGORY)?;
    require_levels(&factor_levels(&statuses), columns::CONSERVATION_STATUS)?;

    let y: Vec<f64> = groups.iter().map(|g| f64::from(g.species_count)).collect();
    let mut design = DesignMatrix::with_intercept(groups.len());
    design.add_factor(columns::CATEGORY, &categories, Contrast::Sum);
    design.add_factor(columns::CONSERVATION_STATUS, &statuses, Contrast::Sum);

    let full = least_squares(&design, &design.aliased(), &y, None)?;
    let df_residual = groups.len() - full.rank();
    if full.rss <= f64::EPSILON * y.iter().map(|v| v * v).sum::<f64>() {
        return Err(ParkStatsError::Numeric(
            "ANOVA: residual sum of squares is zero, F statistics are undefined".to_owned(),
        ));
    }
    let mean_square_residual = full.rss / df_residual as f64;

    let mut rows = Vec::with_capacity(4);
    for term in [INTERCEPT, columns::CATEGORY, columns::CONSERVATION_STATUS] {
        let reduced_design = design.without_term(term);
        let reduced = least_squares(&reduced_design, &reduced_design.aliased(), &y, None)?;
        let df = full.rank() - reduced.rank();
        let sum_sq = (reduced.rss - full.rss).max(0.0);
        let (f_statistic, p_value) = if df == 0 {
            (None, None)
        } else {
            let f = (sum_sq / df as f64) / mean_square_residual;
            (Some(f), Some(f_upper_p(f, df as f64, df_residual as f64)?))
        };
        rows.push(AnovaRow {
            term: term.to_owned(),
            sum_sq,
            df,
            f_statistic,
            p_value,
        });
    }
    rows.push(AnovaRow {
        term: RESIDUALS.to_owned(),
        sum_sq: full.rss,
        df: df_residual,
        f_statistic: None,
        p_value: None,
    });

    tracing::debug!("Two-way ANOVA over {} groups, {df_residual} residual df", groups.len());
    Ok(AnovaTable { rows })
}
