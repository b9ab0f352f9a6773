//! Tests across the category × conservation status cells of the group
//! summaries, with species count as the response.

use super::distributions::{chi2_upper_p, f_upper_p};
use super::sample::{average_ranks, factor_levels, mean, median, require_levels};
use super::types::{KruskalWallisResult, LeveneResult};
use crate::analyser::logic::types::{GroupSummary, columns};
use crate::error::{ParkStatsError, Result};
use std::collections::BTreeMap;

/// Species counts keyed by (category, conservation status).
pub fn cross_cells(groups: &[GroupSummary]) -> BTreeMap<(String, String), Vec<f64>> {
    let mut cells: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for g in groups {
        cells
            .entry((g.category.clone(), g.conservation_status.clone()))
            .or_default()
            .push(f64::from(g.species_count));
    }
    cells
}

/// Both grouping factors need two levels, and the cross at least two cells.
fn require_cells(
    groups: &[GroupSummary],
    cells: &BTreeMap<(String, String), Vec<f64>>,
    what: &str,
) -> Result<()> {
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    let statuses: Vec<&str> = groups.iter().map(|g| g.conservation_status.as_str()).collect();
    require_levels(&factor_levels(&categories), columns::CATEGORY)?;
    require_levels(&factor_levels(&statuses), columns::CONSERVATION_STATUS)?;
    if cells.len() < 2 {
        return Err(ParkStatsError::DegenerateInput(format!(
            "{what} needs at least 2 category × status groups, found {}",
            cells.len()
        )));
    }
    Ok(())
}

/// Brown-Forsythe variant of Levene's test: a one-way ANOVA on absolute
/// deviations from each group's median.
///
/// # Errors
///
/// - [`ParkStatsError::DegenerateInput`] when category or conservation
///   status has fewer than two levels.
/// - [`ParkStatsError::InsufficientData`] with no more observations than
///   cells.
/// - [`ParkStatsError::Numeric`] when every cell has zero spread.
pub fn levene_test(groups: &[GroupSummary]) -> Result<LeveneResult> {
    let cells = cross_cells(groups);
    require_cells(groups, &cells, "Levene test")?;

    let deviations: Vec<Vec<f64>> = cells
        .values()
        .map(|values| {
            let m = median(values);
            values.iter().map(|v| (v - m).abs()).collect()
        })
        .collect();

    let k = deviations.len();
    let n: usize = deviations.iter().map(Vec::len).sum();
    if n <= k {
        return Err(ParkStatsError::InsufficientData(format!(
            "Levene test needs more observations than its {k} groups, found {n}"
        )));
    }

    let grand_mean = deviations.iter().flatten().sum::<f64>() / n as f64;
    let mut between = 0.0;
    let mut within = 0.0;
    for z in &deviations {
        let group_mean = mean(z);
        between += z.len() as f64 * (group_mean - grand_mean).powi(2);
        within += z.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let (df_between, df_within) = (k - 1, n - k);
    let f_statistic = (between / df_between as f64) / (within / df_within as f64);
    if f_statistic.is_nan() {
        return Err(ParkStatsError::Numeric(
            "Levene test: every group has zero spread".to_owned(),
        ));
    }

    Ok(LeveneResult {
        f_statistic,
        df_between,
        df_within,
        p_value: f_upper_p(f_statistic, df_between as f64, df_within as f64)?,
        groups: k,
    })
}

/// Kruskal-Wallis rank sum test with the correction for ties.
///
/// # Errors
///
/// - [`ParkStatsError::DegenerateInput`] when category or conservation
///   status has fewer than two levels.
/// - [`ParkStatsError::Numeric`] when every observation is tied.
pub fn kruskal_wallis(groups: &[GroupSummary]) -> Result<KruskalWallisResult> {
    let cells = cross_cells(groups);
    require_cells(groups, &cells, "Kruskal-Wallis test")?;

    let values: Vec<f64> = cells.values().flatten().copied().collect();
    let (ranks, ties) = average_ranks(&values);
    let n = values.len() as f64;

    let mut cell_ranks = ranks.iter();
    let mut rank_term = 0.0;
    for cell in cells.values() {
        let rank_sum: f64 = cell_ranks.by_ref().take(cell.len()).sum();
        rank_term += rank_sum.powi(2) / cell.len() as f64;
    }
    let h = 12.0 / (n * (n + 1.0)) * rank_term - 3.0 * (n + 1.0);

    let tie_sum: f64 = ties.iter().map(|&t| (t.pow(3) - t) as f64).sum();
    let correction = 1.0 - tie_sum / (n.powi(3) - n);
    if correction <= 0.0 {
        return Err(ParkStatsError::Numeric(
            "Kruskal-Wallis test: every observation is tied".to_owned(),
        ));
    }
    let statistic = h / correction;
    let df = cells.len() - 1;

    Ok(KruskalWallisResult {
        statistic,
        df,
        p_value: chi2_upper_p(statistic, df as f64)?,
        groups: cells.len(),
    })
}
