//! Model matrices with named columns grouped into terms, and the least
//! squares fit shared by the regression, GLM and ANOVA routines.

use super::sample::factor_levels;
use crate::error::{ParkStatsError, Result};
use nalgebra::{DMatrix, DVector};

pub const INTERCEPT: &str = "(Intercept)";

/// Relative norm below which a column counts as a linear combination of
/// the columns before it.
const ALIAS_TOLERANCE: f64 = 1e-7;

/// How a factor is expanded into indicator columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contrast {
    /// One indicator per level except the first (sorted) level.
    Treatment,
    /// Sum-to-zero coding; the last level is coded -1 in every column.
    Sum,
}

#[derive(Clone, Debug)]
struct DesignColumn {
    name: String,
    term: String,
    values: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct DesignMatrix {
    n: usize,
    columns: Vec<DesignColumn>,
}

impl DesignMatrix {
    pub fn with_intercept(n: usize) -> Self {
        Self {
            n,
            columns: vec![DesignColumn {
                name: INTERCEPT.to_owned(),
                term: INTERCEPT.to_owned(),
                values: vec![1.0; n],
            }],
        }
    }

    pub fn rows(&self) -> usize {
        self.n
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn add_numeric(&mut self, name: &str, values: Vec<f64>) {
        self.columns.push(DesignColumn {
            name: name.to_owned(),
            term: name.to_owned(),
            values,
        });
    }

    /// Expands a factor into indicator columns named `{term}{level}` for
    /// treatment coding and `{term}{index}` for sum coding.
    pub fn add_factor<S: AsRef<str>>(&mut self, term: &str, values: &[S], contrast: Contrast) {
        let levels = factor_levels(values);
        let Some((last_level, leading)) = levels.split_last() else {
            return;
        };

        match contrast {
            Contrast::Treatment => {
                for level in levels.iter().skip(1) {
                    self.columns.push(DesignColumn {
                        name: format!("{term}{level}"),
                        term: term.to_owned(),
                        values: values
                            .iter()
                            .map(|v| if v.as_ref() == level { 1.0 } else { 0.0 })
                            .collect(),
                    });
                }
            }
            Contrast::Sum => {
                for (j, level) in leading.iter().enumerate() {
                    self.columns.push(DesignColumn {
                        name: format!("{term}{}", j + 1),
                        term: term.to_owned(),
                        values: values
                            .iter()
                            .map(|v| {
                                let v = v.as_ref();
                                if v == level {
                                    1.0
                                } else if v == last_level {
                                    -1.0
                                } else {
                                    0.0
                                }
                            })
                            .collect(),
                    });
                }
            }
        }
    }

    /// The design with every column of `term` removed.
    pub fn without_term(&self, term: &str) -> Self {
        Self {
            n: self.n,
            columns: self
                .columns
                .iter()
                .filter(|c| c.term != term)
                .cloned()
                .collect(),
        }
    }

    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_iterator(
            self.n,
            self.columns.len(),
            self.columns.iter().flat_map(|c| c.values.iter().copied()),
        )
    }

    /// Flags each column that is linearly dependent on the columns before
    /// it, using modified Gram-Schmidt in column order.
    pub fn aliased(&self) -> Vec<bool> {
        let mut basis: Vec<DVector<f64>> = Vec::new();
        self.columns
            .iter()
            .map(|c| {
                let original = DVector::from_column_slice(&c.values);
                let norm = original.norm();
                let mut v = original;
                for q in &basis {
                    let projection = q.dot(&v);
                    v -= q * projection;
                }
                let residual = v.norm();
                if norm == 0.0 || residual <= ALIAS_TOLERANCE * norm {
                    true
                } else {
                    basis.push(v / residual);
                    false
                }
            })
            .collect()
    }
}

/// Weighted least squares over the non-aliased columns of a design.
#[derive(Clone, Debug)]
pub struct LeastSquaresFit {
    /// Per design column; `None` for aliased columns.
    pub coefficients: Vec<Option<f64>>,
    /// Unscaled covariance `(X'WX)^-1` over the kept columns.
    pub unscaled_covariance: DMatrix<f64>,
    pub kept: Vec<usize>,
    pub fitted: Vec<f64>,
    /// Leverages of the weighted fit.
    pub hat: Vec<f64>,
    pub rss: f64,
}

impl LeastSquaresFit {
    pub fn rank(&self) -> usize {
        self.kept.len()
    }

    /// Unscaled variance of each design column's coefficient.
    pub fn unscaled_variances(&self) -> Vec<Option<f64>> {
        let mut out = vec![None; self.coefficients.len()];
        for (&j, &variance) in self.kept.iter().zip(self.unscaled_covariance.diagonal().iter()) {
            if let Some(slot) = out.get_mut(j) {
                *slot = Some(variance);
            }
        }
        out
    }
}

/// Solves `min ||W^½ (y - X b)||` by QR on the kept columns.
///
/// # Errors
///
/// - [`ParkStatsError::Numeric`] when every column is aliased, the inputs
///   disagree in length, or the kept columns are singular.
/// - [`ParkStatsError::InsufficientData`] when there are no more
///   observations than kept columns.
pub fn least_squares(
    design: &DesignMatrix,
    aliased: &[bool],
    y: &[f64],
    weights: Option<&[f64]>,
) -> Result<LeastSquaresFit> {
    let n = design.rows();
    let kept: Vec<usize> = aliased
        .iter()
        .enumerate()
        .filter_map(|(j, &is_aliased)| (!is_aliased).then_some(j))
        .collect();
    if kept.is_empty() {
        return Err(ParkStatsError::Numeric(
            "every design column is aliased".to_owned(),
        ));
    }
    if n <= kept.len() {
        return Err(ParkStatsError::InsufficientData(format!(
            "model with {} estimable coefficients needs more than {} observations",
            kept.len(),
            n
        )));
    }

    let w: Vec<f64> = weights.map_or_else(|| vec![1.0; n], <[f64]>::to_vec);
    if y.len() != n || w.len() != n {
        return Err(ParkStatsError::Numeric(format!(
            "least squares: design has {n} rows but got {} responses and {} weights",
            y.len(),
            w.len()
        )));
    }

    let x = design.to_matrix().select_columns(&kept);
    let sqrt_w: Vec<f64> = w.iter().map(|w| w.sqrt()).collect();
    let mut xw = x.clone();
    for (mut row, scale) in xw.row_iter_mut().zip(&sqrt_w) {
        row *= *scale;
    }
    let yw = DVector::from_iterator(n, y.iter().zip(&sqrt_w).map(|(y, s)| y * s));

    let qr = xw.qr();
    let q = qr.q();
    let r = qr.r();
    let singular = || ParkStatsError::Numeric("design matrix is singular".to_owned());

    let beta = r
        .solve_upper_triangular(&(q.transpose() * &yw))
        .ok_or_else(singular)?;
    let r_inv = r.try_inverse().ok_or_else(singular)?;
    let unscaled_covariance = &r_inv * r_inv.transpose();
    if unscaled_covariance.iter().any(|v| !v.is_finite()) {
        return Err(singular());
    }

    let mut coefficients = vec![None; aliased.len()];
    for (&j, &b) in kept.iter().zip(beta.iter()) {
        if let Some(slot) = coefficients.get_mut(j) {
            *slot = Some(b);
        }
    }

    let fitted: Vec<f64> = (&x * &beta).iter().copied().collect();
    let rss = y
        .iter()
        .zip(&fitted)
        .zip(&w)
        .map(|((y, f), w)| w * (y - f).powi(2))
        .sum();
    let hat = q.row_iter().map(|row| row.norm_squared()).collect();

    Ok(LeastSquaresFit {
        coefficients,
        unscaled_covariance,
        kept,
        fitted,
        hat,
        rss,
    })
}
