use crate::analyser::inference::parametric::{pearson_correlation, welch_t_test};
use crate::error::ParkStatsError;
use anyhow::Result;
use approx::assert_relative_eq;

#[test]
fn test_welch_reference_values() -> Result<()> {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [2.0, 4.0, 6.0, 8.0, 10.0];
    let test = welch_t_test(&x, &y, 0.95)?;

    assert_relative_eq!(test.statistic, -1.897_367, epsilon = 1e-5);
    assert_relative_eq!(test.df, 5.882_353, epsilon = 1e-5);
    assert_relative_eq!(test.p_value, 0.1075, epsilon = 1e-3);
    assert_relative_eq!(test.estimate, -3.0);
    assert!(test.confidence_interval.contains(0.0));
    assert!(test.confidence_interval.contains(test.estimate));
    Ok(())
}

#[test]
fn test_welch_needs_two_observations_per_sample() {
    let result = welch_t_test(&[1.0], &[1.0, 2.0, 3.0], 0.95);
    assert!(matches!(result, Err(ParkStatsError::InsufficientData(_))));
}

#[test]
fn test_welch_zero_variance_is_numeric_error() {
    let result = welch_t_test(&[3.0, 3.0], &[3.0, 3.0, 3.0], 0.95);
    assert!(matches!(result, Err(ParkStatsError::Numeric(_))));
}

#[test]
fn test_proportional_inputs_correlate_perfectly() -> Result<()> {
    let acres: Vec<f64> = (1..=50).map(|i| f64::from(i) * 1_250.0).collect();
    let latitude: Vec<f64> = acres.iter().map(|a| 0.001 * a).collect();
    let corr = pearson_correlation(&acres, &latitude, 0.95)?;

    assert_relative_eq!(corr.r, 1.0, epsilon = 1e-9);
    assert!(corr.p_value < 1e-10);
    Ok(())
}

#[test]
fn test_pearson_reference_values() -> Result<()> {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [2.0, 1.0, 4.0, 3.0, 5.0];
    let corr = pearson_correlation(&x, &y, 0.95)?;

    assert_relative_eq!(corr.r, 0.8, epsilon = 1e-12);
    assert_relative_eq!(corr.statistic, 2.309_401, epsilon = 1e-5);
    assert_relative_eq!(corr.p_value, 0.1041, epsilon = 1e-3);
    let ci = corr.confidence_interval.expect("n > 3 has an interval");
    assert_relative_eq!(ci.lower, -0.2799, epsilon = 1e-3);
    assert_relative_eq!(ci.upper, 0.9863, epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_three_pairs_have_no_interval() -> Result<()> {
    let corr = pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0], 0.95)?;
    assert!(corr.confidence_interval.is_none());
    Ok(())
}

#[test]
fn test_correlation_input_checks() {
    assert!(matches!(
        pearson_correlation(&[1.0, 2.0], &[2.0, 1.0], 0.95),
        Err(ParkStatsError::InsufficientData(_))
    ));
    assert!(matches!(
        pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 0.95),
        Err(ParkStatsError::Numeric(_))
    ));
    assert!(matches!(
        pearson_correlation(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0], 0.95),
        Err(ParkStatsError::Numeric(_))
    ));
}
