//! Forecast Trajectory Generator.
//!
//! Compounds the baseline forward with one blended growth rate for the
//! whole horizon. Each year's value is rounded before the next year
//! compounds on it.
//!
//! Every point carries a band that widens by 3% a year and a confidence
//! that drops by 8 points a year, bottoming out at 50.

use bidmetric_common::util::round_to;

use crate::baseline::MAX_REPORTABLE_VALUE;
use crate::error::{Result, ValuationError};
use crate::growth::{MAX_GROWTH_RATE, MIN_GROWTH_RATE};
use crate::types::ForecastPoint;

/// Largest accepted forecast horizon.
pub const MAX_HORIZON_YEARS: u32 = 20;

/// Band widening per forecast year, as a fraction of the expected value.
const BAND_WIDENING_PER_YEAR: f64 = 0.03;

const CONFIDENCE_DECAY_PER_YEAR: u32 = 8;
const MIN_CONFIDENCE_PCT: u32 = 50;

/// Uncertainty band `(low, high)` around a value `years_out` years ahead.
///
/// `low = value / (1 + 0.03 * years)` and `high = value * (1 + 0.03 * years)`.
pub fn band(value: u64, years_out: u32) -> Result<(u64, u64)> {
    let factor = 1.0 + BAND_WIDENING_PER_YEAR * f64::from(years_out);
    let value = value as f64;

    let low = (value / factor).round();
    let high = (value * factor).round();
    if !high.is_finite() || high > MAX_REPORTABLE_VALUE {
        return Err(ValuationError::InternalComputation(format!(
            "forecast band of {value} overflowed {years_out} years out"
        )));
    }

    Ok((low.min(value) as u64, high.max(value) as u64))
}

/// Confidence in an estimate `years_out` years ahead, in percent.
pub fn confidence_pct(years_out: u32) -> u8 {
    let decay = years_out.saturating_mul(CONFIDENCE_DECAY_PER_YEAR);
    100u32.saturating_sub(decay).max(MIN_CONFIDENCE_PCT) as u8
}

/// Project `baseline` forward for `horizon_years` years after `start_year`.
pub fn project(
    baseline: u64,
    effective_growth_rate: f64,
    horizon_years: u32,
    start_year: i32,
) -> Result<Vec<ForecastPoint>> {
    if !(1..=MAX_HORIZON_YEARS).contains(&horizon_years) {
        return Err(ValuationError::Validation(format!(
            "forecast_horizon_years must be between 1 and {MAX_HORIZON_YEARS}, got {horizon_years}"
        )));
    }
    if effective_growth_rate.is_nan() {
        return Err(ValuationError::InternalComputation(
            "effective growth rate is NaN".to_string(),
        ));
    }

    let rate = effective_growth_rate.clamp(MIN_GROWTH_RATE, MAX_GROWTH_RATE);
    let yoy_growth_pct = round_to(rate * 100.0, 1);

    let mut trajectory = Vec::with_capacity(horizon_years as usize);
    let mut value = baseline as f64;

    for i in 1..=horizon_years {
        value = (value * (1.0 + rate)).round();
        if !value.is_finite() || value > MAX_REPORTABLE_VALUE {
            return Err(ValuationError::InternalComputation(format!(
                "forecast value overflowed in year {i} (baseline {baseline}, rate {rate})"
            )));
        }

        let expected_value = value as u64;
        let (low_estimate, high_estimate) = band(expected_value, i)?;

        trajectory.push(ForecastPoint {
            year: start_year + i as i32,
            expected_value,
            yoy_growth_pct,
            low_estimate,
            high_estimate,
            confidence_pct: confidence_pct(i),
        });
    }

    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mira_road_five_years() {
        let trajectory = project(8_500_000, 0.059, 5, 2026).unwrap();

        assert_eq!(trajectory.len(), 5);
        assert_eq!(trajectory[0].year, 2027);
        assert_eq!(trajectory[4].year, 2031);
        assert_eq!(trajectory[0].expected_value, 9_001_500);
        assert_eq!(
            trajectory[1].expected_value,
            (9_001_500.0_f64 * 1.059).round() as u64
        );
        assert!(trajectory.iter().all(|p| p.yoy_growth_pct == 5.9));
    }

    #[test]
    fn test_years_are_consecutive() {
        let trajectory = project(1_000_000, 0.045, 20, 2030).unwrap();
        assert_eq!(trajectory.len(), 20);
        for pair in trajectory.windows(2) {
            assert_eq!(pair[1].year, pair[0].year + 1);
            assert!(pair[1].expected_value >= pair[0].expected_value);
        }
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(project(1_000_000, 0.05, 0, 2026).unwrap_err().is_validation());
        assert!(project(1_000_000, 0.05, 21, 2026).unwrap_err().is_validation());
        assert_eq!(project(1_000_000, 0.05, 1, 2026).unwrap().len(), 1);
    }

    #[test]
    fn test_rate_is_clamped() {
        let trajectory = project(1_000_000, 0.4, 1, 2026).unwrap();
        assert_eq!(trajectory[0].expected_value, 1_150_000);
        assert_eq!(trajectory[0].yoy_growth_pct, 15.0);

        let flat = project(1_000_000, -0.1, 3, 2026).unwrap();
        assert!(flat.iter().all(|p| p.expected_value == 1_000_000));
    }

    #[test]
    fn test_bands_widen_each_year() {
        let trajectory = project(8_500_000, 0.059, 5, 2026).unwrap();

        let first = &trajectory[0];
        assert_eq!(first.low_estimate, (9_001_500.0_f64 / 1.03).round() as u64);
        assert_eq!(first.high_estimate, (9_001_500.0_f64 * 1.03).round() as u64);
        assert_eq!(first.confidence_pct, 92);

        for pair in trajectory.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.high_estimate - b.expected_value > a.high_estimate - a.expected_value);
            assert!(b.confidence_pct < a.confidence_pct);
        }
        for point in &trajectory {
            assert!(point.low_estimate <= point.expected_value);
            assert!(point.expected_value <= point.high_estimate);
        }
    }

    #[test]
    fn test_confidence_floor() {
        assert_eq!(confidence_pct(0), 100);
        assert_eq!(confidence_pct(5), 60);
        assert_eq!(confidence_pct(7), 50);
        assert_eq!(confidence_pct(20), 50);
    }

    #[test]
    fn test_band_of_zero_value() {
        assert_eq!(band(0, 10).unwrap(), (0, 0));
    }

    #[test]
    fn test_band_overflow_is_internal_error() {
        let near_limit = MAX_REPORTABLE_VALUE as u64 - 1;
        let err = band(near_limit, 3).unwrap_err();
        assert!(matches!(err, ValuationError::InternalComputation(_)));
    }

    #[test]
    fn test_nan_rate_is_internal_error() {
        let err = project(1_000_000, f64::NAN, 5, 2026).unwrap_err();
        assert!(matches!(err, ValuationError::InternalComputation(_)));
    }
}
