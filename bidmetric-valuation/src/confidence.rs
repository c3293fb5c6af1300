//! Confidence Interval Estimator.
//!
//! Spread around the baseline depends on the locality's volatility class and
//! widens when the growth estimate rests on too few historical samples.

use crate::types::{ConfidenceInterval, VolatilityClass};

/// Extra spread per missing historical sample.
const SPREAD_PER_MISSING_SAMPLE: f64 = 0.01;

/// Cap on the extra spread from missing samples.
const MAX_EXTRA_SPREAD: f64 = 0.05;

/// Base half-width of the interval, as a fraction of the baseline.
pub fn base_spread(volatility: VolatilityClass) -> f64 {
    match volatility {
        VolatilityClass::Low => 0.02,
        VolatilityClass::Medium => 0.04,
        VolatilityClass::High => 0.07,
    }
}

/// Total half-width for a volatility class and sample count.
pub fn spread(volatility: VolatilityClass, sample_size: usize, min_samples: usize) -> f64 {
    let missing = min_samples.saturating_sub(sample_size) as f64;
    let extra = (missing * SPREAD_PER_MISSING_SAMPLE).min(MAX_EXTRA_SPREAD);
    base_spread(volatility) + extra
}

/// P10/P90 bounds around `baseline`.
///
/// Bounds are rounded to whole units and never cross the baseline.
pub fn bounds(
    baseline: u64,
    volatility: VolatilityClass,
    sample_size: usize,
    min_samples: usize,
) -> ConfidenceInterval {
    let half_width = spread(volatility, sample_size, min_samples);
    let value = baseline as f64;

    let lower = (value * (1.0 - half_width)).round().max(0.0) as u64;
    let upper = (value * (1.0 + half_width)).round() as u64;

    ConfidenceInterval {
        lower_p10: lower.min(baseline),
        upper_p90: upper.max(baseline),
    }
}
