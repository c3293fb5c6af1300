//! Explainability Generator.
//!
//! Attributes a valuation to the features that moved it away from a neutral
//! reference property: 1,000 sqft at the median locality rate, no feature
//! multipliers, neutral policy rate. Every factor is derived from an effect
//! that was actually applied, and zero-effect features are dropped.

use std::cmp::Ordering;

use bidmetric_common::util::round_to;
use bidmetric_common::MAX_TOP_FACTORS;

use crate::baseline::AppliedMultiplier;
use crate::types::{ExplainabilityFactor, ImpactDirection};

/// Descriptor of the attribution model reported with every result.
pub const MODEL_DESCRIPTOR: &str = "rule_based_multiplicative_v1";

/// Area of the neutral reference property.
pub const REFERENCE_AREA_SQFT: f64 = 1_000.0;

/// Number of factors retained by default.
pub const DEFAULT_TOP_FACTORS: usize = MAX_TOP_FACTORS;

pub const LOCALITY_FEATURE: &str = "locality_avg_rate";
pub const AREA_FEATURE: &str = "area_sqft";
pub const MACRO_FEATURE: &str = "macro_repo_rate";

/// Impact of the locality rate relative to the reference rate, in percent.
pub fn locality_weight(base_rate_per_sqft: f64, reference_rate: f64) -> f64 {
    if reference_rate > 0.0 {
        (base_rate_per_sqft / reference_rate - 1.0) * 100.0
    } else {
        0.0
    }
}

/// Impact of the property area relative to the reference area, in percent.
pub fn area_weight(area_sqft: f64) -> f64 {
    (area_sqft / REFERENCE_AREA_SQFT - 1.0) * 100.0
}

/// Impact of the macro growth adjustment on the horizon-end value, in percent.
pub fn macro_weight(base_rate: f64, effective_rate: f64, horizon_years: u32) -> f64 {
    let years = horizon_years as i32;
    let adjusted = (1.0 + effective_rate).powi(years);
    let unadjusted = (1.0 + base_rate).powi(years);
    (adjusted / unadjusted - 1.0) * 100.0
}

/// Rank the contributing features and keep the `top_k` largest.
///
/// `top_k` is capped at [`MAX_TOP_FACTORS`].
pub fn explain(
    applied_multipliers: &[AppliedMultiplier],
    locality_weight: f64,
    macro_weight: f64,
    area_weight: f64,
    top_k: usize,
) -> Vec<ExplainabilityFactor> {
    let mut candidates: Vec<(&str, f64)> = applied_multipliers
        .iter()
        .map(|m| (m.feature, m.impact_pct()))
        .collect();
    candidates.push((LOCALITY_FEATURE, locality_weight));
    candidates.push((AREA_FEATURE, area_weight));
    candidates.push((MACRO_FEATURE, macro_weight));

    let mut factors: Vec<ExplainabilityFactor> = candidates
        .into_iter()
        .filter(|(_, impact)| impact.is_finite())
        .map(|(feature, impact)| (feature, round_to(impact, 1)))
        .filter(|(_, impact)| *impact != 0.0)
        .map(|(feature, impact)| ExplainabilityFactor {
            feature_name: feature.to_string(),
            impact_direction: if impact > 0.0 {
                ImpactDirection::Positive
            } else {
                ImpactDirection::Negative
            },
            signed_impact_pct: impact,
        })
        .collect();

    factors.sort_by(|a, b| {
        b.signed_impact_pct
            .abs()
            .partial_cmp(&a.signed_impact_pct.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.feature_name.cmp(&b.feature_name))
    });
    factors.truncate(top_k.min(MAX_TOP_FACTORS));
    factors
}
