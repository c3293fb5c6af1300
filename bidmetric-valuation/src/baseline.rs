//! Baseline Valuation Calculator.
//!
//! `value = area_sqft * base_rate_per_sqft`, then the feature multipliers of
//! [`FEATURE_MULTIPLIERS`] in table order. The same table drives the
//! explainability factors, so the two cannot drift apart.

use crate::error::{Result, ValuationError};
use crate::locality::LocalityProfile;
use crate::types::{PropertyInput, PropertyType, SaleType};

/// Largest value the engine will report (2^53, exact in f64).
pub(crate) const MAX_REPORTABLE_VALUE: f64 = 9_007_199_254_740_992.0;

/// A multiplicative adjustment triggered by a property feature.
#[derive(Debug)]
pub struct FeatureMultiplier {
    /// Feature name reported in explanations
    pub feature: &'static str,
    pub factor: f64,
    applies: fn(&PropertyInput) -> bool,
}

impl FeatureMultiplier {
    pub fn applies_to(&self, property: &PropertyInput) -> bool {
        (self.applies)(property)
    }
}

fn is_villa(p: &PropertyInput) -> bool {
    p.property_type == PropertyType::Villa
}

fn is_new_sale(p: &PropertyInput) -> bool {
    p.sale_type == SaleType::New
}

fn has_top_builder(p: &PropertyInput) -> bool {
    p.builder_rating > 80.0
}

fn has_strong_infrastructure(p: &PropertyInput) -> bool {
    p.infrastructure_score > 7.0
}

/// Feature multipliers, applied in this order.
pub static FEATURE_MULTIPLIERS: &[FeatureMultiplier] = &[
    FeatureMultiplier {
        feature: "property_type",
        factor: 1.15,
        applies: is_villa,
    },
    FeatureMultiplier {
        feature: "sale_type",
        factor: 1.08,
        applies: is_new_sale,
    },
    FeatureMultiplier {
        feature: "builder_rating",
        factor: 1.05,
        applies: has_top_builder,
    },
    FeatureMultiplier {
        feature: "infrastructure_score",
        factor: 1.03,
        applies: has_strong_infrastructure,
    },
];

/// A multiplier that fired for a property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedMultiplier {
    pub feature: &'static str,
    pub factor: f64,
}

impl AppliedMultiplier {
    /// Signed effect on the value in percent.
    pub fn impact_pct(&self) -> f64 {
        (self.factor - 1.0) * 100.0
    }
}

/// Present-day valuation before forecasting.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineValuation {
    /// Rounded to whole currency units
    pub value: u64,
    /// `area * base_rate`, before multipliers
    pub unadjusted_value: f64,
    pub applied_multipliers: Vec<AppliedMultiplier>,
}

/// Compute the baseline value of a property in a locality.
pub fn compute_baseline(
    property: &PropertyInput,
    profile: &LocalityProfile,
) -> Result<BaselineValuation> {
    let unadjusted_value = property.area_sqft * profile.base_rate_per_sqft;

    let applied_multipliers: Vec<AppliedMultiplier> = FEATURE_MULTIPLIERS
        .iter()
        .filter(|m| m.applies_to(property))
        .map(|m| AppliedMultiplier {
            feature: m.feature,
            factor: m.factor,
        })
        .collect();

    let adjusted = applied_multipliers
        .iter()
        .fold(unadjusted_value, |value, m| value * m.factor);

    if !adjusted.is_finite() || adjusted < 0.0 || adjusted > MAX_REPORTABLE_VALUE {
        return Err(ValuationError::InternalComputation(format!(
            "baseline value {adjusted} out of range (area {} sqft, rate {} /sqft)",
            property.area_sqft, profile.base_rate_per_sqft
        )));
    }

    Ok(BaselineValuation {
        value: adjusted.round() as u64,
        unadjusted_value,
        applied_multipliers,
    })
}
