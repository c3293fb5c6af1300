//! Wire format of valuation responses.
//!
//! Field names and string renderings follow the marketplace API:
//! growth as `"5.9"`, factor impacts and price deviations as `"+15.0%"`.

use serde::{Deserialize, Serialize};

use bidmetric_common::util::format_signed_pct;

use crate::types::{
    AppreciationMetrics, ExplainabilityFactor, ForecastPoint, ImpactDirection,
    ListedPriceComparison, ListedPriceVerdict, PriceBadge, PriceCategory, PriceComparison,
    Valuation, ValuationOutcome, ValuationResult, ValuationStatus,
};

/// Response body for one valuation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValuationResponse {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub request_id: String,
    pub status: ValuationStatus,
    pub baseline_current_value_inr: u64,
    pub confidence_interval: IntervalBody,
    pub forecast_trajectory: Vec<ForecastPointBody>,
    pub explainability: ExplainabilityBody,
    pub price_comparison: PriceComparisonBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_appreciation: Option<AppreciationBody>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: ValuationStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalBody {
    pub lower_bound_p10: u64,
    pub upper_bound_p90: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPointBody {
    pub year: i32,
    pub expected_value: u64,
    pub yoy_growth_pct: String,
    pub low_estimate: u64,
    pub high_estimate: u64,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainabilityBody {
    pub model_type: String,
    pub top_5_driving_factors: Vec<FactorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBody {
    pub feature: String,
    pub impact_direction: ImpactDirection,
    pub shap_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComparisonBody {
    pub market_price_inr: u64,
    pub deviation_from_market: String,
    pub category: PriceCategory,
    pub badge: PriceBadge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_price: Option<ListedPriceBody>,
    pub bidding_range: BiddingRangeBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedPriceBody {
    pub listed_price_inr: u64,
    pub deviation_from_valuation: String,
    pub comparison: ListedPriceVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiddingRangeBody {
    pub min_inr: u64,
    pub max_inr: u64,
}

/// Past locality appreciation; percentages as `"25.0"`, years as `"4.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppreciationBody {
    pub total_appreciation_pct: String,
    pub cagr_pct: String,
    pub years_of_data: String,
}

impl ValuationResponse {
    pub fn status(&self) -> ValuationStatus {
        match self {
            Self::Success(_) => ValuationStatus::Success,
            Self::Error(_) => ValuationStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Error body with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorResponse {
            status: ValuationStatus::Error,
            message: message.into(),
        })
    }
}

impl From<&ValuationResult> for ValuationResponse {
    fn from(result: &ValuationResult) -> Self {
        match &result.outcome {
            ValuationOutcome::Success(valuation) => {
                Self::Success(success_body(&result.request_id, valuation))
            }
            ValuationOutcome::Failed(err) => Self::error(err.user_message()),
        }
    }
}

fn success_body(request_id: &str, valuation: &Valuation) -> SuccessResponse {
    SuccessResponse {
        request_id: request_id.to_string(),
        status: ValuationStatus::Success,
        baseline_current_value_inr: valuation.baseline_current_value,
        confidence_interval: IntervalBody {
            lower_bound_p10: valuation.confidence_interval.lower_p10,
            upper_bound_p90: valuation.confidence_interval.upper_p90,
        },
        forecast_trajectory: valuation.forecast_trajectory.iter().map(point_body).collect(),
        explainability: ExplainabilityBody {
            model_type: valuation.explainability.model_descriptor.clone(),
            top_5_driving_factors: valuation
                .explainability
                .top_factors
                .iter()
                .map(factor_body)
                .collect(),
        },
        price_comparison: comparison_body(&valuation.price_comparison),
        historical_appreciation: valuation.historical_appreciation.as_ref().map(appreciation_body),
        warnings: valuation.warnings.iter().map(|w| w.to_string()).collect(),
    }
}

fn point_body(point: &ForecastPoint) -> ForecastPointBody {
    ForecastPointBody {
        year: point.year,
        expected_value: point.expected_value,
        yoy_growth_pct: format!("{:.1}", point.yoy_growth_pct),
        low_estimate: point.low_estimate,
        high_estimate: point.high_estimate,
        confidence: point.confidence_pct,
    }
}

fn comparison_body(comparison: &PriceComparison) -> PriceComparisonBody {
    PriceComparisonBody {
        market_price_inr: comparison.market.market_value,
        deviation_from_market: format_signed_pct(comparison.market.deviation_pct),
        category: comparison.market.category,
        badge: comparison.market.badge,
        listed_price: comparison.listed.as_ref().map(listed_body),
        bidding_range: BiddingRangeBody {
            min_inr: comparison.bidding_range.min,
            max_inr: comparison.bidding_range.max,
        },
    }
}

fn listed_body(listed: &ListedPriceComparison) -> ListedPriceBody {
    ListedPriceBody {
        listed_price_inr: listed.listed_price,
        deviation_from_valuation: format_signed_pct(listed.deviation_pct),
        comparison: listed.verdict,
    }
}

fn appreciation_body(metrics: &AppreciationMetrics) -> AppreciationBody {
    AppreciationBody {
        total_appreciation_pct: format!("{:.1}", metrics.total_appreciation_pct),
        cagr_pct: format!("{:.1}", metrics.cagr_pct),
        years_of_data: format!("{:.1}", metrics.years_of_data),
    }
}

fn factor_body(factor: &ExplainabilityFactor) -> FactorBody {
    FactorBody {
        feature: factor.feature_name.clone(),
        impact_direction: factor.impact_direction,
        shap_value: format_signed_pct(factor.signed_impact_pct),
    }
}
