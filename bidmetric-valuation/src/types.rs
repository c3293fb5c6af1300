//! Valuation Engine Types.
//!
//! Request records consumed by the engine, reference records it reads, and
//! the immutable result it produces.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use bidmetric_common::util::format_signed_pct;

use crate::error::ValuationError;

// ============================================================================
// Property Enumerations
// ============================================================================

/// Recognized property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    Villa,
    Plot,
    Studio,
    RowHouse,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apartment => write!(f, "Apartment"),
            Self::Villa => write!(f, "Villa"),
            Self::Plot => write!(f, "Plot"),
            Self::Studio => write!(f, "Studio"),
            Self::RowHouse => write!(f, "RowHouse"),
        }
    }
}

impl FromStr for PropertyType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "apartment" | "flat" => Ok(Self::Apartment),
            "villa" => Ok(Self::Villa),
            "plot" => Ok(Self::Plot),
            "studio" => Ok(Self::Studio),
            "rowhouse" => Ok(Self::RowHouse),
            _ => Err(ValuationError::Validation(format!(
                "unrecognized property_type '{}'",
                s.trim()
            ))),
        }
    }
}

/// Sale condition of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleType {
    New,
    Resale,
}

impl std::fmt::Display for SaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Resale => write!(f, "Resale"),
        }
    }
}

impl FromStr for SaleType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "resale" => Ok(Self::Resale),
            _ => Err(ValuationError::Validation(format!(
                "unrecognized sale_type '{}'",
                s.trim()
            ))),
        }
    }
}

/// Coarse bucket controlling confidence-interval width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityClass {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl std::fmt::Display for VolatilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Property attributes as received from the request-parsing collaborator.
///
/// Enumerations stay strings here so that unknown values surface as a
/// validation error rather than a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub area_sqft: f64,
    pub locality: String,
    pub property_type: String,
    pub sale_type: String,
    /// 0-100
    pub builder_rating: f64,
    /// 0-10
    pub infrastructure_score: f64,
    /// Zone used when the locality itself has too little history
    #[serde(default)]
    pub zone: Option<String>,
    /// Owner's asking price in INR
    #[serde(default, alias = "owner_listed_price")]
    pub listed_price: Option<f64>,
}

/// Macro parameters of a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroInput {
    /// Defaults to the configured horizon (5 years) when absent
    #[serde(default)]
    pub forecast_horizon_years: Option<i64>,
    /// Policy repo rate in percent, e.g. 6.5
    #[serde(default, alias = "repo_rate")]
    pub policy_repo_rate_pct: Option<f64>,
}

/// A valuation request: `{ property, macro? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub property: PropertyRequest,
    #[serde(rename = "macro", default)]
    pub macro_input: Option<MacroInput>,
}

/// Property attributes after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInput {
    pub area_sqft: f64,
    pub locality: String,
    pub property_type: PropertyType,
    pub sale_type: SaleType,
    pub builder_rating: f64,
    pub infrastructure_score: f64,
    pub zone: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub property: PropertyInput,
    pub horizon_years: u32,
    pub policy_repo_rate_pct: Option<f64>,
    /// Whole rupees
    pub listed_price: Option<u64>,
}

// ============================================================================
// Reference Types
// ============================================================================

/// One observed locality rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub area_name: String,
    #[serde(default)]
    pub zone: String,
    pub rate_per_sqft: f64,
    pub observed_at: NaiveDate,
    /// Provenance tag (scraper, registry, manual)
    #[serde(default)]
    pub source: String,
}

// ============================================================================
// Result Types
// ============================================================================

/// One year of the forecast trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub expected_value: u64,
    /// Percent, one decimal place
    pub yoy_growth_pct: f64,
    /// Lower edge of the year's band, never above `expected_value`
    pub low_estimate: u64,
    /// Upper edge of the year's band, never below `expected_value`
    pub high_estimate: u64,
    /// Confidence in the year's estimate, 50-100
    pub confidence_pct: u8,
}

/// P10/P90 bounds around the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower_p10: u64,
    pub upper_p90: u64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: u64) -> bool {
        self.lower_p10 <= value && value <= self.upper_p90
    }

    pub fn width(&self) -> u64 {
        self.upper_p90 - self.lower_p10
    }
}

/// Direction in which a feature moved the valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactDirection {
    Positive,
    Negative,
}

impl std::fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Signed contribution of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainabilityFactor {
    pub feature_name: String,
    pub impact_direction: ImpactDirection,
    /// Signed percentage, one decimal place
    pub signed_impact_pct: f64,
}

impl ExplainabilityFactor {
    /// Render the impact as `+15.0%` / `-1.5%`.
    pub fn display_impact(&self) -> String {
        format_signed_pct(self.signed_impact_pct)
    }
}

/// Feature attribution attached to a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explainability {
    pub model_descriptor: String,
    pub top_factors: Vec<ExplainabilityFactor>,
}

/// How the valuation sits against the plain market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    /// Valuation well below the market price
    Undervalued,
    FairlyValued,
    /// Valuation well above the market price
    Overvalued,
}

impl std::fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undervalued => write!(f, "undervalued"),
            Self::FairlyValued => write!(f, "fairly_valued"),
            Self::Overvalued => write!(f, "overvalued"),
        }
    }
}

/// Listing badge derived from the price category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBadge {
    /// Premium property
    Golden,
    /// Value opportunity
    Silver,
    Neutral,
}

impl From<PriceCategory> for PriceBadge {
    fn from(category: PriceCategory) -> Self {
        match category {
            PriceCategory::Overvalued => Self::Golden,
            PriceCategory::Undervalued => Self::Silver,
            PriceCategory::FairlyValued => Self::Neutral,
        }
    }
}

/// Valuation against `area * locality rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub market_value: u64,
    /// `(valuation - market) / market` in percent, one decimal place
    pub deviation_pct: f64,
    pub category: PriceCategory,
    pub badge: PriceBadge,
}

/// Which side prices the property higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListedPriceVerdict {
    /// Owner asks less than the valuation
    AiHigher,
    /// Owner asks more than the valuation
    OwnerHigher,
    Equal,
}

/// Owner's listed price against the valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedPriceComparison {
    pub listed_price: u64,
    /// `(listed - valuation) / valuation` in percent, one decimal place
    pub deviation_pct: f64,
    pub verdict: ListedPriceVerdict,
}

/// Span of the known prices, a starting range for bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiddingRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub market: MarketComparison,
    pub listed: Option<ListedPriceComparison>,
    pub bidding_range: BiddingRange,
}

/// Past appreciation of a locality's rate, values rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppreciationMetrics {
    pub total_appreciation_pct: f64,
    /// Unclamped historical CAGR in percent
    pub cagr_pct: f64,
    pub years_of_data: f64,
}

/// Recoverable data-quality issues reported alongside a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationWarning {
    /// Locality unknown; default profile used
    LocalityUnresolved,
    /// Too little history; profile growth rate used
    InsufficientHistory,
    /// Locality history too thin; zone history used
    HistoryZoneFallback,
    /// Estimated growth rate was outside the plausible range
    GrowthRateClamped,
}

impl ValuationWarning {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LocalityUnresolved => "locality_unresolved",
            Self::InsufficientHistory => "insufficient_history",
            Self::HistoryZoneFallback => "history_zone_fallback",
            Self::GrowthRateClamped => "growth_rate_clamped",
        }
    }
}

impl std::fmt::Display for ValuationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationStatus {
    Success,
    Error,
}

/// A complete successful valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub baseline_current_value: u64,
    pub confidence_interval: ConfidenceInterval,
    pub forecast_trajectory: Vec<ForecastPoint>,
    pub explainability: Explainability,
    /// Rate used for compounding, within [0.0, 0.15]
    pub effective_growth_rate: f64,
    pub price_comparison: PriceComparison,
    /// Absent when the locality has fewer than two observations
    pub historical_appreciation: Option<AppreciationMetrics>,
    pub warnings: Vec<ValuationWarning>,
}

/// Success carries the full valuation, failure carries nothing partial.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuationOutcome {
    Success(Valuation),
    Failed(ValuationError),
}

/// Result of one valuation request. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationResult {
    pub request_id: String,
    /// Version of the reference snapshot the result was computed from
    pub snapshot_version: u64,
    pub outcome: ValuationOutcome,
}

impl ValuationResult {
    pub fn status(&self) -> ValuationStatus {
        match self.outcome {
            ValuationOutcome::Success(_) => ValuationStatus::Success,
            ValuationOutcome::Failed(_) => ValuationStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ValuationOutcome::Success(_))
    }

    pub fn valuation(&self) -> Option<&Valuation> {
        match &self.outcome {
            ValuationOutcome::Success(valuation) => Some(valuation),
            ValuationOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValuationError> {
        match &self.outcome {
            ValuationOutcome::Success(_) => None,
            ValuationOutcome::Failed(err) => Some(err),
        }
    }

    /// Warning codes, empty for failed requests.
    pub fn warnings(&self) -> Vec<&'static str> {
        self.valuation()
            .map(|v| v.warnings.iter().map(ValuationWarning::as_str).collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
