//! Valuation Request Orchestrator.
//!
//! Validates a request, then runs baseline, forecast, confidence and
//! explainability against one reference snapshot and assembles the result.
//! Data gaps become warnings; validation and arithmetic failures fail the
//! whole request.

use chrono::{Datelike, Utc};
use rayon::prelude::*;

use bidmetric_common::logging::generate_request_id;
use bidmetric_common::{ValuationSettings, MAX_TOP_FACTORS};

use crate::baseline::{compute_baseline, MAX_REPORTABLE_VALUE};
use crate::comparison;
use crate::confidence;
use crate::error::{Result, ValuationError};
use crate::explain::{self, DEFAULT_TOP_FACTORS, MODEL_DESCRIPTOR};
use crate::forecast::{self, MAX_HORIZON_YEARS};
use crate::growth::{GrowthEstimator, GrowthSource, MAX_GROWTH_RATE, MIN_HISTORY_SAMPLES};
use crate::snapshot::ReferenceSnapshot;
use crate::types::*;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Horizon used when a request omits one
    pub default_horizon_years: u32,
    /// Largest accepted horizon, never above 20
    pub max_horizon_years: u32,
    pub min_history_samples: usize,
    pub max_growth_rate: f64,
    /// Repo rate (%) with no growth adjustment
    pub neutral_repo_rate_pct: f64,
    /// Percentage points of growth per point of repo rate
    pub repo_rate_sensitivity: f64,
    /// Factors kept in the explanation, at most 5
    pub top_factor_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_horizon_years: 5,
            max_horizon_years: MAX_HORIZON_YEARS,
            min_history_samples: MIN_HISTORY_SAMPLES,
            max_growth_rate: MAX_GROWTH_RATE,
            neutral_repo_rate_pct: 6.5,
            repo_rate_sensitivity: 0.25,
            top_factor_count: DEFAULT_TOP_FACTORS,
        }
    }
}

impl From<&ValuationSettings> for EngineConfig {
    fn from(settings: &ValuationSettings) -> Self {
        let max_horizon_years = settings.max_horizon_years.clamp(1, MAX_HORIZON_YEARS);
        Self {
            default_horizon_years: settings.default_horizon_years.clamp(1, max_horizon_years),
            max_horizon_years,
            min_history_samples: settings.min_history_samples,
            max_growth_rate: settings.max_growth_rate,
            neutral_repo_rate_pct: settings.neutral_repo_rate_pct,
            repo_rate_sensitivity: settings.repo_rate_sensitivity,
            top_factor_count: settings.top_factor_count.clamp(1, MAX_TOP_FACTORS),
        }
    }
}

/// Per-request identity and clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub request_id: String,
    /// Year the trajectory starts after
    pub start_year: i32,
}

impl RequestMeta {
    pub fn new(request_id: impl Into<String>, start_year: i32) -> Self {
        Self {
            request_id: request_id.into(),
            start_year,
        }
    }

    /// Fresh request id and the current calendar year.
    pub fn now() -> Self {
        Self::new(generate_request_id(), Utc::now().year())
    }
}

/// Lifecycle stage of a request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Validated,
    Resolved,
    Computed,
    Projected,
    Bounded,
    Explained,
    Compared,
    Success,
    Error,
}

impl std::fmt::Display for RequestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Validated => write!(f, "validated"),
            Self::Resolved => write!(f, "resolved"),
            Self::Computed => write!(f, "computed"),
            Self::Projected => write!(f, "projected"),
            Self::Bounded => write!(f, "bounded"),
            Self::Explained => write!(f, "explained"),
            Self::Compared => write!(f, "compared"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

fn stage(request_id: &str, stage: RequestStage) {
    tracing::debug!(request_id = %request_id, stage = %stage, "Valuation stage");
}

/// Deterministic valuation engine. Holds no reference data of its own.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    config: EngineConfig,
    estimator: GrowthEstimator,
}

impl ValuationEngine {
    /// Create an engine with default config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(config: EngineConfig) -> Self {
        let estimator = GrowthEstimator::new(config.min_history_samples, config.max_growth_rate);
        Self { config, estimator }
    }

    pub fn from_settings(settings: &ValuationSettings) -> Self {
        Self::with_config(EngineConfig::from(settings))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Value a request with a fresh request id and the current year.
    pub fn evaluate(
        &self,
        request: &ValuationRequest,
        snapshot: &ReferenceSnapshot,
    ) -> ValuationResult {
        self.evaluate_with(request, snapshot, RequestMeta::now())
    }

    /// Value a request with caller-supplied identity and start year.
    ///
    /// Identical request, snapshot and meta always give an identical result.
    pub fn evaluate_with(
        &self,
        request: &ValuationRequest,
        snapshot: &ReferenceSnapshot,
        meta: RequestMeta,
    ) -> ValuationResult {
        let span = bidmetric_common::request_span!(
            "valuation",
            meta.request_id,
            snapshot_version = snapshot.version
        );
        let _enter = span.enter();
        stage(&meta.request_id, RequestStage::Received);

        let outcome = match self.run(request, snapshot, &meta) {
            Ok(valuation) => {
                stage(&meta.request_id, RequestStage::Success);
                tracing::info!(
                    request_id = %meta.request_id,
                    locality = %request.property.locality,
                    baseline = valuation.baseline_current_value,
                    growth_rate = valuation.effective_growth_rate,
                    warnings = valuation.warnings.len(),
                    "Valuation complete"
                );
                ValuationOutcome::Success(valuation)
            }
            Err(err) => {
                stage(&meta.request_id, RequestStage::Error);
                match &err {
                    ValuationError::InternalComputation(detail) => tracing::error!(
                        request_id = %meta.request_id,
                        snapshot_version = snapshot.version,
                        error = %detail,
                        request = ?request,
                        "Valuation failed"
                    ),
                    other => tracing::info!(
                        request_id = %meta.request_id,
                        error = %other,
                        "Valuation rejected"
                    ),
                }
                ValuationOutcome::Failed(err)
            }
        };

        ValuationResult {
            request_id: meta.request_id,
            snapshot_version: snapshot.version,
            outcome,
        }
    }

    /// Value many requests in parallel against one snapshot.
    ///
    /// Results come back in request order.
    pub fn evaluate_batch(
        &self,
        requests: &[ValuationRequest],
        snapshot: &ReferenceSnapshot,
    ) -> Vec<ValuationResult> {
        tracing::info!(
            requests = requests.len(),
            snapshot_version = snapshot.version,
            "Starting batch valuation"
        );

        requests
            .par_iter()
            .map(|request| self.evaluate(request, snapshot))
            .collect()
    }

    /// Check shape and ranges of a raw request.
    ///
    /// All problems are reported together, separated by `; `.
    pub fn validate(&self, request: &ValuationRequest) -> Result<ValidatedRequest> {
        let raw = &request.property;
        let macro_input = request.macro_input.clone().unwrap_or_default();
        let mut problems = Vec::new();

        if !raw.area_sqft.is_finite() || raw.area_sqft <= 0.0 {
            problems.push(format!("area_sqft must be a positive number, got {}", raw.area_sqft));
        }

        let locality = raw.locality.trim();
        if locality.is_empty() {
            problems.push("locality must not be empty".to_string());
        }

        let property_type = raw
            .property_type
            .parse::<PropertyType>()
            .map_err(|e| problems.push(e.user_message()))
            .ok();
        let sale_type = raw
            .sale_type
            .parse::<SaleType>()
            .map_err(|e| problems.push(e.user_message()))
            .ok();

        if !(0.0..=100.0).contains(&raw.builder_rating) {
            problems.push(format!(
                "builder_rating must be between 0 and 100, got {}",
                raw.builder_rating
            ));
        }
        if !(0.0..=10.0).contains(&raw.infrastructure_score) {
            problems.push(format!(
                "infrastructure_score must be between 0 and 10, got {}",
                raw.infrastructure_score
            ));
        }

        let max_horizon = self.config.max_horizon_years;
        let horizon = macro_input
            .forecast_horizon_years
            .unwrap_or(i64::from(self.config.default_horizon_years));
        if !(1..=i64::from(max_horizon)).contains(&horizon) {
            problems.push(format!(
                "forecast_horizon_years must be between 1 and {max_horizon}, got {horizon}"
            ));
        }

        let listed_price = match raw.listed_price {
            Some(price) if price.is_finite() && price > 0.0 && price <= MAX_REPORTABLE_VALUE => {
                Some(price.round() as u64)
            }
            Some(price) => {
                problems.push(format!("listed_price must be a positive amount, got {price}"));
                None
            }
            None => None,
        };

        if let Some(repo) = macro_input.policy_repo_rate_pct {
            if !repo.is_finite() || repo < 0.0 {
                problems.push(format!(
                    "policy_repo_rate_pct must be a non-negative number, got {repo}"
                ));
            }
        }

        match (property_type, sale_type) {
            (Some(property_type), Some(sale_type)) if problems.is_empty() => Ok(ValidatedRequest {
                property: PropertyInput {
                    area_sqft: raw.area_sqft,
                    locality: locality.to_string(),
                    property_type,
                    sale_type,
                    builder_rating: raw.builder_rating,
                    infrastructure_score: raw.infrastructure_score,
                    zone: raw
                        .zone
                        .as_deref()
                        .map(str::trim)
                        .filter(|z| !z.is_empty())
                        .map(str::to_string),
                },
                horizon_years: horizon as u32,
                policy_repo_rate_pct: macro_input.policy_repo_rate_pct,
                listed_price,
            }),
            _ => Err(ValuationError::Validation(problems.join("; "))),
        }
    }

    fn run(
        &self,
        request: &ValuationRequest,
        snapshot: &ReferenceSnapshot,
        meta: &RequestMeta,
    ) -> Result<Valuation> {
        let request_id = meta.request_id.as_str();

        let validated = self.validate(request)?;
        let property = &validated.property;
        stage(request_id, RequestStage::Validated);

        let mut warnings = Vec::new();

        let resolution = snapshot.profiles.resolve(&property.locality);
        let profile = resolution.profile;
        if !resolution.is_resolved() {
            tracing::warn!(
                request_id = %request_id,
                locality = %property.locality,
                "Unknown locality, using default profile"
            );
            warnings.push(ValuationWarning::LocalityUnresolved);
        }

        let growth = self.estimator.estimate_cagr(
            &snapshot.history,
            &property.locality,
            profile,
            property.zone.as_deref(),
        );
        match growth.source {
            GrowthSource::Locality => {}
            GrowthSource::Zone => warnings.push(ValuationWarning::HistoryZoneFallback),
            GrowthSource::ProfileFallback => warnings.push(ValuationWarning::InsufficientHistory),
        }
        let appreciation = self
            .estimator
            .appreciation(&snapshot.history, &property.locality, profile);
        if growth.was_clamped() {
            tracing::warn!(
                request_id = %request_id,
                raw_rate = growth.raw_rate,
                clamped_rate = growth.growth_rate,
                "Growth rate outside plausible range, clamped"
            );
            warnings.push(ValuationWarning::GrowthRateClamped);
        }
        stage(request_id, RequestStage::Resolved);

        let baseline = compute_baseline(property, profile)?;
        stage(request_id, RequestStage::Computed);

        let rate = self.estimator.apply_macro(
            growth.growth_rate,
            validated.policy_repo_rate_pct,
            self.config.neutral_repo_rate_pct,
            self.config.repo_rate_sensitivity,
        );
        let trajectory = forecast::project(
            baseline.value,
            rate.effective_rate,
            validated.horizon_years,
            meta.start_year,
        )?;
        stage(request_id, RequestStage::Projected);

        let interval = confidence::bounds(
            baseline.value,
            profile.volatility_class,
            growth.sample_size,
            self.estimator.min_samples(),
        );
        stage(request_id, RequestStage::Bounded);

        let top_factors = explain::explain(
            &baseline.applied_multipliers,
            explain::locality_weight(profile.base_rate_per_sqft, snapshot.profiles.reference_rate()),
            explain::macro_weight(rate.base_rate, rate.effective_rate, validated.horizon_years),
            explain::area_weight(property.area_sqft),
            self.config.top_factor_count,
        );
        stage(request_id, RequestStage::Explained);

        let market_value = baseline.unadjusted_value.round() as u64;
        let price_comparison =
            comparison::compare(baseline.value, market_value, validated.listed_price);
        stage(request_id, RequestStage::Compared);

        Ok(Valuation {
            baseline_current_value: baseline.value,
            confidence_interval: interval,
            forecast_trajectory: trajectory,
            explainability: Explainability {
                model_descriptor: MODEL_DESCRIPTOR.to_string(),
                top_factors,
            },
            effective_growth_rate: rate.effective_rate,
            price_comparison,
            historical_appreciation: appreciation,
            warnings,
        })
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(locality: &str, property_type: &str, horizon: Option<i64>) -> ValuationRequest {
        ValuationRequest {
            property: PropertyRequest {
                area_sqft: 1_000.0,
                locality: locality.to_string(),
                property_type: property_type.to_string(),
                sale_type: "Resale".to_string(),
                builder_rating: 50.0,
                infrastructure_score: 5.0,
                zone: None,
                listed_price: None,
            },
            macro_input: Some(MacroInput {
                forecast_horizon_years: horizon,
                policy_repo_rate_pct: None,
            }),
        }
    }

    fn meta() -> RequestMeta {
        RequestMeta::new("req_test", 2026)
    }

    #[test]
    fn test_default_horizon() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Apartment", None);
        req.macro_input = None;

        let validated = engine.validate(&req).unwrap();
        assert_eq!(validated.horizon_years, 5);
        assert_eq!(validated.property.property_type, PropertyType::Apartment);
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let engine = ValuationEngine::new();
        let mut req = request("  ", "Castle", Some(0));
        req.property.area_sqft = -10.0;
        req.property.builder_rating = 120.0;

        let err = engine.validate(&req).unwrap_err();
        let ValuationError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("area_sqft"));
        assert!(message.contains("locality"));
        assert!(message.contains("property_type"));
        assert!(message.contains("builder_rating"));
        assert!(message.contains("forecast_horizon_years"));
    }

    #[test]
    fn test_zone_is_normalized() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Apartment", Some(5));
        req.property.zone = Some("   ".into());
        assert!(engine.validate(&req).unwrap().property.zone.is_none());

        req.property.zone = Some(" Western ".into());
        assert_eq!(
            engine.validate(&req).unwrap().property.zone.as_deref(),
            Some("Western")
        );
    }

    #[test]
    fn test_negative_repo_rate_rejected() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Apartment", Some(5));
        req.macro_input = Some(MacroInput {
            forecast_horizon_years: Some(5),
            policy_repo_rate_pct: Some(-1.0),
        });
        assert!(engine.validate(&req).unwrap_err().is_validation());
    }

    #[test]
    fn test_profile_fallback_warns_and_widens() {
        let engine = ValuationEngine::new();
        let result = engine.evaluate_with(
            &request("Mira Road", "Apartment", Some(5)),
            &ReferenceSnapshot::builtin(),
            meta(),
        );

        let valuation = result.valuation().unwrap();
        assert_eq!(valuation.baseline_current_value, 8_500_000);
        assert_eq!(valuation.warnings, vec![ValuationWarning::InsufficientHistory]);
        // Medium volatility plus 2% for two missing samples
        assert_eq!(valuation.confidence_interval.lower_p10, 7_990_000);
        assert_eq!(valuation.confidence_interval.upper_p90, 9_010_000);
        assert_eq!(valuation.forecast_trajectory[0].year, 2027);
    }

    #[test]
    fn test_one_observation_costs_one_missing_sample() {
        let engine = ValuationEngine::new();
        let record = HistoricalRecord {
            area_name: "Mira Road".into(),
            zone: "Western".into(),
            rate_per_sqft: 8_200.0,
            observed_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            source: "registry".into(),
        };
        let snapshot = ReferenceSnapshot::new(
            1,
            crate::locality::LocalityProfileStore::mmr_default(),
            vec![record],
        );

        let req = request("Mira Road", "Apartment", Some(5));
        let result = engine.evaluate_with(&req, &snapshot, meta());
        let valuation = result.valuation().unwrap();
        assert_eq!(valuation.warnings, vec![ValuationWarning::InsufficientHistory]);
        // Medium volatility plus 1% for the one missing sample
        assert_eq!(valuation.confidence_interval.lower_p10, 8_075_000);
        assert_eq!(valuation.confidence_interval.upper_p90, 8_925_000);
        assert!(valuation.historical_appreciation.is_none());
    }

    #[test]
    fn test_listed_price_validation() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Apartment", Some(5));

        req.property.listed_price = Some(9_250_000.4);
        assert_eq!(engine.validate(&req).unwrap().listed_price, Some(9_250_000));

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            req.property.listed_price = Some(bad);
            let err = engine.validate(&req).unwrap_err();
            assert!(err.user_message().contains("listed_price"), "{bad}");
        }
    }

    #[test]
    fn test_comparison_against_market_and_listing() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Villa", Some(5));
        req.property.listed_price = Some(10_000_000.0);

        let result = engine.evaluate_with(&req, &ReferenceSnapshot::builtin(), meta());
        let comparison = &result.valuation().unwrap().price_comparison;

        assert_eq!(comparison.market.market_value, 8_500_000);
        assert_eq!(comparison.market.category, PriceCategory::Overvalued);
        assert_eq!(comparison.market.badge, PriceBadge::Golden);
        let listed = comparison.listed.as_ref().unwrap();
        assert_eq!(listed.verdict, ListedPriceVerdict::OwnerHigher);
        assert_eq!(comparison.bidding_range.min, 8_500_000);
        assert_eq!(comparison.bidding_range.max, 10_000_000);
    }

    #[test]
    fn test_repo_rate_lowers_growth() {
        let engine = ValuationEngine::new();
        let mut req = request("Mira Road", "Apartment", Some(5));
        req.macro_input = Some(MacroInput {
            forecast_horizon_years: Some(5),
            policy_repo_rate_pct: Some(8.5),
        });

        let result = engine.evaluate_with(&req, &ReferenceSnapshot::builtin(), meta());
        let valuation = result.valuation().unwrap();
        assert!((valuation.effective_growth_rate - 0.054).abs() < 1e-9);

        let macro_factor = valuation
            .explainability
            .top_factors
            .iter()
            .find(|f| f.feature_name == "macro_repo_rate");
        assert!(macro_factor.is_some_and(|f| f.impact_direction == ImpactDirection::Negative));
    }

    #[test]
    fn test_config_from_settings_caps_horizon() {
        let settings = ValuationSettings {
            max_horizon_years: 50,
            default_horizon_years: 60,
            ..ValuationSettings::default()
        };
        let config = EngineConfig::from(&settings);
        assert_eq!(config.max_horizon_years, 20);
        assert_eq!(config.default_horizon_years, 20);
    }

    #[test]
    fn test_oversized_factor_count_keeps_five() {
        let settings = ValuationSettings {
            top_factor_count: 9,
            ..ValuationSettings::default()
        };
        let engine = ValuationEngine::from_settings(&settings);
        assert_eq!(engine.config().top_factor_count, 5);

        let mut req = request("Bhayandar East", "Villa", Some(5));
        req.property.sale_type = "New".into();
        req.property.area_sqft = 1_800.0;
        req.property.builder_rating = 90.0;
        req.property.infrastructure_score = 9.0;
        req.macro_input = Some(MacroInput {
            forecast_horizon_years: Some(5),
            policy_repo_rate_pct: Some(8.0),
        });

        let result = engine.evaluate_with(&req, &ReferenceSnapshot::builtin(), meta());
        let factors = &result.valuation().unwrap().explainability.top_factors;
        assert_eq!(factors.len(), 5);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(RequestStage::Bounded.to_string(), "bounded");
        assert_eq!(RequestStage::Compared.to_string(), "compared");
        assert_eq!(RequestStage::Error.to_string(), "error");
    }
}
