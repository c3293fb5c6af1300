//! Property tests for valuation invariants.

use chrono::NaiveDate;
use proptest::prelude::*;

use bidmetric_valuation::{
    HistoricalRecord, LocalityProfileStore, MacroInput, PropertyRequest, ReferenceSnapshot,
    RequestMeta, ValuationEngine, ValuationRequest,
};

const LOCALITIES: &[&str] = &[
    "Mira Road",
    "Mira Rd",
    "Bhayandar East",
    "Dahisar",
    "Thane",
    "Kandivali East",
    "Borivali West",
    "Andheri West",
    "Unknown Nagar",
];

const PROPERTY_TYPES: &[&str] = &["Apartment", "Villa", "Plot", "Studio", "RowHouse", "flat"];

fn history() -> Vec<HistoricalRecord> {
    let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    vec![
        HistoricalRecord {
            area_name: "Dahisar".into(),
            zone: "Western".into(),
            rate_per_sqft: 8_900.0,
            observed_at: date("2021-01-01"),
            source: "registry".into(),
        },
        HistoricalRecord {
            area_name: "Dahisar".into(),
            zone: "Western".into(),
            rate_per_sqft: 10_500.0,
            observed_at: date("2024-01-01"),
            source: "registry".into(),
        },
        HistoricalRecord {
            area_name: "Bhayandar East".into(),
            zone: "Western".into(),
            rate_per_sqft: 3_000.0,
            observed_at: date("2022-01-01"),
            source: "scraper".into(),
        },
        HistoricalRecord {
            area_name: "Bhayandar East".into(),
            zone: "Western".into(),
            rate_per_sqft: 7_200.0,
            observed_at: date("2023-06-01"),
            source: "scraper".into(),
        },
    ]
}

prop_compose! {
    fn valid_request()(
        area_sqft in 100.0f64..20_000.0,
        locality in prop::sample::select(LOCALITIES),
        property_type in prop::sample::select(PROPERTY_TYPES),
        new_sale in any::<bool>(),
        builder_rating in 0.0f64..=100.0,
        infrastructure_score in 0.0f64..=10.0,
        horizon in 1i64..=20,
        repo_rate in prop::option::of(2.0f64..12.0),
        listed_price in prop::option::of(1_000_000.0f64..500_000_000.0),
    ) -> ValuationRequest {
        ValuationRequest {
            property: PropertyRequest {
                area_sqft,
                locality: locality.to_string(),
                property_type: property_type.to_string(),
                sale_type: if new_sale { "New" } else { "Resale" }.to_string(),
                builder_rating,
                infrastructure_score,
                zone: Some("Western".to_string()),
                listed_price,
            },
            macro_input: Some(MacroInput {
                forecast_horizon_years: Some(horizon),
                policy_repo_rate_pct: repo_rate,
            }),
        }
    }
}

proptest! {
    #[test]
    fn prop_valid_requests_satisfy_invariants(request in valid_request()) {
        let engine = ValuationEngine::new();
        let snapshot = ReferenceSnapshot::new(1, LocalityProfileStore::mmr_default(), history());

        let result = engine.evaluate_with(&request, &snapshot, RequestMeta::new("req_prop", 2026));
        let valuation = result.valuation().expect("valid request must succeed");

        // interval contains the baseline
        prop_assert!(valuation.confidence_interval.contains(valuation.baseline_current_value));

        // one point per year, consecutive
        let horizon = request.macro_input.as_ref().and_then(|m| m.forecast_horizon_years).unwrap();
        prop_assert_eq!(valuation.forecast_trajectory.len() as i64, horizon);
        prop_assert_eq!(valuation.forecast_trajectory[0].year, 2027);
        for pair in valuation.forecast_trajectory.windows(2) {
            prop_assert_eq!(pair[1].year, pair[0].year + 1);
            prop_assert!(pair[1].confidence_pct <= pair[0].confidence_pct);
        }
        for point in &valuation.forecast_trajectory {
            prop_assert!(point.low_estimate <= point.expected_value);
            prop_assert!(point.expected_value <= point.high_estimate);
            prop_assert!((50..=100).contains(&point.confidence_pct));
        }

        // bidding range spans every known price
        let comparison = &valuation.price_comparison;
        let range = comparison.bidding_range;
        prop_assert!(range.min <= valuation.baseline_current_value);
        prop_assert!(valuation.baseline_current_value <= range.max);
        prop_assert!(range.min <= comparison.market.market_value);
        prop_assert_eq!(comparison.listed.is_some(), request.property.listed_price.is_some());

        // growth stays within bounds
        prop_assert!((0.0..=0.15).contains(&valuation.effective_growth_rate));

        // no zero-effect factors, sorted by magnitude
        let factors = &valuation.explainability.top_factors;
        prop_assert!(factors.len() <= 5);
        prop_assert!(factors.iter().all(|f| f.signed_impact_pct != 0.0));
        for pair in factors.windows(2) {
            prop_assert!(pair[0].signed_impact_pct.abs() >= pair[1].signed_impact_pct.abs());
        }
    }

    #[test]
    fn prop_evaluation_is_idempotent(request in valid_request()) {
        let engine = ValuationEngine::new();
        let snapshot = ReferenceSnapshot::new(1, LocalityProfileStore::mmr_default(), history());

        let first = engine.evaluate_with(&request, &snapshot, RequestMeta::new("req_1", 2026));
        let second = engine.evaluate_with(&request, &snapshot, RequestMeta::new("req_2", 2026));
        prop_assert_eq!(first.valuation(), second.valuation());
    }

    #[test]
    fn prop_out_of_range_horizon_fails(horizon in prop_oneof![-50i64..=0, 21i64..=500]) {
        let engine = ValuationEngine::new();
        let request = ValuationRequest {
            property: PropertyRequest {
                area_sqft: 1_000.0,
                locality: "Mira Road".into(),
                property_type: "Apartment".into(),
                sale_type: "Resale".into(),
                builder_rating: 50.0,
                infrastructure_score: 5.0,
                zone: None,
                listed_price: None,
            },
            macro_input: Some(MacroInput {
                forecast_horizon_years: Some(horizon),
                policy_repo_rate_pct: None,
            }),
        };

        let result = engine.evaluate_with(&request, &ReferenceSnapshot::builtin(), RequestMeta::new("req_h", 2026));
        prop_assert!(result.valuation().is_none());
        prop_assert!(result.error().map_or(false, |e| e.is_validation()));
    }
}
