//! Price Comparison.
//!
//! Sets the valuation against the plain market price of the property
//! (`area * locality rate`, no feature multipliers) and, when the owner's
//! asking price is known, against that too. Deviations are percentages
//! rounded to one decimal; categories are decided on the unrounded value.

use bidmetric_common::util::round_to;

use crate::types::{
    BiddingRange, ListedPriceComparison, ListedPriceVerdict, MarketComparison, PriceBadge,
    PriceCategory, PriceComparison,
};

/// Deviation from the market price beyond which a valuation is no longer fair.
pub const FAIR_VALUE_BAND_PCT: f64 = 8.0;

/// Listed prices within this distance of the valuation count as equal.
pub const LISTED_PRICE_TOLERANCE_PCT: f64 = 2.0;

/// Percent deviation of `value` from `reference`; 0 when `reference` is 0.
fn deviation_pct(value: u64, reference: u64) -> f64 {
    if reference == 0 {
        return 0.0;
    }
    (value as f64 - reference as f64) / reference as f64 * 100.0
}

/// Classify a valuation against the market price.
pub fn compare_with_market(valuation: u64, market_value: u64) -> MarketComparison {
    let deviation = deviation_pct(valuation, market_value);
    let category = if deviation > FAIR_VALUE_BAND_PCT {
        PriceCategory::Overvalued
    } else if deviation < -FAIR_VALUE_BAND_PCT {
        PriceCategory::Undervalued
    } else {
        PriceCategory::FairlyValued
    };

    MarketComparison {
        market_value,
        deviation_pct: round_to(deviation, 1),
        category,
        badge: PriceBadge::from(category),
    }
}

/// Compare the owner's listed price with the valuation.
pub fn compare_with_listed(valuation: u64, listed_price: u64) -> ListedPriceComparison {
    let deviation = deviation_pct(listed_price, valuation);
    let verdict = if deviation.abs() < LISTED_PRICE_TOLERANCE_PCT {
        ListedPriceVerdict::Equal
    } else if deviation > 0.0 {
        ListedPriceVerdict::OwnerHigher
    } else {
        ListedPriceVerdict::AiHigher
    };

    ListedPriceComparison {
        listed_price,
        deviation_pct: round_to(deviation, 1),
        verdict,
    }
}

/// Lowest and highest of the valuation, market and listed prices.
pub fn bidding_range(valuation: u64, market_value: u64, listed_price: Option<u64>) -> BiddingRange {
    let prices = [Some(valuation), Some(market_value), listed_price];
    let known = prices.iter().flatten().copied();

    BiddingRange {
        min: known.clone().min().unwrap_or(valuation),
        max: known.max().unwrap_or(valuation),
    }
}

/// Full comparison attached to a valuation.
pub fn compare(valuation: u64, market_value: u64, listed_price: Option<u64>) -> PriceComparison {
    PriceComparison {
        market: compare_with_market(valuation, market_value),
        listed: listed_price.map(|price| compare_with_listed(valuation, price)),
        bidding_range: bidding_range(valuation, market_value, listed_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_property_is_fairly_valued() {
        let market = compare_with_market(8_500_000, 8_500_000);
        assert_eq!(market.deviation_pct, 0.0);
        assert_eq!(market.category, PriceCategory::FairlyValued);
        assert_eq!(market.badge, PriceBadge::Neutral);
    }

    #[test]
    fn test_market_categories() {
        let villa = compare_with_market(9_775_000, 8_500_000);
        assert_eq!(villa.deviation_pct, 15.0);
        assert_eq!(villa.category, PriceCategory::Overvalued);
        assert_eq!(villa.badge, PriceBadge::Golden);

        let cheap = compare_with_market(9_000_000, 10_000_000);
        assert_eq!(cheap.deviation_pct, -10.0);
        assert_eq!(cheap.category, PriceCategory::Undervalued);
        assert_eq!(cheap.badge, PriceBadge::Silver);

        let inside = compare_with_market(10_750_000, 10_000_000);
        assert_eq!(inside.deviation_pct, 7.5);
        assert_eq!(inside.category, PriceCategory::FairlyValued);
    }

    #[test]
    fn test_listed_price_verdicts() {
        let higher = compare_with_listed(9_775_000, 10_000_000);
        assert_eq!(higher.verdict, ListedPriceVerdict::OwnerHigher);
        assert_eq!(higher.deviation_pct, 2.3);

        let close = compare_with_listed(9_775_000, 9_800_000);
        assert_eq!(close.verdict, ListedPriceVerdict::Equal);
        assert_eq!(close.deviation_pct, 0.3);

        let lower = compare_with_listed(9_775_000, 8_000_000);
        assert_eq!(lower.verdict, ListedPriceVerdict::AiHigher);
        assert_eq!(lower.deviation_pct, -18.2);
    }

    #[test]
    fn test_bidding_range() {
        assert_eq!(
            bidding_range(9_775_000, 8_500_000, Some(10_000_000)),
            BiddingRange {
                min: 8_500_000,
                max: 10_000_000
            }
        );
        assert_eq!(
            bidding_range(9_775_000, 8_500_000, None),
            BiddingRange {
                min: 8_500_000,
                max: 9_775_000
            }
        );
    }

    #[test]
    fn test_zero_reference_has_no_deviation() {
        let market = compare_with_market(0, 0);
        assert_eq!(market.category, PriceCategory::FairlyValued);

        let listed = compare_with_listed(0, 5_000_000);
        assert_eq!(listed.deviation_pct, 0.0);
        assert_eq!(listed.verdict, ListedPriceVerdict::Equal);
    }

    #[test]
    fn test_compare_without_listed_price() {
        let comparison = compare(9_775_000, 8_500_000, None);
        assert!(comparison.listed.is_none());
        assert_eq!(comparison.market.category, PriceCategory::Overvalued);
    }
}
