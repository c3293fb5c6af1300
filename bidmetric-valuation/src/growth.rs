//! Historical Growth Estimator.
//!
//! Derives a compound annual growth rate from a locality's rate history.
//! Sparse or noisy history can produce implausible CAGR values, so every
//! rate leaving this module is clamped to `[0.0, max_rate]`.

use chrono::NaiveDate;

use bidmetric_common::util::round_to;

use crate::locality::LocalityProfile;
use crate::types::{AppreciationMetrics, HistoricalRecord};

/// Absolute bounds of any growth rate used for compounding.
pub const MIN_GROWTH_RATE: f64 = 0.0;
pub const MAX_GROWTH_RATE: f64 = 0.15;

/// Minimum number of observations for a CAGR estimate.
pub const MIN_HISTORY_SAMPLES: usize = 2;

/// Minimum span, in days, between first and last observation.
const MIN_SPAN_DAYS: i64 = 365;

const DAYS_PER_YEAR: f64 = 365.25;

/// Where the estimated rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthSource {
    /// History of the locality itself
    Locality,
    /// History of the surrounding zone
    Zone,
    /// Profile baseline growth rate
    ProfileFallback,
}

/// Result of a growth estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthEstimate {
    /// Clamped rate, safe for compounding
    pub growth_rate: f64,
    /// Rate before clamping
    pub raw_rate: f64,
    /// Observations behind the estimate. On profile fallback, the usable
    /// locality observations, always below the required minimum.
    pub sample_size: usize,
    pub source: GrowthSource,
}

impl GrowthEstimate {
    pub fn was_clamped(&self) -> bool {
        (self.growth_rate - self.raw_rate).abs() > f64::EPSILON
    }
}

/// Growth rate after the macro adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroAdjustedRate {
    pub effective_rate: f64,
    /// Rate before the macro adjustment
    pub base_rate: f64,
}

impl MacroAdjustedRate {
    pub fn adjustment(&self) -> f64 {
        self.effective_rate - self.base_rate
    }
}

/// Estimates locality growth from historical records.
#[derive(Debug, Clone)]
pub struct GrowthEstimator {
    min_samples: usize,
    max_rate: f64,
}

impl GrowthEstimator {
    pub fn new(min_samples: usize, max_rate: f64) -> Self {
        Self {
            min_samples: min_samples.max(MIN_HISTORY_SAMPLES),
            max_rate: max_rate.clamp(MIN_GROWTH_RATE, MAX_GROWTH_RATE),
        }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Clamp a rate to the plausible range.
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            return MIN_GROWTH_RATE;
        }
        rate.clamp(MIN_GROWTH_RATE, self.max_rate)
    }

    /// Estimate the CAGR for a locality.
    ///
    /// Records are matched by `locality_id` or by the resolved profile's
    /// names. When those are too few and a zone is given, zone records are
    /// used instead. Otherwise the profile's baseline growth rate applies.
    pub fn estimate_cagr(
        &self,
        records: &[HistoricalRecord],
        locality_id: &str,
        profile: &LocalityProfile,
        zone: Option<&str>,
    ) -> GrowthEstimate {
        let locality_series = locality_series(records, locality_id, profile);

        if let Some((rate, samples)) = self.cagr(&locality_series) {
            return self.estimate(rate, samples, GrowthSource::Locality);
        }

        if let Some(zone) = zone.map(str::trim).filter(|z| !z.is_empty()) {
            let zone_series = usable_series(records, |r| r.zone.trim().eq_ignore_ascii_case(zone));
            if let Some((rate, samples)) = self.cagr(&zone_series) {
                tracing::debug!(
                    locality = %locality_id,
                    zone = %zone,
                    samples,
                    "Locality history insufficient, using zone history"
                );
                return self.estimate(rate, samples, GrowthSource::Zone);
            }
        }

        tracing::debug!(
            locality = %locality_id,
            observations = locality_series.len(),
            fallback_rate = profile.baseline_growth_rate,
            "Insufficient history, using profile growth rate"
        );
        // a series long enough but too short in time still lacks one sample
        let observed = locality_series.len().min(self.min_samples - 1);
        self.estimate(profile.baseline_growth_rate, observed, GrowthSource::ProfileFallback)
    }

    /// Past appreciation of a locality, from its first to its last observation.
    ///
    /// `None` with fewer than two usable observations. Unlike
    /// [`estimate_cagr`](Self::estimate_cagr), the CAGR is reported unclamped
    /// and any span is accepted; a zero span reports a CAGR of 0.
    pub fn appreciation(
        &self,
        records: &[HistoricalRecord],
        locality_id: &str,
        profile: &LocalityProfile,
    ) -> Option<AppreciationMetrics> {
        let series = locality_series(records, locality_id, profile);
        if series.len() < 2 {
            return None;
        }
        let (first_date, _) = *series.first()?;
        let (last_date, _) = *series.last()?;
        let first_rate = mean_on(&series, first_date)?;
        let last_rate = mean_on(&series, last_date)?;

        let years = (last_date - first_date).num_days() as f64 / DAYS_PER_YEAR;
        let total = (last_rate / first_rate - 1.0) * 100.0;
        let cagr = if years > 0.0 {
            ((last_rate / first_rate).powf(1.0 / years) - 1.0) * 100.0
        } else {
            0.0
        };

        Some(AppreciationMetrics {
            total_appreciation_pct: round_to(total, 1),
            cagr_pct: round_to(cagr, 1),
            years_of_data: round_to(years, 1),
        })
    }

    fn estimate(&self, raw_rate: f64, sample_size: usize, source: GrowthSource) -> GrowthEstimate {
        GrowthEstimate {
            growth_rate: self.clamp_rate(raw_rate),
            raw_rate,
            sample_size,
            source,
        }
    }

    /// CAGR of a date-sorted series, or `None` when it is too short.
    ///
    /// Observations sharing the first (or last) date are averaged.
    fn cagr(&self, series: &[(NaiveDate, f64)]) -> Option<(f64, usize)> {
        if series.len() < self.min_samples {
            return None;
        }
        let (first_date, _) = *series.first()?;
        let (last_date, _) = *series.last()?;

        let span_days = (last_date - first_date).num_days();
        if span_days < MIN_SPAN_DAYS {
            return None;
        }

        let first_rate = mean_on(series, first_date)?;
        let last_rate = mean_on(series, last_date)?;
        let years = span_days as f64 / DAYS_PER_YEAR;

        let rate = (last_rate / first_rate).powf(1.0 / years) - 1.0;
        rate.is_finite().then_some((rate, series.len()))
    }

    /// Apply the policy repo rate adjustment and clamp again.
    ///
    /// Every point of repo rate above `neutral_repo_rate_pct` lowers growth
    /// by `sensitivity` percentage points, and vice versa.
    pub fn apply_macro(
        &self,
        growth_rate: f64,
        policy_repo_rate_pct: Option<f64>,
        neutral_repo_rate_pct: f64,
        sensitivity: f64,
    ) -> MacroAdjustedRate {
        let base_rate = self.clamp_rate(growth_rate);
        let effective_rate = match policy_repo_rate_pct {
            Some(repo) if repo.is_finite() => {
                let adjustment = -(repo - neutral_repo_rate_pct) * sensitivity / 100.0;
                self.clamp_rate(base_rate + adjustment)
            }
            _ => base_rate,
        };

        MacroAdjustedRate {
            effective_rate,
            base_rate,
        }
    }
}

impl Default for GrowthEstimator {
    fn default() -> Self {
        Self::new(MIN_HISTORY_SAMPLES, MAX_GROWTH_RATE)
    }
}

/// Observations recorded under the locality id or the profile's names.
fn locality_series(
    records: &[HistoricalRecord],
    locality_id: &str,
    profile: &LocalityProfile,
) -> Vec<(NaiveDate, f64)> {
    usable_series(records, |r| {
        r.area_name.trim().eq_ignore_ascii_case(locality_id.trim())
            || profile.answers_to(&r.area_name)
    })
}

/// Positive, finite observations matching `filter`, sorted by date.
fn usable_series<F>(records: &[HistoricalRecord], filter: F) -> Vec<(NaiveDate, f64)>
where
    F: Fn(&HistoricalRecord) -> bool,
{
    let mut series: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter(|r| r.rate_per_sqft.is_finite() && r.rate_per_sqft > 0.0)
        .filter(|r| filter(r))
        .map(|r| (r.observed_at, r.rate_per_sqft))
        .collect();
    series.sort_by_key(|(date, _)| *date);
    series
}

fn mean_on(series: &[(NaiveDate, f64)], date: NaiveDate) -> Option<f64> {
    let rates: Vec<f64> = series
        .iter()
        .filter(|(d, _)| *d == date)
        .map(|(_, rate)| *rate)
        .collect();
    if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}
