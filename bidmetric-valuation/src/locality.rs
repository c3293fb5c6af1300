//! Locality Profile Store.
//!
//! Read-only reference data mapping a locality to its base rate, baseline
//! growth rate and volatility class. Resolution never fails: unknown
//! localities get a default profile built from the median of the known ones.

use serde::{Deserialize, Serialize};

use crate::types::VolatilityClass;

/// Identifier of the synthesized default profile.
pub const DEFAULT_LOCALITY_ID: &str = "default";

/// Base rate used when the store holds no profiles at all (INR/sqft).
const EMPTY_STORE_BASE_RATE: f64 = 12_000.0;

/// Growth rate used when the store holds no profiles at all.
const EMPTY_STORE_GROWTH_RATE: f64 = 0.045;

/// Reference record for one locality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityProfile {
    pub locality_id: String,
    pub base_rate_per_sqft: f64,
    /// Fraction, e.g. 0.045
    pub baseline_growth_rate: f64,
    pub volatility_class: VolatilityClass,
    /// Alternate spellings (e.g. "Mira Rd", "Mira Bhayandar")
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl LocalityProfile {
    pub fn new(
        locality_id: impl Into<String>,
        base_rate_per_sqft: f64,
        baseline_growth_rate: f64,
        volatility_class: VolatilityClass,
    ) -> Self {
        Self {
            locality_id: locality_id.into(),
            base_rate_per_sqft,
            baseline_growth_rate,
            volatility_class,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Whether `name` is this locality's id or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.locality_id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn is_usable(&self) -> bool {
        self.base_rate_per_sqft.is_finite()
            && self.base_rate_per_sqft > 0.0
            && self.baseline_growth_rate.is_finite()
    }
}

/// How a locality query was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Alias,
    /// Query contains the locality id or an alias as whole words
    Partial,
    /// Nothing matched; default profile returned
    Default,
}

/// Outcome of a profile lookup.
#[derive(Debug, Clone, Copy)]
pub struct LocalityMatch<'a> {
    pub profile: &'a LocalityProfile,
    pub kind: MatchKind,
}

impl LocalityMatch<'_> {
    pub fn is_resolved(&self) -> bool {
        self.kind != MatchKind::Default
    }
}

/// Immutable collection of locality profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalityProfileStore {
    profiles: Vec<LocalityProfile>,
    default_profile: LocalityProfile,
}

impl LocalityProfileStore {
    /// Build a store; unusable profiles (non-positive or non-finite rates) are skipped.
    pub fn new(profiles: Vec<LocalityProfile>) -> Self {
        let mut profiles: Vec<LocalityProfile> = profiles
            .into_iter()
            .filter(|p| {
                let usable = p.is_usable();
                if !usable {
                    tracing::warn!(locality = %p.locality_id, "Skipping unusable locality profile");
                }
                usable
            })
            .collect();
        profiles.sort_by(|a, b| a.locality_id.cmp(&b.locality_id));

        let default_profile = build_default_profile(&profiles);

        Self {
            profiles,
            default_profile,
        }
    }

    /// Localities of the Mumbai Metropolitan Region served by the marketplace.
    pub fn mmr_default() -> Self {
        use VolatilityClass::{High, Low, Medium};

        Self::new(vec![
            LocalityProfile::new("Mira Road", 8_500.0, 0.059, Medium)
                .with_aliases(&["Mira Rd", "Mira Road East", "Mira Bhayandar"]),
            LocalityProfile::new("Bhayandar East", 7_200.0, 0.102, High),
            LocalityProfile::new("Dahisar", 10_500.0, 0.06, Medium),
            LocalityProfile::new("Thane West", 15_500.0, 0.072, Low).with_aliases(&["Thane"]),
            LocalityProfile::new("Kandivali East", 17_500.0, 0.065, Medium),
            LocalityProfile::new("Borivali West", 19_000.0, 0.058, Low),
            LocalityProfile::new("Andheri", 22_000.0, 0.045, Low)
                .with_aliases(&["Andheri West", "Andheri East"]),
        ])
    }

    /// Resolve a locality. Never fails.
    ///
    /// Order: exact id, alias, partial match, default profile.
    pub fn resolve(&self, locality_id: &str) -> LocalityMatch<'_> {
        let query = locality_id.trim();

        if let Some(profile) = self
            .profiles
            .iter()
            .find(|p| p.locality_id.eq_ignore_ascii_case(query))
        {
            return LocalityMatch {
                profile,
                kind: MatchKind::Exact,
            };
        }

        if let Some(profile) = self.profiles.iter().find(|p| p.answers_to(query)) {
            return LocalityMatch {
                profile,
                kind: MatchKind::Alias,
            };
        }

        if let Some(profile) = self.partial_match(query) {
            return LocalityMatch {
                profile,
                kind: MatchKind::Partial,
            };
        }

        LocalityMatch {
            profile: &self.default_profile,
            kind: MatchKind::Default,
        }
    }

    /// Profile whose id or alias appears in the query as whole words.
    ///
    /// "Thane West, Majiwada" finds "Thane West"; a fragment such as "West"
    /// finds nothing. The longest matching name wins.
    fn partial_match(&self, query: &str) -> Option<&LocalityProfile> {
        let query = query.to_lowercase();

        self.profiles
            .iter()
            .filter_map(|p| {
                std::iter::once(&p.locality_id)
                    .chain(&p.aliases)
                    .filter(|name| contains_words(&query, &name.to_lowercase()))
                    .map(String::len)
                    .max()
                    .map(|len| (p, len))
            })
            .max_by(|(a, a_len), (b, b_len)| {
                a_len
                    .cmp(b_len)
                    .then_with(|| b.locality_id.cmp(&a.locality_id))
            })
            .map(|(profile, _)| profile)
    }

    /// Median base rate of the known profiles, the neutral reference rate.
    pub fn reference_rate(&self) -> f64 {
        self.default_profile.base_rate_per_sqft
    }

    pub fn default_profile(&self) -> &LocalityProfile {
        &self.default_profile
    }

    pub fn profiles(&self) -> &[LocalityProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for LocalityProfileStore {
    fn default() -> Self {
        Self::mmr_default()
    }
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumerics.
fn contains_words(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn build_default_profile(profiles: &[LocalityProfile]) -> LocalityProfile {
    let rates: Vec<f64> = profiles.iter().map(|p| p.base_rate_per_sqft).collect();
    let growth: Vec<f64> = profiles.iter().map(|p| p.baseline_growth_rate).collect();

    LocalityProfile::new(
        DEFAULT_LOCALITY_ID,
        median(&rates).unwrap_or(EMPTY_STORE_BASE_RATE),
        median(&growth).unwrap_or(EMPTY_STORE_GROWTH_RATE),
        VolatilityClass::Medium,
    )
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let len = sorted.len();
    Some(if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    })
}
