//! Configuration validation for BidMetric services.
//!
//! Ensures configuration values are within ranges the valuation engine
//! can work with before any request is served.

use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, ValuationSettings, MAX_TOP_FACTORS};
use crate::logging::LogFormat;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

/// Collapse collected errors into a single result.
fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Err(e) = self.valuation.validate() {
            errors.push(e);
        }

        collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

        let mut errors = Vec::new();
        if !LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(ValidationError::invalid(
                "observability.log_level",
                format!("must be one of {}", LEVELS.join(", ")),
            ));
        }
        if let Err(reason) = self.log_format.parse::<LogFormat>() {
            errors.push(ValidationError::invalid("observability.log_format", reason));
        }
        collect(errors)
    }
}

impl Validate for ValuationSettings {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.max_horizon_years == 0 || self.max_horizon_years > 20 {
            errors.push(ValidationError::invalid(
                "valuation.max_horizon_years",
                "must be between 1 and 20",
            ));
        }
        if self.default_horizon_years == 0 || self.default_horizon_years > self.max_horizon_years {
            errors.push(ValidationError::invalid(
                "valuation.default_horizon_years",
                format!("must be between 1 and {}", self.max_horizon_years),
            ));
        }
        if self.min_history_samples < 2 {
            errors.push(ValidationError::invalid(
                "valuation.min_history_samples",
                "a growth rate needs at least 2 observations",
            ));
        }
        if !(self.max_growth_rate > 0.0 && self.max_growth_rate <= 0.15) {
            errors.push(ValidationError::invalid(
                "valuation.max_growth_rate",
                "must be in (0.0, 0.15]",
            ));
        }
        if !self.neutral_repo_rate_pct.is_finite() || self.neutral_repo_rate_pct < 0.0 {
            errors.push(ValidationError::invalid(
                "valuation.neutral_repo_rate_pct",
                "must be a non-negative percentage",
            ));
        }
        if !self.repo_rate_sensitivity.is_finite() || self.repo_rate_sensitivity < 0.0 {
            errors.push(ValidationError::invalid(
                "valuation.repo_rate_sensitivity",
                "must be non-negative",
            ));
        }
        if !(1..=MAX_TOP_FACTORS).contains(&self.top_factor_count) {
            errors.push(ValidationError::invalid(
                "valuation.top_factor_count",
                format!("must be between 1 and {MAX_TOP_FACTORS}"),
            ));
        }

        collect(errors)
    }
}
