//! BidMetric Common - Shared types, utilities, and configuration for BidMetric services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup
//! - Currency and percentage formatting used in valuation output

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{Config, DataConfig, ObservabilityConfig, ValuationSettings, MAX_TOP_FACTORS};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
