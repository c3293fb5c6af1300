//! Configuration management for BidMetric services.
//!
//! All BidMetric services share a configuration file at `~/.bidmetric/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (BIDMETRIC_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `BIDMETRIC_LOG_LEVEL` → observability.log_level
//! - `BIDMETRIC_LOG_FORMAT` → observability.log_format
//! - `BIDMETRIC_DATA_DIR` → data.data_dir

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `~/.bidmetric`, or `.bidmetric` when no home directory is known.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".bidmetric"),
        |dirs| dirs.home_dir().join(".bidmetric"),
    )
}

/// `~/.bidmetric/config.json`.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Root configuration shared by BidMetric services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub valuation: ValuationSettings,

    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Read and parse a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay non-empty `BIDMETRIC_*` variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("BIDMETRIC_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.observability.log_level = level;
            }
        }
        if let Ok(format) = std::env::var("BIDMETRIC_LOG_FORMAT") {
            if !format.trim().is_empty() {
                self.observability.log_format = format;
            }
        }
        if let Ok(dir) = std::env::var("BIDMETRIC_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data.data_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// Directory holding reference data files.
    pub fn data_dir(&self) -> PathBuf {
        self.data
            .data_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("data"))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base level; `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to set to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

/// Tunables of the valuation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSettings {
    /// Horizon used when a request omits `forecast_horizon_years`
    #[serde(default = "default_horizon_years")]
    pub default_horizon_years: u32,

    /// Largest accepted forecast horizon
    #[serde(default = "default_max_horizon_years")]
    pub max_horizon_years: u32,

    /// Minimum historical observations for a CAGR estimate
    #[serde(default = "default_min_history_samples")]
    pub min_history_samples: usize,

    /// Upper clamp of the effective growth rate (fraction)
    #[serde(default = "default_max_growth_rate")]
    pub max_growth_rate: f64,

    /// Policy repo rate (%) at which macro adjustment is zero
    #[serde(default = "default_neutral_repo_rate_pct")]
    pub neutral_repo_rate_pct: f64,

    /// Growth change (percentage points) per point of repo rate above neutral
    #[serde(default = "default_repo_rate_sensitivity")]
    pub repo_rate_sensitivity: f64,

    /// Number of explainability factors retained, 1 to [`MAX_TOP_FACTORS`]
    #[serde(default = "default_top_factor_count")]
    pub top_factor_count: usize,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            default_horizon_years: default_horizon_years(),
            max_horizon_years: default_max_horizon_years(),
            min_history_samples: default_min_history_samples(),
            max_growth_rate: default_max_growth_rate(),
            neutral_repo_rate_pct: default_neutral_repo_rate_pct(),
            repo_rate_sensitivity: default_repo_rate_sensitivity(),
            top_factor_count: default_top_factor_count(),
        }
    }
}

/// Reference data location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing `localities.json` and `historical_prices.json`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Most explainability factors a response may carry.
pub const MAX_TOP_FACTORS: usize = 5;

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_horizon_years() -> u32 {
    5
}
fn default_max_horizon_years() -> u32 {
    20
}
fn default_min_history_samples() -> usize {
    2
}
fn default_max_growth_rate() -> f64 {
    0.15
}
fn default_neutral_repo_rate_pct() -> f64 {
    6.5
}
fn default_repo_rate_sensitivity() -> f64 {
    0.25
}
fn default_top_factor_count() -> usize {
    MAX_TOP_FACTORS
}
