//! Logging setup for BidMetric binaries.
//!
//! Everything goes to stderr so stdout stays reserved for JSON responses.
//! `RUST_LOG`, when set, replaces the configured filter entirely.

use std::io::IsTerminal;
use std::str::FromStr;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Library targets held at `warn` regardless of the base level.
pub const QUIET_TARGETS: &[&str] = &["rayon", "rayon_core"];

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable single-line output
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Filter directives: base level, then `target=warn` for each quiet target.
fn filter_directives(level: &str, extra_quiet: &[String]) -> String {
    QUIET_TARGETS
        .iter()
        .map(|t| t.to_string())
        .chain(extra_quiet.iter().cloned())
        .fold(level.trim().to_string(), |mut acc, target| {
            acc.push(',');
            acc.push_str(&target);
            acc.push_str("=warn");
            acc
        })
}

/// Install the global subscriber from the observability config.
///
/// Calling it again after a subscriber is installed has no effect.
pub fn init_from_config(config: &ObservabilityConfig) {
    let format = config.log_format.parse().unwrap_or_default();
    install(&config.log_level, format, &config.excluded_targets);
}

/// Install the global subscriber with a level and format name.
pub fn init_logging(log_level: &str, log_format: &str) {
    install(log_level, log_format.parse().unwrap_or_default(), &[]);
}

fn install(level: &str, format: LogFormat, extra_quiet: &[String]) {
    let directives = filter_directives(level, extra_quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .boxed(),
    };

    if tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!(directives = %directives, format = ?format, "Logging ready");
    }
}

/// New request id, `req_` followed by 32 hex characters.
pub fn generate_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().simple())
}

/// Info-level span carrying a request id, plus optional extra fields.
///
/// ```ignore
/// let span = request_span!("valuation", request_id, locality = %locality);
/// let _enter = span.enter();
/// ```
#[macro_export]
macro_rules! request_span {
    ($name:expr, $request_id:expr) => {
        tracing::info_span!($name, request_id = %$request_id)
    };
    ($name:expr, $request_id:expr, $($field:tt)*) => {
        tracing::info_span!($name, request_id = %$request_id, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let directives = filter_directives(" debug ", &["bidmetric_valuation::loader".to_string()]);
        assert_eq!(
            directives,
            "debug,rayon=warn,rayon_core=warn,bidmetric_valuation::loader=warn"
        );
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!("xml".parse::<LogFormat>().unwrap_or_default(), LogFormat::Pretty);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let first = generate_request_id();
        let second = generate_request_id();
        assert_ne!(first, second);
        assert!(first.starts_with("req_"));
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_logging("warn", "pretty");
        init_from_config(&ObservabilityConfig::default());
    }
}
