//! Error taxonomy of the valuation engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors raised while valuing a property.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    /// Bad input shape or range. Surfaced to the caller verbatim.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No usable historical or locality data. Recovered with a fallback
    /// and a warning, never returned to the caller as a failure.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Unexpected arithmetic condition (overflow, NaN).
    #[error("Internal computation error: {0}")]
    InternalComputation(String),
}

impl ValuationError {
    /// Message exposed to the caller.
    ///
    /// Internal failures are reported generically; the details go to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::DataUnavailable(msg) => format!("Reference data unavailable: {msg}"),
            Self::InternalComputation(_) => {
                "Valuation failed due to an internal computation error".to_string()
            }
        }
    }

    /// HTTP-equivalent status code.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::DataUnavailable(_) => 503,
            Self::InternalComputation(_) => 500,
        }
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ValuationError> for bidmetric_common::Error {
    fn from(err: ValuationError) -> Self {
        match err {
            ValuationError::Validation(msg) => Self::InvalidRequest(msg),
            ValuationError::DataUnavailable(msg) => Self::DataUnavailable(msg),
            ValuationError::InternalComputation(msg) => Self::Computation(msg),
        }
    }
}
