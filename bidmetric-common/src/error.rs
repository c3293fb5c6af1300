//! Shared error type for BidMetric crates.
//!
//! Crate-specific errors convert into [`Error`] at the front-end boundary, so
//! a CLI or transport can map any failure to a status and exit code without
//! knowing where it came from.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reference data missing or unusable
    #[error("Reference data unavailable: {0}")]
    DataUnavailable(String),

    /// Caller sent a request the engine cannot value
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Arithmetic went out of range
    #[error("Computation failed: {0}")]
    Computation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap with a description of what was being done.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self.root() {
            Self::InvalidRequest(_) | Self::Json(_) => 400,
            Self::DataUnavailable(_) => 503,
            _ => 500,
        }
    }

    /// Whether the caller, rather than the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Process exit code for command line front ends.
    pub fn exit_code(&self) -> u8 {
        match self.status_code() {
            400..=499 => 2,
            503 => 3,
            _ => 1,
        }
    }
}
