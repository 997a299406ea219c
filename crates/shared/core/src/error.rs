//! Configuration errors
//!
//! Raised before any run starts; nothing in a running experiment produces these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Differentiation parameter gamma must lie in [0, 1], got {0}")]
    GammaOutOfRange(f64),

    #[error("At least 2 firms are required, got {0}")]
    TooFewFirms(usize),

    #[error("Firm at position {position} has id {found}, expected {expected}")]
    FirmIdOutOfOrder {
        position: usize,
        expected: u32,
        found: u32,
    },

    #[error("Round count must be at least 1")]
    ZeroRounds,

    #[error("Replication count must be at least 1")]
    ZeroReplications,

    #[error("Failed to read config {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
