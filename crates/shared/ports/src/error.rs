use oligopoly_core::FirmId;
use thiserror::Error;

/// Failures of an external decision provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{firm} did not answer within {after_ms}ms")]
    Timeout { firm: FirmId, after_ms: u64 },

    #[error("Decision request for {firm} failed: {reason}")]
    Failed { firm: FirmId, reason: String },

    #[error("{firm} returned an unusable decision: {value}")]
    InvalidDecision { firm: FirmId, value: f64 },
}

impl ProviderError {
    pub fn firm(&self) -> FirmId {
        match self {
            ProviderError::Timeout { firm, .. }
            | ProviderError::Failed { firm, .. }
            | ProviderError::InvalidDecision { firm, .. } => *firm,
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
