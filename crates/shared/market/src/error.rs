//! Market resolution errors

use oligopoly_core::FirmId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("No decision for {0}")]
    MissingDecision(FirmId),

    #[error("Decision for {firm} is not a finite number: {value}")]
    NonFiniteDecision { firm: FirmId, value: f64 },

    #[error("Expected {expected} decisions, got {found}")]
    DecisionCountMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, MarketError>;
