//! Experiment errors

use oligopoly_core::ConfigError;
use oligopoly_market::MarketError;
use oligopoly_ports::ProviderError;
use thiserror::Error;

use crate::status::{Action, ExperimentStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExperimentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot {action} an experiment that is {from}")]
    InvalidTransition {
        from: ExperimentStatus,
        action: Action,
    },

    #[error("Replication {replication} round {round} failed: {source}")]
    RoundFailed {
        replication: u32,
        round: u32,
        source: ProviderError,
    },

    #[error("Market resolution failed: {0}")]
    Market(#[from] MarketError),

    #[error("Experiment was reset")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
