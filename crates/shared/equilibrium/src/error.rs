use oligopoly_market::MarketError;
use thiserror::Error;

/// Why a benchmark could not be computed
///
/// Never returned to callers of `compute_equilibria`; it becomes the `reason` of a
/// non-calculable `EquilibriumResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("the first-order system is singular")]
    Singular,

    #[error("every firm's solution is non-positive")]
    NoActiveFirm,

    #[error("{0}")]
    NoClosedForm(String),

    #[error("the first-order condition has no root: {0}")]
    NoRoot(String),

    #[error("could not evaluate the equilibrium outcome: {0}")]
    Evaluation(#[from] MarketError),
}

pub type Result<T> = std::result::Result<T, SolverError>;
