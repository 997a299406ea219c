use serde::{Deserialize, Serialize};

use super::{CompetitionMode, RealizedParameters};
use crate::values::FirmId;

/// Per-firm outcome of one resolved round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirmOutcome {
    pub firm: FirmId,
    /// Submitted decision: quantity under Cournot, price under Bertrand
    pub decision: f64,
    pub price: f64,
    pub quantity: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    /// Demand evaluation had to floor a non-positive argument or clamp a negative result
    #[serde(default)]
    pub domain_clamped: bool,
    /// The decision was substituted after a provider failure
    #[serde(default)]
    pub substituted: bool,
}

/// Message sent by a firm during a communication turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmMessage {
    pub firm: FirmId,
    pub turn: u32,
    pub text: String,
}

/// Result of one round; append-only once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub replication: u32,
    pub round: u32,
    pub mode: CompetitionMode,
    pub firms: Vec<FirmOutcome>,
    /// Quantity-weighted average of per-firm prices
    pub market_price: f64,
    pub total_quantity: f64,
    /// Parameters this outcome was resolved under
    pub parameters: RealizedParameters,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<FirmMessage>,
}

impl RoundResult {
    pub fn outcome(&self, firm: FirmId) -> Option<&FirmOutcome> {
        self.firms.iter().find(|o| o.firm == firm)
    }

    pub fn total_profit(&self) -> f64 {
        self.firms.iter().map(|o| o.profit).sum()
    }

    /// Decisions in firm order
    pub fn decisions(&self) -> Vec<f64> {
        self.firms.iter().map(|o| o.decision).collect()
    }
}

/// Aggregates of one firm over a set of rounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirmSummary {
    pub firm: FirmId,
    pub rounds: u32,
    pub total_profit: f64,
    pub mean_profit: f64,
    pub mean_quantity: f64,
    pub mean_price: f64,
    pub mean_decision: f64,
}

impl FirmSummary {
    /// Aggregate a firm's outcomes
    pub fn from_outcomes<'a>(
        firm: FirmId,
        outcomes: impl IntoIterator<Item = &'a FirmOutcome>,
    ) -> Self {
        let mut rounds = 0u32;
        let mut total_profit = 0.0;
        let mut total_quantity = 0.0;
        let mut total_price = 0.0;
        let mut total_decision = 0.0;

        for outcome in outcomes.into_iter().filter(|o| o.firm == firm) {
            rounds += 1;
            total_profit += outcome.profit;
            total_quantity += outcome.quantity;
            total_price += outcome.price;
            total_decision += outcome.decision;
        }

        let n = rounds.max(1) as f64;
        Self {
            firm,
            rounds,
            total_profit,
            mean_profit: total_profit / n,
            mean_quantity: total_quantity / n,
            mean_price: total_price / n,
            mean_decision: total_decision / n,
        }
    }
}

/// Ordered rounds of one replication plus per-firm aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationResult {
    pub replication: u32,
    pub rounds: Vec<RoundResult>,
    pub firms: Vec<FirmSummary>,
}

impl ReplicationResult {
    pub fn from_rounds(replication: u32, rounds: Vec<RoundResult>) -> Self {
        let firm_ids: Vec<FirmId> = rounds
            .first()
            .map(|r| r.firms.iter().map(|o| o.firm).collect())
            .unwrap_or_default();

        let firms = firm_ids
            .into_iter()
            .map(|id| FirmSummary::from_outcomes(id, rounds.iter().flat_map(|r| r.firms.iter())))
            .collect();

        Self {
            replication,
            rounds,
            firms,
        }
    }

    pub fn summary(&self, firm: FirmId) -> Option<&FirmSummary> {
        self.firms.iter().find(|s| s.firm == firm)
    }

    pub fn total_profit(&self) -> f64 {
        self.firms.iter().map(|s| s.total_profit).sum()
    }
}
