use oligopoly_core::{CompetitionMode, CostParams, DemandParams, FirmId, FirmMessage};
use serde::{Deserialize, Serialize};

/// What each firm is told about the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationDisclosure {
    #[serde(default = "yes")]
    pub reveal_demand: bool,
    #[serde(default = "yes")]
    pub reveal_own_costs: bool,
    #[serde(default)]
    pub reveal_rival_costs: bool,
    #[serde(default = "yes")]
    pub reveal_rival_decisions: bool,
}

fn yes() -> bool {
    true
}

impl Default for InformationDisclosure {
    fn default() -> Self {
        Self {
            reveal_demand: true,
            reveal_own_costs: true,
            reveal_rival_costs: false,
            reveal_rival_decisions: true,
        }
    }
}

impl InformationDisclosure {
    /// Everything revealed
    pub fn full() -> Self {
        Self {
            reveal_demand: true,
            reveal_own_costs: true,
            reveal_rival_costs: true,
            reveal_rival_decisions: true,
        }
    }

    /// Only the firm's own past outcomes
    pub fn minimal() -> Self {
        Self {
            reveal_demand: false,
            reveal_own_costs: false,
            reveal_rival_costs: false,
            reveal_rival_decisions: false,
        }
    }
}

/// One earlier round as seen by a firm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round: u32,
    pub own_decision: f64,
    pub own_quantity: f64,
    pub own_price: f64,
    pub own_profit: f64,
    pub market_price: f64,
    /// Empty unless rival decisions are disclosed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rival_decisions: Vec<(FirmId, f64)>,
}

/// Information handed to a decision provider for one firm
///
/// Built before any request of the round is issued, so it only ever holds completed
/// rounds and the current round's messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundContext {
    pub replication: u32,
    pub round: u32,
    pub total_rounds: u32,
    pub mode: CompetitionMode,
    pub num_firms: usize,
    pub gamma: f64,
    pub demand: Option<DemandParams>,
    pub own_costs: Option<CostParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rival_costs: Vec<(FirmId, CostParams)>,
    /// Completed rounds of the current replication, oldest first
    pub history: Vec<HistoryEntry>,
    /// Messages exchanged so far this round
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<FirmMessage>,
}

impl RoundContext {
    pub fn last_round(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    pub fn is_first_round(&self) -> bool {
        self.history.is_empty()
    }
}
