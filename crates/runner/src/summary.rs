//! Final experiment summary and comparison against theoretical benchmarks

use chrono::{DateTime, Utc};
use oligopoly_core::{EquilibriumReport, FirmId, FirmSummary, ReplicationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Realized profit of one firm next to its benchmark profits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmBenchmark {
    pub firm: FirmId,
    /// Mean per-round profit across all replications
    pub mean_profit: f64,
    pub nash_profit: Option<f64>,
    pub cooperative_profit: Option<f64>,
    /// Mean profit minus Nash profit
    pub deviation_from_nash: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub replications: Vec<ReplicationResult>,
    /// Per-firm aggregates over every round of every replication
    pub firms: Vec<FirmSummary>,
    pub equilibria: EquilibriumReport,
    pub benchmarks: Vec<FirmBenchmark>,
    /// Mean per-round industry profit
    pub mean_total_profit: f64,
    /// `(π̄ − π_N) / (π_C − π_N)`: 0 at the Nash benchmark, 1 at the cooperative one
    pub collusion_index: Option<f64>,
}

impl ExperimentSummary {
    pub fn new(
        id: Uuid,
        name: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        replications: Vec<ReplicationResult>,
        equilibria: EquilibriumReport,
    ) -> Self {
        let rounds: Vec<_> = replications.iter().flat_map(|r| r.rounds.iter()).collect();

        let firm_ids: Vec<FirmId> = rounds
            .first()
            .map(|r| r.firms.iter().map(|o| o.firm).collect())
            .unwrap_or_default();

        let firms: Vec<FirmSummary> = firm_ids
            .iter()
            .map(|&id| FirmSummary::from_outcomes(id, rounds.iter().flat_map(|r| r.firms.iter())))
            .collect();

        let mean_total_profit = if rounds.is_empty() {
            0.0
        } else {
            rounds.iter().map(|r| r.total_profit()).sum::<f64>() / rounds.len() as f64
        };

        let nash = equilibria.nash.calculable.then_some(&equilibria.nash);
        let cooperative = equilibria
            .cooperative
            .calculable
            .then_some(&equilibria.cooperative);

        let benchmarks = firms
            .iter()
            .map(|summary| {
                let nash_profit = nash.and_then(|e| e.firm(summary.firm)).map(|f| f.profit);
                FirmBenchmark {
                    firm: summary.firm,
                    mean_profit: summary.mean_profit,
                    nash_profit,
                    cooperative_profit: cooperative
                        .and_then(|e| e.firm(summary.firm))
                        .map(|f| f.profit),
                    deviation_from_nash: nash_profit.map(|p| summary.mean_profit - p),
                }
            })
            .collect();

        let collusion_index = match (nash, cooperative) {
            (Some(n), Some(c)) if (c.total_profit - n.total_profit).abs() > 1e-9 => {
                Some((mean_total_profit - n.total_profit) / (c.total_profit - n.total_profit))
            }
            _ => None,
        };

        Self {
            id,
            name,
            started_at,
            finished_at,
            replications,
            firms,
            equilibria,
            benchmarks,
            mean_total_profit,
            collusion_index,
        }
    }

    pub fn firm(&self, firm: FirmId) -> Option<&FirmSummary> {
        self.firms.iter().find(|s| s.firm == firm)
    }

    pub fn total_rounds(&self) -> usize {
        self.replications.iter().map(|r| r.rounds.len()).sum()
    }
}
