use serde::{Deserialize, Serialize};

use super::{DemandFunctionSpec, FirmSpec};
use crate::error::{ConfigError, Result};
use crate::values::FirmId;

/// What firms choose each round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionMode {
    /// Firms choose quantities; price follows from demand
    Cournot,
    /// Firms choose prices; quantities follow from demand allocation
    Bertrand,
}

impl CompetitionMode {
    /// Name of the decision variable
    pub fn decision_label(&self) -> &'static str {
        match self {
            CompetitionMode::Cournot => "quantity",
            CompetitionMode::Bertrand => "price",
        }
    }
}

/// How often realized parameters are redrawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariationPolicy {
    /// One draw for the whole experiment
    #[default]
    Fixed,
    /// New draw at the start of each replication
    PerReplication,
    /// New draw at the start of each round
    PerRound,
}

/// Market configuration for one experiment
///
/// Immutable for the duration of a run. The number of firms N is the length of `firms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub mode: CompetitionMode,
    /// Differentiation: 0 = independent products, 1 = homogeneous
    #[serde(alias = "differentiation")]
    pub gamma: f64,
    pub demand: DemandFunctionSpec,
    pub firms: Vec<FirmSpec>,
    #[serde(default)]
    pub variation: VariationPolicy,
    #[serde(alias = "totalRounds")]
    pub rounds: u32,
    #[serde(alias = "numReplications", default = "default_replications")]
    pub replications: u32,
}

fn default_replications() -> u32 {
    1
}

impl MarketConfig {
    /// Symmetric market: `num_firms` firms with identical fixed costs
    pub fn symmetric(
        mode: CompetitionMode,
        num_firms: usize,
        demand: DemandFunctionSpec,
        linear_cost: f64,
        quadratic_cost: f64,
    ) -> Self {
        let firms = (1..=num_firms as u32)
            .map(|id| FirmSpec::new(id, linear_cost).with_quadratic_cost(quadratic_cost))
            .collect();

        Self {
            mode,
            gamma: 1.0,
            demand,
            firms,
            variation: VariationPolicy::Fixed,
            rounds: 10,
            replications: 1,
        }
    }

    /// Set differentiation (builder pattern)
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set round and replication counts (builder pattern)
    pub fn with_schedule(mut self, rounds: u32, replications: u32) -> Self {
        self.rounds = rounds;
        self.replications = replications;
        self
    }

    /// Set the parameter variation policy (builder pattern)
    pub fn with_variation(mut self, variation: VariationPolicy) -> Self {
        self.variation = variation;
        self
    }

    pub fn num_firms(&self) -> usize {
        self.firms.len()
    }

    pub fn firm_ids(&self) -> impl Iterator<Item = FirmId> + '_ {
        self.firms.iter().map(|f| f.id)
    }

    /// Returns true if any firm carries its own demand
    pub fn has_firm_demand_overrides(&self) -> bool {
        self.firms.iter().any(|f| f.demand.is_some())
    }

    /// Returns true if products are perfectly substitutable
    pub fn is_homogeneous(&self) -> bool {
        self.gamma >= 1.0
    }

    /// Resize the firm list
    ///
    /// Existing firms keep their specs; added firms copy firm 1's cost specs without
    /// any demand override. Ids are renumbered 1..=n.
    pub fn with_firm_count(mut self, n: usize) -> Self {
        let template = self.firms.first().cloned();
        self.firms.truncate(n);
        while self.firms.len() < n {
            let next = match &template {
                Some(first) => FirmSpec {
                    demand: None,
                    ..first.clone()
                },
                None => FirmSpec::new(0, 0.0),
            };
            self.firms.push(next);
        }
        for (idx, firm) in self.firms.iter_mut().enumerate() {
            firm.id = FirmId::from_index(idx);
        }
        self
    }

    /// Validate the configuration; must pass before a run starts
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) || !self.gamma.is_finite() {
            return Err(ConfigError::GammaOutOfRange(self.gamma));
        }
        if self.firms.len() < 2 {
            return Err(ConfigError::TooFewFirms(self.firms.len()));
        }
        if self.rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.replications == 0 {
            return Err(ConfigError::ZeroReplications);
        }

        self.demand.validate("demand")?;

        for (position, firm) in self.firms.iter().enumerate() {
            let expected = FirmId::from_index(position);
            if firm.id != expected {
                return Err(ConfigError::FirmIdOutOfOrder {
                    position,
                    expected: expected.0,
                    found: firm.id.0,
                });
            }
            firm.validate()?;
        }

        Ok(())
    }
}
