use serde::{Deserialize, Serialize};

use super::{DemandParams, MarketConfig, ParameterSpec};
use crate::values::FirmId;

/// Concrete cost coefficients: total cost = `linear·q + quadratic·q²`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostParams {
    pub linear: f64,
    pub quadratic: f64,
}

impl CostParams {
    pub fn new(linear: f64, quadratic: f64) -> Self {
        Self { linear, quadratic }
    }

    /// Total cost of producing `quantity`
    pub fn total(&self, quantity: f64) -> f64 {
        self.linear * quantity + self.quadratic * quantity * quantity
    }

    /// Marginal cost at `quantity`
    pub fn marginal(&self, quantity: f64) -> f64 {
        self.linear + 2.0 * self.quadratic * quantity
    }
}

/// Realized values for one firm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealizedFirm {
    pub id: FirmId,
    pub costs: CostParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<DemandParams>,
}

/// Concrete numeric values drawn from every `ParameterSpec` of a market
///
/// Immutable once drawn; the variation policy decides how long one draw is in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedParameters {
    pub demand: DemandParams,
    pub firms: Vec<RealizedFirm>,
}

impl RealizedParameters {
    /// Resolve every spec of `config` through `draw`
    ///
    /// Draw order is fixed: market demand, then each firm's linear and quadratic cost
    /// in id order, then firm demand overrides in id order. Costs are floored at 0.
    pub fn from_config_with<F>(config: &MarketConfig, mut draw: F) -> Self
    where
        F: FnMut(&ParameterSpec) -> f64,
    {
        let demand = config.demand.resolve_with(&mut draw);

        let costs: Vec<CostParams> = config
            .firms
            .iter()
            .map(|firm| {
                let linear = draw(&firm.linear_cost).max(0.0);
                let quadratic = draw(&firm.quadratic_cost).max(0.0);
                CostParams { linear, quadratic }
            })
            .collect();

        let firms = config
            .firms
            .iter()
            .zip(costs)
            .map(|(firm, costs)| RealizedFirm {
                id: firm.id,
                costs,
                demand: firm.demand.as_ref().map(|d| d.resolve_with(&mut draw)),
            })
            .collect();

        Self { demand, firms }
    }

    /// All parameters at their central values
    pub fn central(config: &MarketConfig) -> Self {
        Self::from_config_with(config, ParameterSpec::central_value)
    }

    pub fn num_firms(&self) -> usize {
        self.firms.len()
    }

    pub fn firm(&self, id: FirmId) -> Option<&RealizedFirm> {
        self.firms.iter().find(|f| f.id == id)
    }

    /// Demand faced by the firm at `index`: its override if present, else the market's
    pub fn demand_for(&self, index: usize) -> DemandParams {
        self.firms
            .get(index)
            .and_then(|f| f.demand)
            .unwrap_or(self.demand)
    }

    /// Returns true if every firm faces the market demand
    pub fn has_common_demand(&self) -> bool {
        self.firms.iter().all(|f| f.demand.is_none())
    }

    /// Returns true if all firms share identical cost coefficients
    pub fn has_symmetric_costs(&self) -> bool {
        match self.firms.first() {
            Some(first) => self.firms.iter().all(|f| f.costs == first.costs),
            None => true,
        }
    }
}
