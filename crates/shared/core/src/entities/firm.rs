use serde::{Deserialize, Serialize};

use super::{FirmDemandSpec, ParameterSpec};
use crate::error::Result;
use crate::values::FirmId;

/// Firm configuration
///
/// Total cost is `c·q + d·q²` with `c` = `linear_cost` and `d` = `quadratic_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmSpec {
    pub id: FirmId,
    #[serde(alias = "c")]
    pub linear_cost: ParameterSpec,
    #[serde(alias = "d", default = "zero_cost")]
    pub quadratic_cost: ParameterSpec,
    /// Firm-specific demand, overriding the market demand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<FirmDemandSpec>,
}

fn zero_cost() -> ParameterSpec {
    ParameterSpec::fixed(0.0)
}

impl FirmSpec {
    /// Firm with fixed constant marginal cost
    pub fn new(id: u32, linear_cost: f64) -> Self {
        Self {
            id: FirmId(id),
            linear_cost: ParameterSpec::fixed(linear_cost),
            quadratic_cost: zero_cost(),
            demand: None,
        }
    }

    /// Set the quadratic cost coefficient (builder pattern)
    pub fn with_quadratic_cost(mut self, quadratic_cost: impl Into<ParameterSpec>) -> Self {
        self.quadratic_cost = quadratic_cost.into();
        self
    }

    /// Set the linear cost coefficient (builder pattern)
    pub fn with_linear_cost(mut self, linear_cost: impl Into<ParameterSpec>) -> Self {
        self.linear_cost = linear_cost.into();
        self
    }

    /// Attach a firm-specific demand override (builder pattern)
    pub fn with_demand(mut self, demand: FirmDemandSpec) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.linear_cost
            .validate(&format!("{}.linear_cost", self.id))?;
        self.quadratic_cost
            .validate(&format!("{}.quadratic_cost", self.id))?;
        if let Some(demand) = &self.demand {
            demand.validate(&format!("{}.demand", self.id))?;
        }
        Ok(())
    }
}
