//! Adapter for configurations persisted before firms became a single ordered list
//!
//! Older configurations carry `firm1Info`/`firm2Info` next to (or instead of) `firms`,
//! with cost coefficients given either as plain numbers or as distributions. They are
//! converted once, here; nothing downstream knows about the old shape.

use serde::{Deserialize, Serialize};

use super::{
    CompetitionMode, DemandFunctionSpec, FirmSpec, MarketConfig, ParameterSpec, VariationPolicy,
};
use crate::error::{ConfigError, Result};
use crate::values::FirmId;

/// Coefficient given either as a bare number or a distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyValue {
    Number(f64),
    Spec(ParameterSpec),
}

impl From<LegacyValue> for ParameterSpec {
    fn from(value: LegacyValue) -> Self {
        match value {
            LegacyValue::Number(v) => ParameterSpec::fixed(v),
            LegacyValue::Spec(spec) => spec,
        }
    }
}

fn zero() -> LegacyValue {
    LegacyValue::Number(0.0)
}

/// Per-firm block of the old format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFirmInfo {
    #[serde(alias = "c", alias = "marginalCost")]
    pub linear_cost: LegacyValue,
    #[serde(alias = "d", default = "zero")]
    pub quadratic_cost: LegacyValue,
    #[serde(alias = "demandFunction", default)]
    pub demand: Option<DemandFunctionSpec>,
}

impl LegacyFirmInfo {
    fn into_firm_spec(self, id: FirmId) -> FirmSpec {
        FirmSpec {
            id,
            linear_cost: self.linear_cost.into(),
            quadratic_cost: self.quadratic_cost.into(),
            demand: self.demand,
        }
    }
}

/// Market configuration in the old persisted format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMarketConfig {
    #[serde(alias = "competitionType")]
    pub mode: CompetitionMode,
    #[serde(alias = "differentiation", default = "homogeneous")]
    pub gamma: f64,
    #[serde(alias = "demandFunction")]
    pub demand: DemandFunctionSpec,
    #[serde(default)]
    pub firm1_info: Option<LegacyFirmInfo>,
    #[serde(default)]
    pub firm2_info: Option<LegacyFirmInfo>,
    #[serde(default)]
    pub firms: Vec<LegacyFirmInfo>,
    #[serde(default)]
    pub num_firms: Option<usize>,
    #[serde(alias = "parameterVariation", default)]
    pub variation: VariationPolicy,
    #[serde(alias = "rounds")]
    pub total_rounds: u32,
    #[serde(alias = "replications", default = "one")]
    pub num_replications: u32,
}

fn homogeneous() -> f64 {
    1.0
}

fn one() -> u32 {
    1
}

impl LegacyMarketConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Convert to the canonical configuration
    ///
    /// A non-empty `firms` list wins over `firm1Info`/`firm2Info`. When `numFirms`
    /// exceeds the firms found, the list is grown with symmetric defaults.
    pub fn into_market_config(self) -> Result<MarketConfig> {
        let infos: Vec<LegacyFirmInfo> = if !self.firms.is_empty() {
            self.firms
        } else {
            [self.firm1_info, self.firm2_info]
                .into_iter()
                .flatten()
                .collect()
        };

        let firms: Vec<FirmSpec> = infos
            .into_iter()
            .enumerate()
            .map(|(idx, info)| info.into_firm_spec(FirmId::from_index(idx)))
            .collect();

        let mut config = MarketConfig {
            mode: self.mode,
            gamma: self.gamma,
            demand: self.demand,
            firms,
            variation: self.variation,
            rounds: self.total_rounds,
            replications: self.num_replications,
        };

        if let Some(n) = self.num_firms {
            if n != config.num_firms() {
                config = config.with_firm_count(n);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<LegacyMarketConfig> for MarketConfig {
    type Error = ConfigError;

    fn try_from(legacy: LegacyMarketConfig) -> Result<Self> {
        legacy.into_market_config()
    }
}
