use serde::{Deserialize, Serialize};

use crate::values::FirmId;

/// Which benchmark an `EquilibriumResult` describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumKind {
    /// Non-cooperative Nash equilibrium
    Nash,
    /// Joint-profit-maximizing outcome
    Cooperative,
}

impl std::fmt::Display for EquilibriumKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquilibriumKind::Nash => f.write_str("Nash"),
            EquilibriumKind::Cooperative => f.write_str("cooperative"),
        }
    }
}

/// Equilibrium decision and payoff of one firm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirmEquilibrium {
    pub firm: FirmId,
    pub quantity: f64,
    pub price: f64,
    pub profit: f64,
}

/// Theoretical benchmark for a market configuration
///
/// When no closed form exists `calculable` is false, `reason` explains why, and the
/// numeric fields are empty/zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    pub kind: EquilibriumKind,
    pub calculable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub firms: Vec<FirmEquilibrium>,
    pub total_quantity: f64,
    pub market_price: f64,
    pub total_profit: f64,
    /// Firms whose raw solution was negative and clamped to zero; the point is then an
    /// approximation, not a re-solved corner
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clamped_firms: Vec<FirmId>,
}

impl EquilibriumResult {
    /// Benchmark that has no closed form for this configuration
    pub fn not_calculable(kind: EquilibriumKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            calculable: false,
            reason: Some(reason.into()),
            firms: Vec::new(),
            total_quantity: 0.0,
            market_price: 0.0,
            total_profit: 0.0,
            clamped_firms: Vec::new(),
        }
    }

    /// Returns true if some firm's solution was clamped
    pub fn is_approximation(&self) -> bool {
        !self.clamped_firms.is_empty()
    }

    pub fn firm(&self, firm: FirmId) -> Option<&FirmEquilibrium> {
        self.firms.iter().find(|f| f.firm == firm)
    }
}

/// Regime of an asymmetric-cost duopoly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitPricingRegime {
    /// Both firms are active at an interior equilibrium
    Competitive,
    /// The efficient firm prices to keep its rival out
    LimitPricing,
    /// The efficient firm's unconstrained monopoly price already excludes its rival
    Monopoly,
}

impl std::fmt::Display for LimitPricingRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LimitPricingRegime::Competitive => "competitive",
            LimitPricingRegime::LimitPricing => "limit-pricing",
            LimitPricingRegime::Monopoly => "monopoly",
        };
        f.write_str(name)
    }
}

/// Cost-asymmetry classification of a differentiated duopoly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitPricingAnalysis {
    /// Cost gap relative to the efficient firm's demand margin
    pub asymmetry_index: f64,
    /// Lower bound of the limit-pricing interval `[low, high)`
    pub threshold_low: f64,
    pub threshold_high: f64,
    pub regime: LimitPricingRegime,
    /// Firm with the lower marginal cost
    pub efficient_firm: FirmId,
    pub message: String,
}

/// All benchmarks for one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumReport {
    pub nash: EquilibriumResult,
    pub cooperative: EquilibriumResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_pricing: Option<LimitPricingAnalysis>,
}
