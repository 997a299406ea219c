//! Market Resolver
//!
//! Turns one round's decisions into per-firm price, quantity, revenue, cost and
//! profit. Under Cournot a decision is a quantity; under Bertrand it is a price.
//! With per-firm demand overrides Cournot prices may differ across firms.

use std::collections::BTreeMap;

use oligopoly_core::{
    CompetitionMode, FirmId, FirmOutcome, MarketConfig, RealizedParameters, RoundResult,
};

use crate::demand::{self, Evaluated};
use crate::error::{MarketError, Result};

/// Resolved market for one decision profile
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOutcome {
    pub firms: Vec<FirmOutcome>,
    pub market_price: f64,
    pub total_quantity: f64,
}

impl MarketOutcome {
    pub fn total_profit(&self) -> f64 {
        self.firms.iter().map(|f| f.profit).sum()
    }
}

/// Quantity-weighted average price; simple average when nothing is sold
pub fn aggregate_price(prices: &[f64], quantities: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    let total: f64 = quantities.iter().sum();
    if total > 0.0 {
        prices.iter().zip(quantities).map(|(p, q)| p * q).sum::<f64>() / total
    } else {
        prices.iter().sum::<f64>() / prices.len() as f64
    }
}

/// Resolve a decision profile given in firm order
pub fn resolve_outcome(
    mode: CompetitionMode,
    gamma: f64,
    decisions: &[f64],
    params: &RealizedParameters,
) -> Result<MarketOutcome> {
    let n = params.num_firms();
    if decisions.len() != n {
        return Err(MarketError::DecisionCountMismatch {
            expected: n,
            found: decisions.len(),
        });
    }
    for (firm, &value) in params.firms.iter().zip(decisions) {
        if !value.is_finite() {
            return Err(MarketError::NonFiniteDecision {
                firm: firm.id,
                value,
            });
        }
    }

    // Negative decisions are outside every demand domain
    let inputs: Vec<f64> = decisions.iter().map(|d| d.max(0.0)).collect();

    let (prices, quantities): (Vec<Evaluated>, Vec<Evaluated>) = match mode {
        CompetitionMode::Cournot => {
            let total: f64 = inputs.iter().sum();
            let prices = inputs
                .iter()
                .enumerate()
                .map(|(i, &q)| demand::cournot_price(&params.demand_for(i), q, total - q, gamma))
                .collect();
            let quantities = inputs
                .iter()
                .map(|&q| Evaluated {
                    value: q,
                    clamped: false,
                })
                .collect();
            (prices, quantities)
        }
        CompetitionMode::Bertrand => {
            let demands: Vec<_> = (0..n).map(|i| params.demand_for(i)).collect();
            let quantities = demand::bertrand_quantities(&demands, &inputs, gamma);
            let prices = inputs
                .iter()
                .map(|&p| Evaluated {
                    value: p,
                    clamped: false,
                })
                .collect();
            (prices, quantities)
        }
    };

    let firms: Vec<FirmOutcome> = params
        .firms
        .iter()
        .enumerate()
        .map(|(i, firm)| {
            let price = prices[i].value;
            let quantity = quantities[i].value;
            let revenue = price * quantity;
            let cost = firm.costs.total(quantity);
            FirmOutcome {
                firm: firm.id,
                decision: decisions[i],
                price,
                quantity,
                revenue,
                cost,
                profit: revenue - cost,
                domain_clamped: decisions[i] < 0.0 || prices[i].clamped || quantities[i].clamped,
                substituted: false,
            }
        })
        .collect();

    let price_values: Vec<f64> = firms.iter().map(|f| f.price).collect();
    let quantity_values: Vec<f64> = firms.iter().map(|f| f.quantity).collect();

    Ok(MarketOutcome {
        market_price: aggregate_price(&price_values, &quantity_values),
        total_quantity: quantity_values.iter().sum(),
        firms,
    })
}

/// Resolve one round of `config` under `params`
///
/// `decisions` must hold exactly one value per firm.
pub fn resolve_round(
    replication: u32,
    round: u32,
    decisions: &BTreeMap<FirmId, f64>,
    config: &MarketConfig,
    params: &RealizedParameters,
) -> Result<RoundResult> {
    if decisions.len() != params.num_firms() {
        return Err(MarketError::DecisionCountMismatch {
            expected: params.num_firms(),
            found: decisions.len(),
        });
    }

    let ordered = params
        .firms
        .iter()
        .map(|firm| {
            decisions
                .get(&firm.id)
                .copied()
                .ok_or(MarketError::MissingDecision(firm.id))
        })
        .collect::<Result<Vec<f64>>>()?;

    let outcome = resolve_outcome(config.mode, config.gamma, &ordered, params)?;

    log::debug!(
        "Resolved replication {} round {}: price {:.4}, quantity {:.4}, profit {:.4}",
        replication,
        round,
        outcome.market_price,
        outcome.total_quantity,
        outcome.total_profit()
    );

    Ok(RoundResult {
        replication,
        round,
        mode: config.mode,
        firms: outcome.firms,
        market_price: outcome.market_price,
        total_quantity: outcome.total_quantity,
        parameters: params.clone(),
        messages: Vec::new(),
    })
}
