//! Benchmark dispatch and evaluation.

use oligopoly_core::{
    CompetitionMode, EquilibriumKind, EquilibriumReport, EquilibriumResult, FirmEquilibrium,
    FirmId, MarketConfig, RealizedParameters,
};
use oligopoly_market::{aggregate_price, resolve_outcome};

use crate::error::{Result, SolverError};
use crate::homogeneous;
use crate::limit_pricing::analyze_limit_pricing;
use crate::linear::{self, AffineMarket};
use crate::symmetric;

/// Raw output of a sub-solver before it is evaluated against the market
pub(crate) enum Solution {
    /// A decision profile (quantities or prices) to run through the market resolver
    ///
    /// `interior` marks a root of unconstrained first-order conditions: a firm left
    /// without sales there did not satisfy its own condition.
    Decisions {
        decisions: Vec<f64>,
        clamped: Vec<FirmId>,
        interior: bool,
    },
    /// Explicit prices and quantities, for winner-take-all outcomes the resolver
    /// would split as ties
    Allocation {
        prices: Vec<f64>,
        quantities: Vec<f64>,
    },
}

/// Nash, cooperative and limit-pricing benchmarks for `config`
///
/// Stochastic parameters are taken at their central values. Invalid configurations
/// yield non-calculable results carrying the validation message.
pub fn compute_equilibria(config: &MarketConfig) -> EquilibriumReport {
    if let Err(e) = config.validate() {
        let reason = SolverError::InvalidConfig(e.to_string()).to_string();
        return EquilibriumReport {
            nash: EquilibriumResult::not_calculable(EquilibriumKind::Nash, reason.clone()),
            cooperative: EquilibriumResult::not_calculable(EquilibriumKind::Cooperative, reason),
            limit_pricing: None,
        };
    }

    let params = RealizedParameters::central(config);
    let report = EquilibriumReport {
        nash: solve_nash(config.mode, config.gamma, &params),
        cooperative: solve_cooperative(config.mode, config.gamma, &params),
        limit_pricing: analyze_limit_pricing(config),
    };

    log::info!(
        "Equilibria for {} firms ({:?}, γ={}): Nash {}, cooperative {}",
        config.num_firms(),
        config.mode,
        config.gamma,
        describe(&report.nash),
        describe(&report.cooperative)
    );
    report
}

/// Nash equilibrium at concrete parameter values
pub fn solve_nash(
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> EquilibriumResult {
    finish(EquilibriumKind::Nash, mode, gamma, params)
}

/// Joint-profit maximum at concrete parameter values
pub fn solve_cooperative(
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> EquilibriumResult {
    finish(EquilibriumKind::Cooperative, mode, gamma, params)
}

fn finish(
    kind: EquilibriumKind,
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> EquilibriumResult {
    match solve(kind, mode, gamma, params).and_then(|s| evaluate(kind, mode, gamma, params, s)) {
        Ok(result) => {
            if result.is_approximation() {
                log::warn!(
                    "{} solution clamped for {:?}; reporting an approximation",
                    kind,
                    result.clamped_firms
                );
            }
            result
        }
        Err(e) => {
            log::debug!("{} equilibrium not calculable: {}", kind, e);
            EquilibriumResult::not_calculable(kind, e.to_string())
        }
    }
}

fn solve(
    kind: EquilibriumKind,
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> Result<Solution> {
    let homogeneous = gamma >= 1.0;

    if mode == CompetitionMode::Bertrand && homogeneous {
        return match kind {
            EquilibriumKind::Nash => homogeneous::bertrand_nash(params),
            EquilibriumKind::Cooperative => homogeneous::bertrand_cooperative(params),
        };
    }

    if linear::linear_terms(params).is_some() {
        return match kind {
            EquilibriumKind::Nash => {
                let (matrix, rhs) = AffineMarket::new(mode, gamma, params)?.nash_system();
                linear::solve_clamped(matrix, rhs, params)
            }
            // Joint output is determined but its split is not: share it at the corner
            EquilibriumKind::Cooperative
                if mode == CompetitionMode::Cournot
                    && homogeneous
                    && params.has_common_demand()
                    && params.firms.iter().all(|f| f.costs.quadratic == 0.0) =>
            {
                homogeneous::cournot_cooperative(params)
            }
            EquilibriumKind::Cooperative => linear::cooperative(mode, gamma, params),
        };
    }

    match mode {
        CompetitionMode::Cournot => symmetric::cournot(kind, gamma, params),
        CompetitionMode::Bertrand => symmetric::bertrand(gamma, params),
    }
}

fn evaluate(
    kind: EquilibriumKind,
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
    solution: Solution,
) -> Result<EquilibriumResult> {
    let (firms, clamped_firms) = match solution {
        Solution::Decisions {
            decisions,
            mut clamped,
            interior,
        } => {
            let outcome = resolve_outcome(mode, gamma, &decisions, params)?;
            if interior {
                for o in &outcome.firms {
                    if (o.domain_clamped || o.quantity <= 0.0) && !clamped.contains(&o.firm) {
                        clamped.push(o.firm);
                    }
                }
            }
            let firms = outcome
                .firms
                .iter()
                .map(|o| FirmEquilibrium {
                    firm: o.firm,
                    quantity: o.quantity,
                    price: o.price,
                    profit: o.profit,
                })
                .collect();
            (firms, clamped)
        }
        Solution::Allocation { prices, quantities } => {
            let firms = params
                .firms
                .iter()
                .zip(prices.iter().zip(&quantities))
                .map(|(firm, (&price, &quantity))| FirmEquilibrium {
                    firm: firm.id,
                    quantity,
                    price,
                    profit: price * quantity - firm.costs.total(quantity),
                })
                .collect();
            (firms, Vec::new())
        }
    };

    Ok(summarize(kind, firms, clamped_firms))
}

fn summarize(
    kind: EquilibriumKind,
    firms: Vec<FirmEquilibrium>,
    clamped_firms: Vec<FirmId>,
) -> EquilibriumResult {
    let prices: Vec<f64> = firms.iter().map(|f| f.price).collect();
    let quantities: Vec<f64> = firms.iter().map(|f| f.quantity).collect();

    EquilibriumResult {
        kind,
        calculable: true,
        reason: None,
        market_price: aggregate_price(&prices, &quantities),
        total_quantity: quantities.iter().sum(),
        total_profit: firms.iter().map(|f| f.profit).sum(),
        firms,
        clamped_firms,
    }
}

fn describe(result: &EquilibriumResult) -> String {
    if result.calculable {
        format!(
            "price {:.4}, quantity {:.4}, profit {:.4}",
            result.market_price, result.total_quantity, result.total_profit
        )
    } else {
        format!("not calculable ({})", result.reason.as_deref().unwrap_or("unknown"))
    }
}
