//! Myopic best response: the decision maximizing one firm's profit when its rivals'
//! decisions are held fixed.

use oligopoly_core::{CompetitionMode, FirmId, RealizedParameters};

use crate::demand;
use crate::error::{MarketError, Result};
use crate::numeric;
use crate::resolver::resolve_outcome;

/// Price decrement used to undercut a rival under homogeneous Bertrand competition
pub const UNDERCUT_STEP: f64 = 0.01;

const SEARCH_TOLERANCE: f64 = 1e-9;
const MAX_SEARCH_BOUND: f64 = 1e6;

/// Best reply of the firm at `firm_index` to the other entries of `decisions`
///
/// The firm's own entry in `decisions` is ignored.
pub fn best_response(
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
    firm_index: usize,
    decisions: &[f64],
) -> Result<f64> {
    if firm_index >= params.num_firms() {
        return Err(MarketError::MissingDecision(FirmId::from_index(firm_index)));
    }
    // Validates the rival profile once so the search can treat failures as -inf
    resolve_outcome(mode, gamma, decisions, params)?;

    let mut profile = decisions.to_vec();
    let mut profit_at = |x: f64| {
        profile[firm_index] = x;
        resolve_outcome(mode, gamma, &profile, params)
            .map(|o| o.firms[firm_index].profit)
            .unwrap_or(f64::NEG_INFINITY)
    };

    let demand = params.demand_for(firm_index);
    let costs = params.firms[firm_index].costs;

    let choice = match mode {
        CompetitionMode::Cournot => {
            let bound = demand::direct_demand(&demand, costs.linear.max(1e-3))
                .value
                .clamp(1.0, MAX_SEARCH_BOUND);
            numeric::maximize(&mut profit_at, 0.0, bound, SEARCH_TOLERANCE)
        }
        CompetitionMode::Bertrand => {
            let bound = demand::inverse_demand(&demand, 1e-3)
                .value
                .min(MAX_SEARCH_BOUND)
                .max(costs.linear + 1.0);

            if gamma >= 1.0 {
                homogeneous_reply(&mut profit_at, decisions, firm_index, bound)
            } else {
                numeric::maximize(&mut profit_at, 0.0, bound, SEARCH_TOLERANCE)
            }
        }
    };

    Ok(choice)
}

/// Discontinuous payoff: compare the best price below the lowest rival against
/// undercutting it by one step and matching it.
fn homogeneous_reply<F>(profit_at: &mut F, decisions: &[f64], firm_index: usize, bound: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let lowest_rival = decisions
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != firm_index)
        .map(|(_, &p)| p)
        .fold(f64::INFINITY, f64::min);

    // Optimum while strictly below every rival, i.e. serving the whole market
    let monopoly = numeric::maximize(
        &mut *profit_at,
        0.0,
        bound.min(lowest_rival - UNDERCUT_STEP).max(0.0),
        SEARCH_TOLERANCE,
    );

    let candidates = [
        monopoly,
        (lowest_rival - UNDERCUT_STEP).max(0.0),
        lowest_rival,
    ];

    let mut best = candidates[0];
    let mut best_profit = f64::NEG_INFINITY;
    for candidate in candidates.into_iter().filter(|c| c.is_finite()) {
        let profit = profit_at(candidate);
        if profit > best_profit {
            best = candidate;
            best_profit = profit;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use oligopoly_core::{CostParams, DemandParams, RealizedFirm};

    fn linear_params(costs: &[(f64, f64)]) -> RealizedParameters {
        RealizedParameters {
            demand: DemandParams::Linear {
                intercept: 100.0,
                slope: 1.0,
            },
            firms: costs
                .iter()
                .enumerate()
                .map(|(i, &(c, d))| RealizedFirm {
                    id: FirmId::from_index(i),
                    costs: CostParams::new(c, d),
                    demand: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_cournot_reaction_function() {
        let p = linear_params(&[(10.0, 0.0), (10.0, 0.0)]);
        // q_i = (a − c − b·q_j) / 2b
        let q = best_response(CompetitionMode::Cournot, 1.0, &p, 0, &[0.0, 30.0]).unwrap();
        assert_abs_diff_eq!(q, 30.0, epsilon = 1e-5);

        let q = best_response(CompetitionMode::Cournot, 1.0, &p, 1, &[50.0, 0.0]).unwrap();
        assert_abs_diff_eq!(q, 20.0, epsilon = 1e-5);
    }

    #[test]
    fn test_cournot_reaction_with_quadratic_cost() {
        let p = linear_params(&[(10.0, 0.5), (10.0, 0.0)]);
        // q_i = (a − c − q_j) / (2 + 2d)
        let q = best_response(CompetitionMode::Cournot, 1.0, &p, 0, &[0.0, 30.0]).unwrap();
        assert_abs_diff_eq!(q, 20.0, epsilon = 1e-5);
    }

    #[test]
    fn test_differentiated_bertrand_reaction() {
        let p = linear_params(&[(10.0, 0.0), (10.0, 0.0)]);
        // p_i = (a(1−γ) + γ·p_j + c) / 2
        let price = best_response(CompetitionMode::Bertrand, 0.5, &p, 0, &[0.0, 40.0]).unwrap();
        assert_abs_diff_eq!(price, 40.0, epsilon = 1e-5);
    }

    #[test]
    fn test_homogeneous_bertrand_undercuts() {
        let p = linear_params(&[(10.0, 0.0), (10.0, 0.0)]);
        let price = best_response(CompetitionMode::Bertrand, 1.0, &p, 0, &[0.0, 40.0]).unwrap();
        assert_abs_diff_eq!(price, 40.0 - UNDERCUT_STEP, epsilon = 1e-9);
    }

    #[test]
    fn test_homogeneous_bertrand_monopoly_price_when_rival_is_high() {
        let p = linear_params(&[(10.0, 0.0), (10.0, 0.0)]);
        let price = best_response(CompetitionMode::Bertrand, 1.0, &p, 0, &[0.0, 80.0]).unwrap();
        assert_abs_diff_eq!(price, 55.0, epsilon = 1e-4);
    }

    #[test]
    fn test_unknown_firm() {
        let p = linear_params(&[(10.0, 0.0), (10.0, 0.0)]);
        assert_eq!(
            best_response(CompetitionMode::Cournot, 1.0, &p, 5, &[1.0, 1.0]),
            Err(MarketError::MissingDecision(FirmId(6)))
        );
    }
}
