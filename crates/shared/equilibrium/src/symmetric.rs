//! Symmetric benchmarks for non-linear demand families.
//!
//! With identical firms facing one demand function, each benchmark collapses to a
//! single scalar condition. Cournot solves the symmetric first-order condition
//! `p(kq) + θ·q·p'(kq) = c + 2dq` by bisection, where `k = 1 + (n−1)γ` is the
//! effective-quantity multiplier and the conduct parameter `θ` is 1 for Nash and `k`
//! for joint profit. Differentiated Bertrand allocates each firm a share of demand at
//! its own price only, so both benchmarks maximize the same one-firm profit.

use oligopoly_core::{DemandParams, EquilibriumKind, MIN_POSITIVE, RealizedParameters};
use oligopoly_market::{demand, numeric};

use crate::error::{Result, SolverError};
use crate::solver::Solution;

const ROOT_TOLERANCE: f64 = 1e-10;
const MAX_BRACKET_DOUBLINGS: usize = 60;

/// Derivative of inverse demand at effective quantity `quantity`
fn inverse_demand_slope(params: &DemandParams, quantity: f64) -> f64 {
    let q = quantity.max(MIN_POSITIVE);
    match *params {
        DemandParams::Linear { slope, .. } => -slope,
        DemandParams::Ces { elasticity, .. } => {
            -demand::inverse_demand(params, q).value / (elasticity * q)
        }
        DemandParams::Logit {
            price_coefficient, ..
        } => -price_coefficient / q,
        DemandParams::Exponential { decay, .. } => -decay * demand::inverse_demand(params, q).value,
    }
}

fn check_symmetric(params: &RealizedParameters) -> Result<()> {
    if params.has_common_demand() && params.has_symmetric_costs() {
        Ok(())
    } else {
        Err(SolverError::NoClosedForm(format!(
            "no closed form for {} demand with heterogeneous firms",
            params.demand.family()
        )))
    }
}

fn effective_multiplier(params: &RealizedParameters, gamma: f64) -> f64 {
    1.0 + (params.num_firms() as f64 - 1.0) * gamma
}

pub(crate) fn cournot(
    kind: EquilibriumKind,
    gamma: f64,
    params: &RealizedParameters,
) -> Result<Solution> {
    check_symmetric(params)?;
    let k = effective_multiplier(params, gamma);
    let conduct = match kind {
        EquilibriumKind::Nash => 1.0,
        EquilibriumKind::Cooperative => k,
    };
    let costs = params.firms[0].costs;
    let demand_params = params.demand;

    let condition = |q: f64| {
        let total = k * q;
        demand::inverse_demand(&demand_params, total).value
            + conduct * q * inverse_demand_slope(&demand_params, total)
            - costs.marginal(q)
    };

    let mut upper = 1.0;
    let mut doublings = 0;
    while condition(upper) > 0.0 {
        doublings += 1;
        if doublings > MAX_BRACKET_DOUBLINGS {
            return Err(SolverError::NoRoot(format!(
                "marginal revenue of {} demand stays above marginal cost",
                demand_params.family()
            )));
        }
        upper *= 2.0;
    }

    let q = numeric::bisect(condition, MIN_POSITIVE, upper, ROOT_TOLERANCE).ok_or_else(|| {
        SolverError::NoRoot(format!(
            "marginal revenue of {} demand never exceeds marginal cost",
            demand_params.family()
        ))
    })?;

    Ok(Solution::Decisions {
        decisions: vec![q; params.num_firms()],
        clamped: Vec::new(),
        interior: true,
    })
}

/// Differentiated Bertrand (γ < 1): every firm sells `D(p)/k` at its own price `p`
pub(crate) fn bertrand(gamma: f64, params: &RealizedParameters) -> Result<Solution> {
    check_symmetric(params)?;
    let demand_params = params.demand;
    if let DemandParams::Ces { elasticity, .. } = demand_params {
        if elasticity <= 1.0 {
            return Err(SolverError::NoClosedForm(
                "CES demand with elasticity ≤ 1 has no finite profit-maximizing price"
                    .to_string(),
            ));
        }
    }

    let k = effective_multiplier(params, gamma);
    let costs = params.firms[0].costs;
    let profit = |p: f64| {
        let q = demand::direct_demand(&demand_params, p).value / k;
        p * q - costs.total(q)
    };

    let lower = costs.linear.max(0.0);
    let upper = demand::inverse_demand(&demand_params, 1e-6)
        .value
        .clamp(lower + 1.0, 1e6);
    let price = numeric::maximize(profit, lower, upper, ROOT_TOLERANCE);

    if demand::direct_demand(&demand_params, price).value <= 0.0 {
        return Err(SolverError::NoActiveFirm);
    }

    Ok(Solution::Decisions {
        decisions: vec![price; params.num_firms()],
        clamped: Vec::new(),
        interior: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use oligopoly_core::{CostParams, FirmId, RealizedFirm};

    fn params(demand: DemandParams, n: usize, c: f64) -> RealizedParameters {
        RealizedParameters {
            demand,
            firms: (0..n)
                .map(|i| RealizedFirm {
                    id: FirmId::from_index(i),
                    costs: CostParams::new(c, 0.0),
                    demand: None,
                })
                .collect(),
        }
    }

    fn first_decision(solution: Solution) -> f64 {
        match solution {
            Solution::Decisions { decisions, .. } => decisions[0],
            Solution::Allocation { .. } => panic!("expected decisions"),
        }
    }

    const CES: DemandParams = DemandParams::Ces {
        scale: 100.0,
        elasticity: 2.0,
    };

    #[test]
    fn test_ces_cournot_nash_and_joint() {
        let p = params(CES, 2, 10.0);

        // p·(1 − 1/(σn)) = c ⇒ p = 40/3, Q = (A/p)^σ = 56.25
        let q = first_decision(cournot(EquilibriumKind::Nash, 1.0, &p).unwrap());
        assert_relative_eq!(q, 28.125, max_relative = 1e-8);

        // Joint: p·(1 − 1/σ) = c ⇒ p = 20, Q = 25
        let q = first_decision(cournot(EquilibriumKind::Cooperative, 1.0, &p).unwrap());
        assert_relative_eq!(q, 12.5, max_relative = 1e-8);
    }

    #[test]
    fn test_logit_cournot_nash() {
        let logit = DemandParams::Logit {
            intercept: 20.0,
            price_coefficient: 2.0,
        };
        let p = params(logit, 2, 5.0);
        // a − b·ln(2q) − b/2 = c
        let q = first_decision(cournot(EquilibriumKind::Nash, 1.0, &p).unwrap());
        assert_relative_eq!(q, 7.0_f64.exp() / 2.0, max_relative = 1e-8);
    }

    #[test]
    fn test_exponential_cournot_satisfies_condition() {
        let exp = DemandParams::Exponential {
            scale: 100.0,
            decay: 0.05,
        };
        let p = params(exp, 3, 10.0);
        let q = first_decision(cournot(EquilibriumKind::Nash, 1.0, &p).unwrap());
        let price = 100.0 * (-0.05 * 3.0 * q).exp();
        assert_relative_eq!(price * (1.0 - 0.05 * q), 10.0, max_relative = 1e-6);
    }

    #[test]
    fn test_ces_inelastic_joint_has_no_root() {
        // σ·n ≤ θ: joint marginal revenue is never positive
        let inelastic = DemandParams::Ces {
            scale: 100.0,
            elasticity: 0.8,
        };
        let p = params(inelastic, 2, 10.0);
        assert!(matches!(
            cournot(EquilibriumKind::Cooperative, 1.0, &p),
            Err(SolverError::NoRoot(_))
        ));
    }

    #[test]
    fn test_differentiated_bertrand_markup() {
        let p = params(CES, 3, 10.0);
        let price = first_decision(bertrand(0.5, &p).unwrap());
        assert_relative_eq!(price, 20.0, max_relative = 1e-6);

        let logit = DemandParams::Logit {
            intercept: 20.0,
            price_coefficient: 3.0,
        };
        let p = params(logit, 2, 5.0);
        let price = first_decision(bertrand(0.3, &p).unwrap());
        assert_relative_eq!(price, 8.0, max_relative = 1e-6);
    }

    #[test]
    fn test_heterogeneous_costs_rejected() {
        let mut p = params(CES, 2, 10.0);
        p.firms[1].costs.linear = 12.0;
        assert!(matches!(
            cournot(EquilibriumKind::Nash, 1.0, &p),
            Err(SolverError::NoClosedForm(_))
        ));
    }
}
