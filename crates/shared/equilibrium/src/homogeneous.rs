//! Benchmarks for homogeneous products (γ = 1) with constant marginal costs.

use oligopoly_core::{DemandParams, MIN_POSITIVE, RealizedParameters};
use oligopoly_market::{PRICE_TIE_TOLERANCE, demand, numeric};

use crate::error::{Result, SolverError};
use crate::solver::Solution;

/// Profit-maximizing price of a single seller facing `demand` at constant
/// `marginal_cost`
///
/// `None` when no finite price with positive sales maximizes profit (CES with
/// elasticity ≤ 1 or zero cost, or cost at or above the choke price).
pub fn monopoly_price(demand: &DemandParams, marginal_cost: f64) -> Option<f64> {
    let c = marginal_cost;
    match *demand {
        DemandParams::Linear { intercept, .. } => (c < intercept).then(|| 0.5 * (intercept + c)),
        DemandParams::Ces { elasticity, .. } => {
            (elasticity > 1.0 && c > 0.0).then(|| c * elasticity / (elasticity - 1.0))
        }
        DemandParams::Logit {
            price_coefficient, ..
        } => Some(c + price_coefficient),
        DemandParams::Exponential { scale, .. } => {
            if c >= scale {
                return None;
            }
            // ln(A/p) = (p − c)/p
            numeric::bisect(
                |p| (scale / p).ln() - 1.0 + c / p,
                c.max(MIN_POSITIVE),
                scale,
                1e-12,
            )
        }
    }
}

fn check_constant_costs(params: &RealizedParameters) -> Result<()> {
    if !params.has_common_demand() {
        return Err(SolverError::NoClosedForm(
            "homogeneous products require a common demand function".to_string(),
        ));
    }
    if params.firms.iter().any(|f| f.costs.quadratic != 0.0) {
        return Err(SolverError::NoClosedForm(
            "homogeneous products are only solved for constant marginal costs".to_string(),
        ));
    }
    Ok(())
}

/// Lowest linear cost and the indices of every firm tied at it
fn lowest_cost(params: &RealizedParameters) -> (f64, Vec<usize>) {
    let lowest = params
        .firms
        .iter()
        .map(|f| f.costs.linear)
        .fold(f64::INFINITY, f64::min);
    let tied = params
        .firms
        .iter()
        .enumerate()
        .filter(|(_, f)| (f.costs.linear - lowest).abs() <= PRICE_TIE_TOLERANCE)
        .map(|(i, _)| i)
        .collect();
    (lowest, tied)
}

/// Firms in `winners` split the market at `price`; everyone else sells nothing
fn allocation(
    params: &RealizedParameters,
    winners: &[usize],
    price: f64,
    loser_price: impl Fn(usize) -> f64,
) -> Result<Solution> {
    let total = demand::direct_demand(&params.demand, price).value;
    if total <= 0.0 {
        return Err(SolverError::NoActiveFirm);
    }
    let share = total / winners.len() as f64;

    let (prices, quantities): (Vec<f64>, Vec<f64>) = (0..params.num_firms())
        .map(|i| {
            if winners.contains(&i) {
                (price, share)
            } else {
                (loser_price(i), 0.0)
            }
        })
        .unzip();
    Ok(Solution::Allocation { prices, quantities })
}

/// Bertrand–Nash with asymmetric constant costs
///
/// Firms tied at the lowest cost price at cost. A unique lowest-cost firm prices at
/// the second-lowest cost, or at its monopoly price if that is lower, and serves the
/// whole market.
pub(crate) fn bertrand_nash(params: &RealizedParameters) -> Result<Solution> {
    check_constant_costs(params)?;
    let (lowest, tied) = lowest_cost(params);

    let price = if tied.len() > 1 {
        lowest
    } else {
        let second = params
            .firms
            .iter()
            .enumerate()
            .filter(|(i, _)| !tied.contains(i))
            .map(|(_, f)| f.costs.linear)
            .fold(f64::INFINITY, f64::min);
        match monopoly_price(&params.demand, lowest) {
            Some(monopoly) => monopoly.min(second),
            None => second,
        }
    };

    allocation(params, &tied, price, |i| params.firms[i].costs.linear)
}

/// Joint-profit maximum: the lowest-cost plant(s) produce at the monopoly price
pub(crate) fn bertrand_cooperative(params: &RealizedParameters) -> Result<Solution> {
    check_constant_costs(params)?;
    let (lowest, tied) = lowest_cost(params);
    let price = monopoly_price(&params.demand, lowest).ok_or_else(|| {
        SolverError::NoClosedForm(format!(
            "{} demand has no finite monopoly price at marginal cost {lowest}",
            params.demand.family()
        ))
    })?;
    allocation(params, &tied, price, |_| price)
}

/// Multi-plant monopoly for homogeneous Cournot with linear demand: total output
/// `(a − c_min)/2b`, shared by the lowest-cost firms
pub(crate) fn cournot_cooperative(params: &RealizedParameters) -> Result<Solution> {
    check_constant_costs(params)?;
    let DemandParams::Linear { intercept, slope } = params.demand else {
        return Err(SolverError::NoClosedForm("demand is not linear".to_string()));
    };
    let (lowest, tied) = lowest_cost(params);

    let total = (intercept - lowest) / (2.0 * slope);
    if total <= 0.0 {
        return Err(SolverError::NoActiveFirm);
    }
    let share = total / tied.len() as f64;
    let decisions = (0..params.num_firms())
        .map(|i| if tied.contains(&i) { share } else { 0.0 })
        .collect();

    Ok(Solution::Decisions {
        decisions,
        clamped: Vec::new(),
        interior: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use oligopoly_core::{CostParams, FirmId, RealizedFirm};

    fn params(demand: DemandParams, costs: &[f64]) -> RealizedParameters {
        RealizedParameters {
            demand,
            firms: costs
                .iter()
                .enumerate()
                .map(|(i, &c)| RealizedFirm {
                    id: FirmId::from_index(i),
                    costs: CostParams::new(c, 0.0),
                    demand: None,
                })
                .collect(),
        }
    }

    const LINEAR: DemandParams = DemandParams::Linear {
        intercept: 100.0,
        slope: 1.0,
    };

    #[test]
    fn test_monopoly_prices() {
        assert_eq!(monopoly_price(&LINEAR, 10.0), Some(55.0));
        assert_eq!(monopoly_price(&LINEAR, 120.0), None);

        let ces = DemandParams::Ces {
            scale: 10.0,
            elasticity: 3.0,
        };
        assert_relative_eq!(monopoly_price(&ces, 4.0).unwrap(), 6.0);
        let inelastic = DemandParams::Ces {
            scale: 10.0,
            elasticity: 0.8,
        };
        assert_eq!(monopoly_price(&inelastic, 4.0), None);

        let logit = DemandParams::Logit {
            intercept: 20.0,
            price_coefficient: 3.0,
        };
        assert_eq!(monopoly_price(&logit, 5.0), Some(8.0));

        // With zero cost the exponential optimum is A/e
        let exp = DemandParams::Exponential {
            scale: 30.0,
            decay: 0.1,
        };
        assert_relative_eq!(
            monopoly_price(&exp, 0.0).unwrap(),
            30.0 / std::f64::consts::E,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_symmetric_bertrand_prices_at_cost() {
        let p = params(LINEAR, &[10.0, 10.0]);
        match bertrand_nash(&p).unwrap() {
            Solution::Allocation { prices, quantities } => {
                assert_eq!(prices, vec![10.0, 10.0]);
                assert_eq!(quantities, vec![45.0, 45.0]);
            }
            Solution::Decisions { .. } => panic!("expected allocation"),
        }
    }

    #[test]
    fn test_asymmetric_bertrand_limit_price() {
        let p = params(LINEAR, &[10.0, 20.0, 30.0]);
        match bertrand_nash(&p).unwrap() {
            Solution::Allocation { prices, quantities } => {
                assert_eq!(prices[0], 20.0);
                assert_eq!(quantities, vec![80.0, 0.0, 0.0]);
            }
            Solution::Decisions { .. } => panic!("expected allocation"),
        }

        // Rival too costly to matter: monopoly price wins
        let p = params(LINEAR, &[10.0, 90.0]);
        match bertrand_nash(&p).unwrap() {
            Solution::Allocation { prices, .. } => assert_eq!(prices[0], 55.0),
            Solution::Decisions { .. } => panic!("expected allocation"),
        }
    }

    #[test]
    fn test_cournot_multi_plant_monopoly() {
        let p = params(LINEAR, &[10.0, 10.0]);
        match cournot_cooperative(&p).unwrap() {
            Solution::Decisions { decisions, clamped, .. } => {
                assert_eq!(decisions, vec![22.5, 22.5]);
                assert!(clamped.is_empty());
            }
            Solution::Allocation { .. } => panic!("expected decisions"),
        }
    }

    #[test]
    fn test_quadratic_costs_rejected() {
        let mut p = params(LINEAR, &[10.0, 10.0]);
        p.firms[0].costs.quadratic = 0.5;
        assert!(matches!(bertrand_nash(&p), Err(SolverError::NoClosedForm(_))));
    }
}
