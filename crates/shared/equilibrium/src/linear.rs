//! Closed-form benchmarks for linear demand.
//!
//! Both competition modes are written as an affine market: every firm's response
//! (price under Cournot, quantity under Bertrand) is `alpha_i + Σ_j slope_ij·x_j` in
//! the decision vector `x`. First-order conditions of either benchmark are then a
//! linear system in `x`.

use oligopoly_core::{CompetitionMode, DemandParams, RealizedParameters};
use oligopoly_market::numeric;

use crate::error::{Result, SolverError};
use crate::solver::Solution;

pub(crate) struct AffineMarket {
    mode: CompetitionMode,
    alpha: Vec<f64>,
    slopes: Vec<Vec<f64>>,
    linear_costs: Vec<f64>,
    quadratic_costs: Vec<f64>,
}

/// Intercept and slope of every firm's demand, if all are linear
pub(crate) fn linear_terms(params: &RealizedParameters) -> Option<Vec<(f64, f64)>> {
    (0..params.num_firms())
        .map(|i| match params.demand_for(i) {
            DemandParams::Linear { intercept, slope } => Some((intercept, slope)),
            _ => None,
        })
        .collect()
}

impl AffineMarket {
    pub fn new(mode: CompetitionMode, gamma: f64, params: &RealizedParameters) -> Result<Self> {
        let terms = linear_terms(params)
            .ok_or_else(|| SolverError::NoClosedForm("demand is not linear".to_string()))?;
        let n = terms.len();
        let nf = n as f64;

        let (alpha, slopes) = match mode {
            // p_i = a_i − b_i·(q_i + γ·Σ q_j)
            CompetitionMode::Cournot => {
                let alpha = terms.iter().map(|&(a, _)| a).collect();
                let slopes = terms
                    .iter()
                    .enumerate()
                    .map(|(i, &(_, b))| {
                        (0..n)
                            .map(|j| if i == j { -b } else { -gamma * b })
                            .collect()
                    })
                    .collect();
                (alpha, slopes)
            }
            // Singh–Vives inversion of the same system
            CompetitionMode::Bertrand => {
                if gamma >= 1.0 {
                    return Err(SolverError::NoClosedForm(
                        "homogeneous Bertrand has no interior linear system".to_string(),
                    ));
                }
                let mut alpha = Vec::with_capacity(n);
                let mut slopes = Vec::with_capacity(n);
                for (i, &(a, b)) in terms.iter().enumerate() {
                    let denominator = b * (1.0 - gamma) * (1.0 + (nf - 1.0) * gamma);
                    alpha.push(a * (1.0 - gamma) / denominator);
                    slopes.push(
                        (0..n)
                            .map(|j| {
                                if i == j {
                                    -(1.0 + (nf - 2.0) * gamma) / denominator
                                } else {
                                    gamma / denominator
                                }
                            })
                            .collect(),
                    );
                }
                (alpha, slopes)
            }
        };

        Ok(Self {
            mode,
            alpha,
            slopes,
            linear_costs: params.firms.iter().map(|f| f.costs.linear).collect(),
            quadratic_costs: params.firms.iter().map(|f| f.costs.quadratic).collect(),
        })
    }

    fn len(&self) -> usize {
        self.alpha.len()
    }

    /// Every firm's response `alpha_i + Σ_j slope_ij·x_j` to the decision vector
    pub fn respond(&self, x: &[f64]) -> Vec<f64> {
        self.alpha
            .iter()
            .zip(&self.slopes)
            .map(|(a, row)| a + row.iter().zip(x).map(|(s, v)| s * v).sum::<f64>())
            .collect()
    }

    /// Every firm's own first-order condition
    pub fn nash_system(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = self.len();
        let s = &self.slopes;
        let mut matrix = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];

        for i in 0..n {
            let (c, d) = (self.linear_costs[i], self.quadratic_costs[i]);
            match self.mode {
                CompetitionMode::Cournot => {
                    for j in 0..n {
                        matrix[i][j] = s[i][j];
                    }
                    matrix[i][i] += s[i][i] - 2.0 * d;
                    rhs[i] = c - self.alpha[i];
                }
                CompetitionMode::Bertrand => {
                    let weight = 1.0 - 2.0 * d * s[i][i];
                    for j in 0..n {
                        matrix[i][j] = weight * s[i][j];
                    }
                    matrix[i][i] += s[i][i];
                    rhs[i] = s[i][i] * c - weight * self.alpha[i];
                }
            }
        }
        (matrix, rhs)
    }

    /// First-order conditions of total industry profit
    pub fn cooperative_system(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = self.len();
        let s = &self.slopes;
        let mut matrix = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];

        for k in 0..n {
            match self.mode {
                CompetitionMode::Cournot => {
                    for j in 0..n {
                        matrix[k][j] = s[k][j] + s[j][k];
                    }
                    matrix[k][k] -= 2.0 * self.quadratic_costs[k];
                    rhs[k] = self.linear_costs[k] - self.alpha[k];
                }
                CompetitionMode::Bertrand => {
                    for j in 0..n {
                        let curvature: f64 = (0..n)
                            .map(|i| 2.0 * self.quadratic_costs[i] * s[i][k] * s[i][j])
                            .sum();
                        matrix[k][j] = s[k][j] + s[j][k] - curvature;
                    }
                    rhs[k] = -self.alpha[k]
                        + (0..n)
                            .map(|i| {
                                s[i][k] * (self.linear_costs[i] + 2.0 * self.quadratic_costs[i] * self.alpha[i])
                            })
                            .sum::<f64>();
                }
            }
        }
        (matrix, rhs)
    }

    /// Joint-profit maximum over non-negative quantities (Cournot form only)
    ///
    /// Active-set search: the most negative firm of the reduced optimum is shut down
    /// and the rest re-solved; an inactive firm re-enters while its marginal joint
    /// profit at zero output is positive. Firms outside `candidates` start inactive.
    pub fn cooperative_quantities(&self, candidates: Vec<bool>) -> Result<Vec<f64>> {
        let (matrix, rhs) = self.cooperative_system();
        let n = self.len();
        let mut active = candidates;

        for _ in 0..=4 * n {
            let members: Vec<usize> = (0..n).filter(|&i| active[i]).collect();
            let mut quantities = vec![0.0; n];

            if !members.is_empty() {
                let reduced: Vec<Vec<f64>> = members
                    .iter()
                    .map(|&i| members.iter().map(|&j| matrix[i][j]).collect())
                    .collect();
                let reduced_rhs = members.iter().map(|&i| rhs[i]).collect();
                let solved =
                    numeric::solve_linear(reduced, reduced_rhs).ok_or(SolverError::Singular)?;
                if solved.iter().any(|x| !x.is_finite()) {
                    return Err(SolverError::Singular);
                }

                let leaving = solved
                    .iter()
                    .enumerate()
                    .filter(|&(_, &x)| x < 0.0)
                    .min_by(|a, b| a.1.total_cmp(b.1));
                if let Some((position, _)) = leaving {
                    active[members[position]] = false;
                    continue;
                }
                for (&i, x) in members.iter().zip(solved) {
                    quantities[i] = x;
                }
            }

            // ∂Π/∂q_k = (M·q)_k − rhs_k
            let entering = (0..n)
                .filter(|&k| !active[k])
                .map(|k| {
                    let marginal: f64 =
                        matrix[k].iter().zip(&quantities).map(|(m, q)| m * q).sum::<f64>() - rhs[k];
                    (k, marginal)
                })
                .filter(|&(k, marginal)| marginal > 1e-9 * (1.0 + rhs[k].abs()))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match entering {
                Some((k, _)) => active[k] = true,
                None if members.is_empty() => return Err(SolverError::NoActiveFirm),
                None => return Ok(quantities),
            }
        }

        Err(SolverError::NoClosedForm(
            "cooperative corner search did not converge".to_string(),
        ))
    }
}

/// Firms that can carry output in a homogeneous joint optimum: of the plants with
/// constant marginal cost only the cheapest (first on ties) is kept
fn candidate_plants(gamma: f64, params: &RealizedParameters) -> Vec<bool> {
    let mut candidates = vec![true; params.num_firms()];
    if gamma < 1.0 || !params.has_common_demand() {
        return candidates;
    }

    let cheapest = params
        .firms
        .iter()
        .enumerate()
        .filter(|(_, f)| f.costs.quadratic == 0.0)
        .min_by(|a, b| a.1.costs.linear.total_cmp(&b.1.costs.linear))
        .map(|(i, _)| i);
    for (i, firm) in params.firms.iter().enumerate() {
        if firm.costs.quadratic == 0.0 && Some(i) != cheapest {
            candidates[i] = false;
        }
    }
    candidates
}

/// Joint-profit maximum for linear demand
///
/// Solved in quantities under both modes; a Bertrand optimum is reported at the
/// prices clearing those quantities, with shut-down firms at their choke price.
/// Bertrand with per-firm demand is solved in prices and must come out interior.
pub(crate) fn cooperative(
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> Result<Solution> {
    if mode == CompetitionMode::Bertrand && !params.has_common_demand() {
        let market = AffineMarket::new(mode, gamma, params)?;
        let (matrix, rhs) = market.cooperative_system();
        let prices = numeric::solve_linear(matrix, rhs).ok_or(SolverError::Singular)?;
        let quantities = market.respond(&prices);
        if prices.iter().chain(&quantities).any(|x| !x.is_finite()) {
            return Err(SolverError::Singular);
        }
        if prices.iter().any(|&p| p < 0.0) || quantities.iter().any(|&q| q <= 0.0) {
            return Err(SolverError::NoClosedForm(
                "cooperative prices leave a firm without demand".to_string(),
            ));
        }
        return Ok(Solution::Decisions {
            decisions: prices,
            clamped: Vec::new(),
            interior: true,
        });
    }

    let market = AffineMarket::new(CompetitionMode::Cournot, gamma, params)?;
    let quantities = market.cooperative_quantities(candidate_plants(gamma, params))?;

    match mode {
        CompetitionMode::Cournot => Ok(Solution::Decisions {
            decisions: quantities,
            clamped: Vec::new(),
            interior: false,
        }),
        CompetitionMode::Bertrand => {
            let prices = market.respond(&quantities).into_iter().map(|p| p.max(0.0)).collect();
            Ok(Solution::Allocation { prices, quantities })
        }
    }
}

/// Solve a first-order system; negative entries are clamped to zero without
/// re-solving for the corner
pub(crate) fn solve_clamped(
    matrix: Vec<Vec<f64>>,
    rhs: Vec<f64>,
    params: &RealizedParameters,
) -> Result<Solution> {
    let raw = numeric::solve_linear(matrix, rhs).ok_or(SolverError::Singular)?;
    if raw.iter().any(|x| !x.is_finite()) {
        return Err(SolverError::Singular);
    }
    if raw.iter().all(|&x| x <= 0.0) {
        return Err(SolverError::NoActiveFirm);
    }

    let clamped = params
        .firms
        .iter()
        .zip(&raw)
        .filter(|&(_, &x)| x < 0.0)
        .map(|(f, _)| f.id)
        .collect();
    let decisions = raw.into_iter().map(|x| x.max(0.0)).collect();

    Ok(Solution::Decisions {
        decisions,
        clamped,
        interior: true,
    })
}
