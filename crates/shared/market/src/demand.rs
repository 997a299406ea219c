//! Demand Model
//!
//! Evaluates each demand family in both competition modes. Under Cournot a firm's
//! price depends on its effective quantity `Q = own + γ·Σothers`; under Bertrand a
//! firm's quantity is allocated from its own and its rivals' prices.
//!
//! Arguments of `ln`/power functions are floored at [`MIN_POSITIVE`], which sets
//! [`Evaluated::clamped`]. Results are cut at 0 without a flag: pricing above the
//! choke simply sells nothing.

use oligopoly_core::{DemandParams, MIN_POSITIVE};

/// Prices closer than this to the lowest posted price count as tied under
/// homogeneous Bertrand competition; tied firms split demand equally.
pub const PRICE_TIE_TOLERANCE: f64 = 1e-9;

/// Largest exponent fed to `exp` before the result is treated as saturated
const MAX_EXPONENT: f64 = 700.0;

/// Result of a demand evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluated {
    pub value: f64,
    /// A domain floor was applied to a non-positive argument
    pub clamped: bool,
}

impl Evaluated {
    fn exact(value: f64) -> Self {
        Self {
            value,
            clamped: false,
        }
    }

    /// Cut at zero; only a NaN adds to `clamped`
    fn non_negative(value: f64, clamped: bool) -> Self {
        if value.is_nan() {
            Self {
                value: 0.0,
                clamped: true,
            }
        } else {
            Self {
                value: value.max(0.0),
                clamped,
            }
        }
    }

    fn zero() -> Self {
        Self::exact(0.0)
    }
}

/// Floor `x` at `MIN_POSITIVE`, reporting whether the floor was hit
fn floor_positive(x: f64) -> (f64, bool) {
    if x < MIN_POSITIVE {
        (MIN_POSITIVE, true)
    } else {
        (x, false)
    }
}

fn capped_exp(exponent: f64) -> (f64, bool) {
    if exponent > MAX_EXPONENT {
        (MAX_EXPONENT.exp(), true)
    } else {
        (exponent.exp(), false)
    }
}

/// Inverse demand: price at effective quantity `quantity`
pub fn inverse_demand(demand: &DemandParams, quantity: f64) -> Evaluated {
    match *demand {
        DemandParams::Linear { intercept, slope } => {
            let clamped = quantity < 0.0;
            Evaluated::non_negative(intercept - slope * quantity.max(0.0), clamped)
        }
        DemandParams::Ces { scale, elasticity } => {
            let (q, floored) = floor_positive(quantity);
            Evaluated::non_negative(scale * q.powf(-1.0 / elasticity), floored)
        }
        DemandParams::Logit {
            intercept,
            price_coefficient,
        } => {
            let (q, floored) = floor_positive(quantity);
            Evaluated::non_negative(intercept - price_coefficient * q.ln(), floored)
        }
        DemandParams::Exponential { scale, decay } => {
            let clamped = quantity < 0.0;
            Evaluated::non_negative(scale * (-decay * quantity.max(0.0)).exp(), clamped)
        }
    }
}

/// Direct demand: total quantity demanded at `price`
pub fn direct_demand(demand: &DemandParams, price: f64) -> Evaluated {
    match *demand {
        DemandParams::Linear { intercept, slope } => {
            Evaluated::non_negative((intercept - price) / slope, false)
        }
        DemandParams::Ces { scale, elasticity } => {
            let (p, floored) = floor_positive(price);
            Evaluated::non_negative((p / scale).powf(-elasticity), floored)
        }
        DemandParams::Logit {
            intercept,
            price_coefficient,
        } => {
            let (q, capped) = capped_exp((intercept - price) / price_coefficient);
            Evaluated::non_negative(q, capped)
        }
        DemandParams::Exponential { scale, decay } => {
            let (p, floored) = floor_positive(price);
            Evaluated::non_negative((scale / p).ln() / decay, floored)
        }
    }
}

/// Cournot price faced by a firm producing `own_quantity` while rivals produce
/// `others_quantity` in total
pub fn cournot_price(
    demand: &DemandParams,
    own_quantity: f64,
    others_quantity: f64,
    gamma: f64,
) -> Evaluated {
    inverse_demand(demand, own_quantity + gamma * others_quantity)
}

/// Bertrand quantity sold by a firm posting `own_price` against `others_prices`
pub fn allocated_quantity(
    demand: &DemandParams,
    own_price: f64,
    others_prices: &[f64],
    gamma: f64,
) -> Evaluated {
    if gamma >= 1.0 {
        return homogeneous_allocation(demand, own_price, others_prices);
    }

    let n = (others_prices.len() + 1) as f64;
    match *demand {
        DemandParams::Linear { intercept, slope } => {
            // Singh–Vives inversion of p_i = a − b(q_i + γ·Σq_j)
            let others_sum: f64 = others_prices.iter().sum();
            let numerator = intercept * (1.0 - gamma) - (1.0 + (n - 2.0) * gamma) * own_price
                + gamma * others_sum;
            let denominator = slope * (1.0 - gamma) * (1.0 + (n - 1.0) * gamma);
            Evaluated::non_negative(numerator / denominator, false)
        }
        DemandParams::Ces { .. } | DemandParams::Logit { .. } | DemandParams::Exponential { .. } => {
            // Own-price share of the family demand
            let total = direct_demand(demand, own_price);
            let share = 1.0 + (n - 1.0) * gamma;
            Evaluated {
                value: total.value / share,
                clamped: total.clamped,
            }
        }
    }
}

/// Homogeneous products: the lowest price takes the market, ties split it equally
fn homogeneous_allocation(demand: &DemandParams, own_price: f64, others_prices: &[f64]) -> Evaluated {
    let lowest_rival = others_prices.iter().copied().fold(f64::INFINITY, f64::min);

    if own_price > lowest_rival + PRICE_TIE_TOLERANCE {
        return Evaluated::zero();
    }

    let lowest = own_price.min(lowest_rival);
    let tied = 1 + others_prices
        .iter()
        .filter(|&&p| (p - lowest).abs() <= PRICE_TIE_TOLERANCE)
        .count();
    // Own price may sit just above `lowest` but within tolerance: it is still a winner.
    let winners = if own_price < lowest_rival - PRICE_TIE_TOLERANCE {
        1
    } else {
        tied
    };

    let total = direct_demand(demand, own_price);
    Evaluated {
        value: total.value / winners as f64,
        clamped: total.clamped,
    }
}

/// Bertrand quantities for every firm; `demands[i]` is the demand firm `i` faces
pub fn bertrand_quantities(demands: &[DemandParams], prices: &[f64], gamma: f64) -> Vec<Evaluated> {
    (0..prices.len())
        .map(|i| {
            let others: Vec<f64> = prices
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &p)| p)
                .collect();
            allocated_quantity(&demands[i], prices[i], &others, gamma)
        })
        .collect()
}
