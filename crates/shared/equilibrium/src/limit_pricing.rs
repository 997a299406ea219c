//! Limit-pricing classification of an asymmetric-cost differentiated duopoly.
//!
//! With linear demand `p_i = a − b(q_i + γ·q_j)` and constant costs `c_low ≤ c_high`
//! the cost asymmetry is measured by `α = (c_high − c_low)/(a − c_low)`.
//!
//! - Above `1 − γ/2` the efficient firm's unconstrained monopoly price already leaves
//!   its rival without profitable demand.
//! - Under Bertrand the rival stays active at the interior Nash equilibrium while
//!   `α < (1−γ)(2+γ)/(2−γ²)`; between the two thresholds the efficient firm limits
//!   its price to keep the rival out.
//! - Under Cournot both thresholds coincide, so the limit-pricing interval is empty.

use oligopoly_core::{
    CompetitionMode, DemandParams, FirmId, LimitPricingAnalysis, LimitPricingRegime,
    MarketConfig, RealizedParameters,
};

/// Classify `config` at the central values of its parameters
///
/// Returns `None` unless the market is a duopoly with γ < 1, common linear demand and
/// constant marginal costs, and the efficient firm can sell above cost.
pub fn analyze_limit_pricing(config: &MarketConfig) -> Option<LimitPricingAnalysis> {
    if config.num_firms() != 2 || config.gamma >= 1.0 || config.has_firm_demand_overrides() {
        return None;
    }
    classify(config.mode, config.gamma, &RealizedParameters::central(config))
}

fn classify(
    mode: CompetitionMode,
    gamma: f64,
    params: &RealizedParameters,
) -> Option<LimitPricingAnalysis> {
    let DemandParams::Linear { intercept, .. } = params.demand else {
        return None;
    };
    if params.firms.len() != 2 || params.firms.iter().any(|f| f.costs.quadratic != 0.0) {
        return None;
    }

    let (efficient, rival) = if params.firms[1].costs.linear < params.firms[0].costs.linear {
        (&params.firms[1], &params.firms[0])
    } else {
        (&params.firms[0], &params.firms[1])
    };
    let c_low = efficient.costs.linear;
    let c_high = rival.costs.linear;
    if intercept <= c_low {
        return None;
    }

    let asymmetry_index = (c_high - c_low) / (intercept - c_low);
    let threshold_high = 1.0 - gamma / 2.0;
    let threshold_low = match mode {
        CompetitionMode::Bertrand => (1.0 - gamma) * (2.0 + gamma) / (2.0 - gamma * gamma),
        CompetitionMode::Cournot => threshold_high,
    };

    let regime = if asymmetry_index >= threshold_high {
        LimitPricingRegime::Monopoly
    } else if asymmetry_index >= threshold_low {
        LimitPricingRegime::LimitPricing
    } else {
        LimitPricingRegime::Competitive
    };

    let message = explain(regime, efficient.id, rival.id, asymmetry_index, threshold_low, threshold_high);

    Some(LimitPricingAnalysis {
        asymmetry_index,
        threshold_low,
        threshold_high,
        regime,
        efficient_firm: efficient.id,
        message,
    })
}

fn explain(
    regime: LimitPricingRegime,
    efficient: FirmId,
    rival: FirmId,
    index: f64,
    low: f64,
    high: f64,
) -> String {
    match regime {
        LimitPricingRegime::Competitive => format!(
            "Asymmetry index {index:.4} is below {low:.4}: both firms are active at the \
             interior equilibrium."
        ),
        LimitPricingRegime::LimitPricing => format!(
            "Asymmetry index {index:.4} lies in [{low:.4}, {high:.4}): {efficient} holds its \
             price down to the level at which {rival} cannot sell profitably."
        ),
        LimitPricingRegime::Monopoly => format!(
            "Asymmetry index {index:.4} is at least {high:.4}: {efficient} sets its monopoly \
             price and {rival} is excluded without any strategic pricing."
        ),
    }
}
