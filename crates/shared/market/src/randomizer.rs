//! Parameter Randomizer
//!
//! Draws concrete values from `ParameterSpec` distributions. The random source is
//! owned by the randomizer and can be seeded for reproducible experiments.

use oligopoly_core::{MarketConfig, ParameterSpec, RealizedParameters};
use rand::prelude::*;
use rand_distr::{LogNormal, Normal};

/// Seedable sampler for parameter distributions
pub struct ParameterRandomizer {
    rng: StdRng,
    seed: Option<u64>,
    draws: u64,
}

impl ParameterRandomizer {
    /// Create with an optional seed; `None` uses OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            seed,
            draws: 0,
        }
    }

    /// Create with a specific seed for reproducible draws
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(None)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Draw one value from `spec`
    ///
    /// Normal draws are not clamped; callers apply domain limits. Lognormal draws use
    /// location `ln(mean) − σ²/2` and scale `σ = std_dev`, so the draw's mean is `mean`.
    pub fn draw(&mut self, spec: &ParameterSpec) -> f64 {
        self.draws += 1;
        match *spec {
            ParameterSpec::Fixed { value } => value,
            ParameterSpec::Uniform { min, max } => {
                if min >= max {
                    min
                } else {
                    self.rng.gen_range(min..=max)
                }
            }
            ParameterSpec::Normal { mean, std_dev } => match Normal::new(mean, std_dev) {
                Ok(dist) => dist.sample(&mut self.rng),
                Err(_) => mean,
            },
            ParameterSpec::LogNormal { mean, std_dev } => {
                if mean <= 0.0 {
                    return mean;
                }
                let mu = mean.ln() - std_dev * std_dev / 2.0;
                match LogNormal::new(mu, std_dev) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => mean,
                }
            }
        }
    }

    /// Draw every parameter of `config`
    pub fn realize(&mut self, config: &MarketConfig) -> RealizedParameters {
        let params = RealizedParameters::from_config_with(config, |spec| self.draw(spec));
        log::debug!("Realized parameters: {:?}", params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oligopoly_core::{CompetitionMode, DemandFunctionSpec, FirmId, VariationPolicy};

    #[test]
    fn test_fixed_returns_value_exactly() {
        let mut rng = ParameterRandomizer::seeded(1);
        for v in [0.0, -3.5, 1e12, 0.1 + 0.2] {
            assert_eq!(rng.draw(&ParameterSpec::fixed(v)), v);
        }
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        let mut rng = ParameterRandomizer::seeded(7);
        let spec = ParameterSpec::uniform(2.0, 3.0);
        for _ in 0..10_000 {
            let v = rng.draw(&spec);
            assert!((2.0..=3.0).contains(&v), "{v} outside [2, 3]");
        }
        assert_eq!(rng.draw(&ParameterSpec::uniform(4.0, 4.0)), 4.0);
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = ParameterRandomizer::seeded(11);
        let spec = ParameterSpec::normal(10.0, 2.0);
        let samples: Vec<f64> = (0..20_000).map(|_| rng.draw(&spec)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        approx::assert_abs_diff_eq!(mean, 10.0, epsilon = 0.1);
        approx::assert_abs_diff_eq!(var.sqrt(), 2.0, epsilon = 0.1);
    }

    #[test]
    fn test_lognormal_mean_matches_declared_mean() {
        let mut rng = ParameterRandomizer::seeded(42);
        let spec = ParameterSpec::lognormal(20.0, 0.5);
        let samples: Vec<f64> = (0..50_000).map(|_| rng.draw(&spec)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;

        assert!(samples.iter().all(|&x| x > 0.0));
        approx::assert_relative_eq!(mean, 20.0, max_relative = 0.02);

        // Underlying normal has the declared sigma
        let logs: Vec<f64> = samples.iter().map(|x| x.ln()).collect();
        let log_mean = logs.iter().sum::<f64>() / logs.len() as f64;
        let log_sd = (logs.iter().map(|x| (x - log_mean).powi(2)).sum::<f64>()
            / logs.len() as f64)
            .sqrt();
        approx::assert_abs_diff_eq!(log_mean, 20.0f64.ln() - 0.125, epsilon = 0.01);
        approx::assert_abs_diff_eq!(log_sd, 0.5, epsilon = 0.01);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let spec = ParameterSpec::normal(0.0, 1.0);
        let mut a = ParameterRandomizer::seeded(99);
        let mut b = ParameterRandomizer::seeded(99);
        for _ in 0..100 {
            assert_eq!(a.draw(&spec), b.draw(&spec));
        }
        assert_eq!(a.draws(), 100);
    }

    #[test]
    fn test_realize_clamps_costs() {
        let mut config = MarketConfig::symmetric(
            CompetitionMode::Cournot,
            2,
            DemandFunctionSpec::linear(100.0, 1.0),
            0.0,
            0.0,
        )
        .with_variation(VariationPolicy::PerRound);
        config.firms[0].linear_cost = ParameterSpec::normal(0.0, 5.0);

        let mut rng = ParameterRandomizer::seeded(3);
        for _ in 0..200 {
            let params = rng.realize(&config);
            let firm = params.firm(FirmId(1)).unwrap();
            assert!(firm.costs.linear >= 0.0);
        }
    }
}
