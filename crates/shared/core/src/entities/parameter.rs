use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Declared distribution of a numeric market parameter
///
/// Resolves to a single real number each time it is drawn. For `LogNormal`,
/// `mean` is the mean of the lognormal variable itself and `std_dev` is the
/// standard deviation of the underlying normal (location `ln(mean) - std_dev²/2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterSpec {
    Fixed {
        value: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    Normal {
        mean: f64,
        #[serde(alias = "stdDev")]
        std_dev: f64,
    },
    #[serde(rename = "lognormal")]
    LogNormal {
        mean: f64,
        #[serde(alias = "stdDev")]
        std_dev: f64,
    },
}

impl ParameterSpec {
    pub fn fixed(value: f64) -> Self {
        Self::Fixed { value }
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        Self::Uniform { min, max }
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        Self::Normal { mean, std_dev }
    }

    pub fn lognormal(mean: f64, std_dev: f64) -> Self {
        Self::LogNormal { mean, std_dev }
    }

    /// Returns true if every draw yields the same value
    pub fn is_deterministic(&self) -> bool {
        match *self {
            Self::Fixed { .. } => true,
            Self::Uniform { min, max } => min == max,
            Self::Normal { std_dev, .. } | Self::LogNormal { std_dev, .. } => std_dev == 0.0,
        }
    }

    /// Expected value of the distribution
    ///
    /// Benchmarks are evaluated at central values so they never consume randomness.
    pub fn central_value(&self) -> f64 {
        match *self {
            Self::Fixed { value } => value,
            Self::Uniform { min, max } => (min + max) / 2.0,
            Self::Normal { mean, .. } | Self::LogNormal { mean, .. } => mean,
        }
    }

    /// Validate the declared distribution
    pub fn validate(&self, name: &str) -> Result<()> {
        let finite = |v: f64, field: &str| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::invalid(name, format!("{field} must be finite")))
            }
        };

        match *self {
            Self::Fixed { value } => finite(value, "value"),
            Self::Uniform { min, max } => {
                finite(min, "min")?;
                finite(max, "max")?;
                if min > max {
                    return Err(ConfigError::invalid(
                        name,
                        format!("min ({min}) exceeds max ({max})"),
                    ));
                }
                Ok(())
            }
            Self::Normal { mean, std_dev } => {
                finite(mean, "mean")?;
                finite(std_dev, "std_dev")?;
                if std_dev < 0.0 {
                    return Err(ConfigError::invalid(name, "std_dev must be >= 0"));
                }
                Ok(())
            }
            Self::LogNormal { mean, std_dev } => {
                finite(mean, "mean")?;
                finite(std_dev, "std_dev")?;
                if std_dev < 0.0 {
                    return Err(ConfigError::invalid(name, "std_dev must be >= 0"));
                }
                if mean <= 0.0 {
                    return Err(ConfigError::invalid(name, "lognormal mean must be > 0"));
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for ParameterSpec {
    fn from(value: f64) -> Self {
        Self::Fixed { value }
    }
}
