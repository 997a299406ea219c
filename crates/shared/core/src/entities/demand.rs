use serde::{Deserialize, Serialize};

use super::ParameterSpec;
use crate::error::{ConfigError, Result};
use crate::values::MIN_POSITIVE;

/// Demand functional form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandFamily {
    Linear,
    Ces,
    Logit,
    Exponential,
}

impl std::fmt::Display for DemandFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DemandFamily::Linear => "linear",
            DemandFamily::Ces => "CES",
            DemandFamily::Logit => "logit",
            DemandFamily::Exponential => "exponential",
        };
        f.write_str(name)
    }
}

/// Declared demand function, each coefficient carrying its own distribution
///
/// - `Linear`: P = a − b·Q
/// - `Ces`: P = A·Q^(−1/σ)
/// - `Logit`: P = a − b·ln(Q)
/// - `Exponential`: P = A·e^(−b·Q)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemandFunctionSpec {
    Linear {
        #[serde(alias = "a")]
        intercept: ParameterSpec,
        #[serde(alias = "b")]
        slope: ParameterSpec,
    },
    Ces {
        #[serde(alias = "A")]
        scale: ParameterSpec,
        #[serde(alias = "sigma")]
        elasticity: ParameterSpec,
    },
    Logit {
        #[serde(alias = "a")]
        intercept: ParameterSpec,
        #[serde(alias = "b")]
        price_coefficient: ParameterSpec,
    },
    Exponential {
        #[serde(alias = "A")]
        scale: ParameterSpec,
        #[serde(alias = "b")]
        decay: ParameterSpec,
    },
}

/// Per-firm demand override used when firms face asymmetric demand
pub type FirmDemandSpec = DemandFunctionSpec;

impl DemandFunctionSpec {
    /// Linear demand with fixed coefficients
    pub fn linear(intercept: f64, slope: f64) -> Self {
        Self::Linear {
            intercept: ParameterSpec::fixed(intercept),
            slope: ParameterSpec::fixed(slope),
        }
    }

    pub fn ces(scale: f64, elasticity: f64) -> Self {
        Self::Ces {
            scale: ParameterSpec::fixed(scale),
            elasticity: ParameterSpec::fixed(elasticity),
        }
    }

    pub fn logit(intercept: f64, price_coefficient: f64) -> Self {
        Self::Logit {
            intercept: ParameterSpec::fixed(intercept),
            price_coefficient: ParameterSpec::fixed(price_coefficient),
        }
    }

    pub fn exponential(scale: f64, decay: f64) -> Self {
        Self::Exponential {
            scale: ParameterSpec::fixed(scale),
            decay: ParameterSpec::fixed(decay),
        }
    }

    pub fn family(&self) -> DemandFamily {
        match self {
            Self::Linear { .. } => DemandFamily::Linear,
            Self::Ces { .. } => DemandFamily::Ces,
            Self::Logit { .. } => DemandFamily::Logit,
            Self::Exponential { .. } => DemandFamily::Exponential,
        }
    }

    /// Returns true if no coefficient is random
    pub fn is_deterministic(&self) -> bool {
        self.specs().iter().all(|(_, spec)| spec.is_deterministic())
    }

    fn specs(&self) -> [(&'static str, &ParameterSpec); 2] {
        match self {
            Self::Linear { intercept, slope } => [("intercept", intercept), ("slope", slope)],
            Self::Ces { scale, elasticity } => [("scale", scale), ("elasticity", elasticity)],
            Self::Logit {
                intercept,
                price_coefficient,
            } => [
                ("intercept", intercept),
                ("price_coefficient", price_coefficient),
            ],
            Self::Exponential { scale, decay } => [("scale", scale), ("decay", decay)],
        }
    }

    /// Validate every coefficient distribution
    ///
    /// Shape coefficients (everything but an intercept) must be centred on a positive value.
    pub fn validate(&self, prefix: &str) -> Result<()> {
        for (field, spec) in self.specs() {
            let name = format!("{prefix}.{field}");
            spec.validate(&name)?;
            if field != "intercept" && spec.central_value() <= 0.0 {
                return Err(ConfigError::invalid(&name, "must be centred on a positive value"));
            }
        }
        Ok(())
    }

    /// Resolve every coefficient through `draw`, in declaration order, then clamp to the
    /// family's domain
    pub fn resolve_with<F>(&self, mut draw: F) -> DemandParams
    where
        F: FnMut(&ParameterSpec) -> f64,
    {
        let params = match self {
            Self::Linear { intercept, slope } => DemandParams::Linear {
                intercept: draw(intercept),
                slope: draw(slope),
            },
            Self::Ces { scale, elasticity } => DemandParams::Ces {
                scale: draw(scale),
                elasticity: draw(elasticity),
            },
            Self::Logit {
                intercept,
                price_coefficient,
            } => DemandParams::Logit {
                intercept: draw(intercept),
                price_coefficient: draw(price_coefficient),
            },
            Self::Exponential { scale, decay } => DemandParams::Exponential {
                scale: draw(scale),
                decay: draw(decay),
            },
        };
        params.clamped()
    }

    /// Coefficients at their central values
    pub fn central(&self) -> DemandParams {
        self.resolve_with(ParameterSpec::central_value)
    }
}

/// Concrete demand coefficients for one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemandParams {
    Linear { intercept: f64, slope: f64 },
    Ces { scale: f64, elasticity: f64 },
    Logit { intercept: f64, price_coefficient: f64 },
    Exponential { scale: f64, decay: f64 },
}

impl DemandParams {
    pub fn family(&self) -> DemandFamily {
        match self {
            Self::Linear { .. } => DemandFamily::Linear,
            Self::Ces { .. } => DemandFamily::Ces,
            Self::Logit { .. } => DemandFamily::Logit,
            Self::Exponential { .. } => DemandFamily::Exponential,
        }
    }

    /// Clamp coefficients into the family's domain
    ///
    /// Normal draws are unclamped at the source, so negative slopes or scales can
    /// arrive here; intercepts are only floored for the linear family.
    pub fn clamped(self) -> Self {
        let pos = |v: f64| v.max(MIN_POSITIVE);
        match self {
            Self::Linear { intercept, slope } => Self::Linear {
                intercept: intercept.max(0.0),
                slope: pos(slope),
            },
            Self::Ces { scale, elasticity } => Self::Ces {
                scale: pos(scale),
                elasticity: pos(elasticity),
            },
            Self::Logit {
                intercept,
                price_coefficient,
            } => Self::Logit {
                intercept,
                price_coefficient: pos(price_coefficient),
            },
            Self::Exponential { scale, decay } => Self::Exponential {
                scale: pos(scale),
                decay: pos(decay),
            },
        }
    }
}
