//! Experiment configuration
//!
//! Loaded from JSON. The `market` section may use the canonical layout or the legacy
//! `firm1Info`/`firm2Info` layout; the latter is converted once, here.

use std::path::Path;
use std::time::Duration;

use oligopoly_core::{ConfigError, LegacyMarketConfig, MarketConfig};
use oligopoly_ports::InformationDisclosure;
use serde::{Deserialize, Serialize};

/// What to do when a firm's decision cannot be obtained
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionFailurePolicy {
    /// Stop the experiment as completed-with-error
    #[default]
    Abort,
    /// Pause the experiment; the failed round is replayed on resume
    Pause,
    /// Reuse the firm's previous decision, or `value` in the first round
    Substitute { value: f64 },
}

/// How an experiment is run, independent of the market itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Seed for parameter draws; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_timeout_ms")]
    pub decision_timeout_ms: u64,
    /// Messages exchanged before each decision, cycling through firms in id order
    #[serde(default)]
    pub communication_turns: u32,
    #[serde(default)]
    pub disclosure: InformationDisclosure,
    #[serde(default)]
    pub failure_policy: DecisionFailurePolicy,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            seed: None,
            decision_timeout_ms: default_timeout_ms(),
            communication_turns: 0,
            disclosure: InformationDisclosure::default(),
            failure_policy: DecisionFailurePolicy::default(),
        }
    }
}

impl RunSettings {
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision_timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "decision_timeout_ms".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if let DecisionFailurePolicy::Substitute { value } = self.failure_policy {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "failure_policy.value".to_string(),
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Complete experiment definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub market: MarketConfig,
    #[serde(default)]
    pub run: RunSettings,
}

fn default_name() -> String {
    "experiment".to_string()
}

/// On-disk shape before the market section is normalized
#[derive(Deserialize)]
struct RawExperimentConfig {
    #[serde(default = "default_name")]
    name: String,
    market: serde_json::Value,
    #[serde(default)]
    run: RunSettings,
}

impl ExperimentConfig {
    pub fn new(name: impl Into<String>, market: MarketConfig) -> Self {
        Self {
            name: name.into(),
            market,
            run: RunSettings::default(),
        }
    }

    pub fn with_run(mut self, run: RunSettings) -> Self {
        self.run = run;
        self
    }

    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawExperimentConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let market = match serde_json::from_value::<MarketConfig>(raw.market.clone()) {
            Ok(market) => market,
            Err(canonical) => {
                let legacy: LegacyMarketConfig = serde_json::from_value(raw.market)
                    .map_err(|_| ConfigError::Parse(canonical.to_string()))?;
                log::info!("Converting legacy market configuration");
                legacy.into_market_config()?
            }
        };

        let config = Self {
            name: raw.name,
            market,
            run: raw.run,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.market.validate()?;
        self.run.validate()
    }
}
