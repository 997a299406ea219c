use async_trait::async_trait;
use oligopoly_core::FirmId;
use serde::{Deserialize, Serialize};

use crate::context::RoundContext;
use crate::error::ProviderResult;

/// A firm's answer for one round: a quantity under Cournot, a price under Bertrand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Decision {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Port for whatever makes a firm's choices (LLM agent, scripted bot, human)
///
/// The engine treats answers as opaque numbers. Calls for different firms of the same
/// round run concurrently, so implementations must not rely on call order.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Ask `firm` for its simultaneous decision
    async fn request_decision(&self, firm: FirmId, ctx: &RoundContext)
    -> ProviderResult<Decision>;

    /// Ask `firm` for a message during communication turn `turn`
    async fn request_message(
        &self,
        _firm: FirmId,
        _ctx: &RoundContext,
        _turn: u32,
    ) -> ProviderResult<String> {
        Ok(String::new())
    }

    /// Provider name for logging
    fn name(&self) -> &str {
        "DecisionProvider"
    }
}
