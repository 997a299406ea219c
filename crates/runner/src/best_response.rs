//! Myopic best-response bot
//!
//! Replies optimally to the rivals' previous-round decisions. Useful as a baseline
//! opponent and for checking that repeated play settles at the Nash benchmark.

use async_trait::async_trait;
use oligopoly_core::{CostParams, FirmId, RealizedFirm, RealizedParameters};
use oligopoly_market::best_response;
use oligopoly_ports::{Decision, DecisionProvider, ProviderError, ProviderResult, RoundContext};

pub struct BestResponseProvider {
    opening: f64,
}

impl BestResponseProvider {
    /// `opening` is played in the first round and whenever the firm lacks the
    /// information to compute a reply
    pub fn new(opening: f64) -> Self {
        Self { opening }
    }

    fn reply(&self, firm: FirmId, ctx: &RoundContext) -> ProviderResult<f64> {
        let (Some(demand), Some(costs), Some(last)) = (ctx.demand, ctx.own_costs, ctx.last_round())
        else {
            return Ok(self.opening);
        };
        if last.rival_decisions.is_empty() {
            return Ok(self.opening);
        }

        // Rival costs do not enter the firm's own profit, so unknown ones stay zero
        let firms = (0..ctx.num_firms)
            .map(|index| {
                let id = FirmId::from_index(index);
                RealizedFirm {
                    id,
                    costs: if id == firm { costs } else { CostParams::default() },
                    demand: None,
                }
            })
            .collect();
        let params = RealizedParameters { demand, firms };

        let mut decisions = vec![self.opening; ctx.num_firms];
        for (rival, decision) in &last.rival_decisions {
            if let Some(slot) = decisions.get_mut(rival.index()) {
                *slot = *decision;
            }
        }

        best_response(ctx.mode, ctx.gamma, &params, firm.index(), &decisions).map_err(|e| {
            ProviderError::Failed {
                firm,
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl DecisionProvider for BestResponseProvider {
    async fn request_decision(
        &self,
        firm: FirmId,
        ctx: &RoundContext,
    ) -> ProviderResult<Decision> {
        let value = self.reply(firm, ctx)?;
        Ok(Decision::new(value).with_reasoning(format!(
            "best response in round {} of {}",
            ctx.round, ctx.total_rounds
        )))
    }

    fn name(&self) -> &str {
        "BestResponseProvider"
    }
}
