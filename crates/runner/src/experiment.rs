//! Experiment - replication and round orchestration
//!
//! Drives one configured experiment end to end:
//! - Parameter draws according to the variation policy
//! - Optional communication turns before each decision
//! - Simultaneous decision collection with per-firm timeouts
//! - Market resolution and per-round event publication
//! - Pause/resume at round boundaries, reset with cancellation

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use oligopoly_core::{
    FirmId, FirmMessage, RealizedParameters, ReplicationResult, RoundResult, VariationPolicy,
};
use oligopoly_equilibrium::compute_equilibria;
use oligopoly_market::{MarketError, ParameterRandomizer, resolve_round};
use oligopoly_ports::{
    DecisionProvider, HistoryEntry, ProviderError, ProviderResult, RoundContext,
};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::config::{DecisionFailurePolicy, ExperimentConfig};
use crate::error::{ExperimentError, Result};
use crate::handle::{Control, ExperimentHandle};
use crate::status::{Action, ExperimentStatus};
use crate::summary::ExperimentSummary;

/// Progress notifications published while an experiment runs
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    StatusChanged(ExperimentStatus),
    ReplicationStarted {
        replication: u32,
    },
    RoundCompleted(RoundResult),
    /// A decision could not be obtained; what follows depends on the failure policy
    RoundFailed {
        replication: u32,
        round: u32,
        error: ProviderError,
    },
    ReplicationCompleted(ReplicationResult),
    Completed(Box<ExperimentSummary>),
}

/// A configured experiment, ready to run
pub struct Experiment {
    id: Uuid,
    config: ExperimentConfig,
    provider: Arc<dyn DecisionProvider>,
    control: watch::Receiver<Control>,
    status: Arc<watch::Sender<ExperimentStatus>>,
    handle: ExperimentHandle,
    subscribers: Vec<mpsc::UnboundedSender<ExperimentEvent>>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig, provider: Arc<dyn DecisionProvider>) -> Result<Self> {
        config.validate()?;

        let (control_tx, control) = watch::channel(Control::Run);
        let (status_tx, _) = watch::channel(ExperimentStatus::Idle);
        let status = Arc::new(status_tx);
        let handle = ExperimentHandle::new(Arc::new(control_tx), Arc::clone(&status));

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            provider,
            control,
            status,
            handle,
            subscribers: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Remote control usable from other tasks while `run` is in progress
    pub fn handle(&self) -> ExperimentHandle {
        self.handle.clone()
    }

    /// Receive every event of the run, in order
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ExperimentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Run every replication to completion
    ///
    /// Returns `ExperimentError::Cancelled` if reset, `RoundFailed` if a decision
    /// failure aborts the run.
    pub async fn run(self) -> Result<ExperimentSummary> {
        let Experiment {
            id,
            config,
            provider,
            control,
            status,
            handle,
            subscribers,
        } = self;
        // Only external handles may keep the control channel open
        drop(handle);

        let mut session = Session {
            id,
            config,
            provider,
            control,
            status,
            subscribers,
        };
        session.run().await
    }
}

/// Convenience entry point: run `config` against `provider` without remote control
pub async fn run_experiment(
    config: ExperimentConfig,
    provider: Arc<dyn DecisionProvider>,
) -> Result<ExperimentSummary> {
    Experiment::new(config, provider)?.run().await
}

enum RoundError {
    Cancelled,
    Provider(ProviderError),
    Market(MarketError),
}

struct Session {
    id: Uuid,
    config: ExperimentConfig,
    provider: Arc<dyn DecisionProvider>,
    control: watch::Receiver<Control>,
    status: Arc<watch::Sender<ExperimentStatus>>,
    subscribers: Vec<mpsc::UnboundedSender<ExperimentEvent>>,
}

impl Session {
    async fn run(&mut self) -> Result<ExperimentSummary> {
        self.advance(Action::Configure)?;
        let started_at = Utc::now();
        let market = self.config.market.clone();

        let equilibria = compute_equilibria(&market);
        let mut randomizer = ParameterRandomizer::new(self.config.run.seed);
        let fixed = (market.variation == VariationPolicy::Fixed).then(|| randomizer.realize(&market));

        self.advance(Action::Start)?;
        log::info!(
            "Experiment '{}' ({}): {:?} with {} firms, {} replications x {} rounds",
            self.config.name,
            self.id,
            market.mode,
            market.num_firms(),
            market.replications,
            market.rounds
        );

        let mut replications = Vec::with_capacity(market.replications as usize);
        for replication in 1..=market.replications {
            let per_replication = (market.variation == VariationPolicy::PerReplication)
                .then(|| randomizer.realize(&market));
            self.emit(ExperimentEvent::ReplicationStarted { replication });

            let mut rounds: Vec<RoundResult> = Vec::with_capacity(market.rounds as usize);
            for round in 1..=market.rounds {
                self.checkpoint().await?;

                let params = match (&fixed, &per_replication) {
                    (Some(params), _) | (_, Some(params)) => params.clone(),
                    _ => randomizer.realize(&market),
                };

                let result = loop {
                    match self.play_round(replication, round, &params, &rounds).await {
                        Ok(result) => break result,
                        Err(RoundError::Cancelled) => return Err(self.cancel()),
                        Err(RoundError::Market(error)) => {
                            log::error!("Replication {replication} round {round}: {error}");
                            self.advance(Action::Fail)?;
                            return Err(error.into());
                        }
                        Err(RoundError::Provider(error)) => {
                            log::warn!("Replication {replication} round {round}: {error}");
                            self.emit(ExperimentEvent::RoundFailed {
                                replication,
                                round,
                                error: error.clone(),
                            });
                            if self.config.run.failure_policy == DecisionFailurePolicy::Pause {
                                self.hold(true).await?;
                                log::info!("Replaying replication {replication} round {round}");
                            } else {
                                self.advance(Action::Fail)?;
                                return Err(ExperimentError::RoundFailed {
                                    replication,
                                    round,
                                    source: error,
                                });
                            }
                        }
                    }
                };

                log::info!(
                    "Replication {} round {}: market price {:.4}, total quantity {:.4}, total profit {:.4}",
                    replication,
                    round,
                    result.market_price,
                    result.total_quantity,
                    result.total_profit()
                );
                self.emit(ExperimentEvent::RoundCompleted(result.clone()));
                rounds.push(result);
            }

            let completed = ReplicationResult::from_rounds(replication, rounds);
            self.emit(ExperimentEvent::ReplicationCompleted(completed.clone()));
            replications.push(completed);
        }

        let summary = ExperimentSummary::new(
            self.id,
            self.config.name.clone(),
            started_at,
            Utc::now(),
            replications,
            equilibria,
        );
        self.advance(Action::Complete)?;
        if let Some(index) = summary.collusion_index {
            log::info!("Experiment '{}' collusion index {:.4}", self.config.name, index);
        }
        self.emit(ExperimentEvent::Completed(Box::new(summary.clone())));
        Ok(summary)
    }

    /// One round: communication turns, simultaneous decisions, resolution
    async fn play_round(
        &mut self,
        replication: u32,
        round: u32,
        params: &RealizedParameters,
        history: &[RoundResult],
    ) -> std::result::Result<RoundResult, RoundError> {
        let provider = Arc::clone(&self.provider);
        let limit = self.config.run.decision_timeout();
        let num_firms = self.config.market.num_firms();
        let policy = self.config.run.failure_policy;

        let mut messages: Vec<FirmMessage> = Vec::new();
        for turn in 1..=self.config.run.communication_turns {
            let firm = FirmId::from_index((turn as usize - 1) % num_firms);
            let ctx = self.context(firm, replication, round, params, history, &messages);
            let request = with_timeout(limit, firm, provider.request_message(firm, &ctx, turn));

            match cancellable(&mut self.control, request).await {
                None => return Err(RoundError::Cancelled),
                Some(Ok(text)) => messages.push(FirmMessage { firm, turn, text }),
                Some(Err(error)) if matches!(policy, DecisionFailurePolicy::Substitute { .. }) => {
                    log::warn!("Skipping message turn {turn}: {error}");
                }
                Some(Err(error)) => return Err(RoundError::Provider(error)),
            }
        }

        // Every context is built before any request goes out
        let contexts: Vec<(FirmId, RoundContext)> = self
            .config
            .market
            .firm_ids()
            .map(|firm| {
                (
                    firm,
                    self.context(firm, replication, round, params, history, &messages),
                )
            })
            .collect();

        let requests = contexts.iter().map(|(firm, ctx)| {
            with_timeout(limit, *firm, provider.request_decision(*firm, ctx))
        });
        let Some(answers) = cancellable(&mut self.control, join_all(requests)).await else {
            return Err(RoundError::Cancelled);
        };

        let mut decisions = BTreeMap::new();
        let mut substituted = Vec::new();
        for ((firm, _), answer) in contexts.iter().zip(answers) {
            let answer = answer.and_then(|decision| {
                if decision.value.is_finite() {
                    Ok(decision)
                } else {
                    Err(ProviderError::InvalidDecision {
                        firm: *firm,
                        value: decision.value,
                    })
                }
            });

            match (answer, policy) {
                (Ok(decision), _) => {
                    if let Some(reasoning) = &decision.reasoning {
                        log::debug!("{firm} round {round}: {reasoning}");
                    }
                    decisions.insert(*firm, decision.value);
                }
                (Err(error), DecisionFailurePolicy::Substitute { value }) => {
                    let fallback = history
                        .last()
                        .and_then(|r| r.outcome(*firm))
                        .map_or(value, |o| o.decision);
                    log::warn!("{error}; substituting {fallback}");
                    decisions.insert(*firm, fallback);
                    substituted.push(*firm);
                }
                (Err(error), _) => return Err(RoundError::Provider(error)),
            }
        }

        let mut result = resolve_round(
            replication,
            round,
            &decisions,
            &self.config.market,
            params,
        )
        .map_err(RoundError::Market)?;
        for outcome in result.firms.iter_mut() {
            outcome.substituted = substituted.contains(&outcome.firm);
        }
        result.messages = messages;
        Ok(result)
    }

    /// What `firm` is allowed to see this round
    fn context(
        &self,
        firm: FirmId,
        replication: u32,
        round: u32,
        params: &RealizedParameters,
        history: &[RoundResult],
        messages: &[FirmMessage],
    ) -> RoundContext {
        let market = &self.config.market;
        let disclosure = self.config.run.disclosure;

        let rival_costs = if disclosure.reveal_rival_costs {
            params
                .firms
                .iter()
                .filter(|f| f.id != firm)
                .map(|f| (f.id, f.costs))
                .collect()
        } else {
            Vec::new()
        };

        RoundContext {
            replication,
            round,
            total_rounds: market.rounds,
            mode: market.mode,
            num_firms: market.num_firms(),
            gamma: market.gamma,
            demand: disclosure
                .reveal_demand
                .then(|| params.demand_for(firm.index())),
            own_costs: params
                .firm(firm)
                .filter(|_| disclosure.reveal_own_costs)
                .map(|f| f.costs),
            rival_costs,
            history: history
                .iter()
                .filter_map(|r| history_entry(r, firm, disclosure.reveal_rival_decisions))
                .collect(),
            messages: messages.to_vec(),
        }
    }

    /// Honor pause and reset requests between rounds
    async fn checkpoint(&mut self) -> Result<()> {
        let signal = *self.control.borrow_and_update();
        match signal {
            Control::Run => Ok(()),
            Control::Pause => self.hold(false).await,
            Control::Reset => Err(self.cancel()),
        }
    }

    /// Stay paused until resumed or reset
    ///
    /// With `discard_pending`, only control changes made after the pause count.
    async fn hold(&mut self, discard_pending: bool) -> Result<()> {
        if discard_pending {
            let _ = self.control.borrow_and_update();
        }
        self.advance(Action::Pause)?;

        loop {
            if self.control.changed().await.is_err() {
                log::warn!("Experiment '{}' paused with no handle left", self.config.name);
                return Err(self.cancel());
            }
            let signal = *self.control.borrow_and_update();
            match signal {
                Control::Run => break,
                Control::Reset => return Err(self.cancel()),
                Control::Pause => {}
            }
        }

        self.advance(Action::Resume)
    }

    fn cancel(&mut self) -> ExperimentError {
        let from = *self.status.borrow();
        self.status.send_replace(ExperimentStatus::Idle);
        log::info!(
            "Experiment '{}' reset from {}; results discarded",
            self.config.name,
            from
        );
        self.emit(ExperimentEvent::StatusChanged(ExperimentStatus::Idle));
        ExperimentError::Cancelled
    }

    fn advance(&mut self, action: Action) -> Result<()> {
        let from = *self.status.borrow();
        let to = from.apply(action)?;
        self.status.send_replace(to);
        log::info!("Experiment '{}': {} -> {}", self.config.name, from, to);
        self.emit(ExperimentEvent::StatusChanged(to));
        Ok(())
    }

    fn emit(&mut self, event: ExperimentEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn history_entry(result: &RoundResult, firm: FirmId, reveal_rivals: bool) -> Option<HistoryEntry> {
    let own = result.outcome(firm)?;
    let rival_decisions = if reveal_rivals {
        result
            .firms
            .iter()
            .filter(|o| o.firm != firm)
            .map(|o| (o.firm, o.decision))
            .collect()
    } else {
        Vec::new()
    };

    Some(HistoryEntry {
        round: result.round,
        own_decision: own.decision,
        own_quantity: own.quantity,
        own_price: own.price,
        own_profit: own.profit,
        market_price: result.market_price,
        rival_decisions,
    })
}

async fn with_timeout<T>(
    limit: Duration,
    firm: FirmId,
    request: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            firm,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Resolves once a reset is signalled; never if every handle is gone
async fn reset_requested(control: &mut watch::Receiver<Control>) {
    loop {
        if *control.borrow_and_update() == Control::Reset {
            return;
        }
        if control.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Drive `request` unless a reset arrives first
async fn cancellable<F: Future>(
    control: &mut watch::Receiver<Control>,
    request: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = reset_requested(control) => None,
        output = request => Some(output),
    }
}
