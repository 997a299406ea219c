//! Experiment Lifecycle Integration Tests
//!
//! Runs full experiments against mock decision providers:
//! - Simultaneous decision collection
//! - Parameter variation scoping and seeding
//! - Pause, resume and reset
//! - Timeout and failure policies
//! - Communication turns and information disclosure
//! - Best-response play converging to the Nash benchmark

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use approx::assert_relative_eq;
use async_trait::async_trait;
use oligopoly_core::{
    CompetitionMode, DemandFunctionSpec, FirmId, MarketConfig, ParameterSpec, VariationPolicy,
};
use oligopoly_ports::{
    Decision, DecisionProvider, InformationDisclosure, ProviderError, ProviderResult,
    RoundContext,
};
use oligopoly_runner::{
    BestResponseProvider, DecisionFailurePolicy, Experiment, ExperimentConfig, ExperimentError,
    ExperimentEvent, ExperimentStatus, RunSettings, run_experiment,
};
use tokio::sync::{Barrier, Semaphore, mpsc};

fn duopoly(rounds: u32, replications: u32) -> MarketConfig {
    MarketConfig::symmetric(
        CompetitionMode::Cournot,
        2,
        DemandFunctionSpec::linear(100.0, 1.0),
        10.0,
        0.0,
    )
    .with_schedule(rounds, replications)
}

fn config(market: MarketConfig, run: RunSettings) -> ExperimentConfig {
    ExperimentConfig::new("lifecycle", market).with_run(run)
}

fn drain(events: &mut mpsc::UnboundedReceiver<ExperimentEvent>) -> Vec<ExperimentEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Fixed decision per firm, in firm order
struct Scripted(Vec<f64>);

#[async_trait]
impl DecisionProvider for Scripted {
    async fn request_decision(&self, firm: FirmId, _ctx: &RoundContext) -> ProviderResult<Decision> {
        Ok(Decision::new(self.0[firm.index()]))
    }
}

/// Blocks every decision until all firms of the round have asked
struct BarrierProvider {
    barrier: Barrier,
}

#[async_trait]
impl DecisionProvider for BarrierProvider {
    async fn request_decision(&self, _firm: FirmId, _ctx: &RoundContext) -> ProviderResult<Decision> {
        self.barrier.wait().await;
        Ok(Decision::new(20.0))
    }
}

/// Each decision consumes one permit released by the test
struct Gated {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl DecisionProvider for Gated {
    async fn request_decision(&self, firm: FirmId, _ctx: &RoundContext) -> ProviderResult<Decision> {
        let permit = self.gate.acquire().await.map_err(|e| ProviderError::Failed {
            firm,
            reason: e.to_string(),
        })?;
        permit.forget();
        Ok(Decision::new(25.0))
    }
}

/// Firm 2 never answers
struct Silent;

#[async_trait]
impl DecisionProvider for Silent {
    async fn request_decision(&self, firm: FirmId, _ctx: &RoundContext) -> ProviderResult<Decision> {
        if firm == FirmId(2) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(Decision::new(20.0))
    }
}

/// Firm 2 fails its first request only
struct Flaky {
    calls: AtomicUsize,
}

#[async_trait]
impl DecisionProvider for Flaky {
    async fn request_decision(&self, firm: FirmId, _ctx: &RoundContext) -> ProviderResult<Decision> {
        if firm == FirmId(2) && self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ProviderError::Failed {
                firm,
                reason: "agent crashed".to_string(),
            });
        }
        Ok(Decision::new(30.0))
    }
}

/// Records every context it is shown and chats during communication turns
#[derive(Default)]
struct Recorder {
    contexts: Mutex<Vec<(FirmId, RoundContext)>>,
    message_contexts: Mutex<Vec<(FirmId, u32, usize)>>,
}

#[async_trait]
impl DecisionProvider for Recorder {
    async fn request_decision(&self, firm: FirmId, ctx: &RoundContext) -> ProviderResult<Decision> {
        self.contexts.lock().unwrap().push((firm, ctx.clone()));
        Ok(Decision::new(20.0))
    }

    async fn request_message(
        &self,
        firm: FirmId,
        ctx: &RoundContext,
        turn: u32,
    ) -> ProviderResult<String> {
        self.message_contexts
            .lock()
            .unwrap()
            .push((firm, turn, ctx.messages.len()));
        Ok(format!("hello from {firm}"))
    }
}

/// Test that a full run resolves every round and publishes events in order
#[tokio::test]
async fn test_experiment_runs_to_completion() {
    let _ = env_logger::try_init();

    let mut experiment = Experiment::new(
        config(duopoly(3, 2), RunSettings::default()),
        Arc::new(Scripted(vec![30.0, 30.0])),
    )
    .unwrap();
    let handle = experiment.handle();
    let mut events = experiment.subscribe();
    assert_eq!(handle.status(), ExperimentStatus::Idle);

    let summary = experiment.run().await.unwrap();
    assert_eq!(handle.status(), ExperimentStatus::Completed);
    assert_eq!(summary.replications.len(), 2);
    assert_eq!(summary.total_rounds(), 6);

    // Both firms at the Nash quantity every round
    for benchmark in &summary.benchmarks {
        assert_relative_eq!(benchmark.mean_profit, 900.0, epsilon = 1e-9);
        assert_relative_eq!(benchmark.deviation_from_nash.unwrap(), 0.0, epsilon = 1e-6);
    }
    assert_relative_eq!(summary.collusion_index.unwrap(), 0.0, epsilon = 1e-6);

    let events = drain(&mut events);
    assert_eq!(
        events[0],
        ExperimentEvent::StatusChanged(ExperimentStatus::Configuring)
    );
    assert_eq!(events[1], ExperimentEvent::StatusChanged(ExperimentStatus::Running));
    assert_eq!(
        events[2],
        ExperimentEvent::ReplicationStarted { replication: 1 }
    );
    let rounds: Vec<(u32, u32)> = events
        .iter()
        .filter_map(|e| match e {
            ExperimentEvent::RoundCompleted(r) => Some((r.replication, r.round)),
            _ => None,
        })
        .collect();
    assert_eq!(rounds, vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]);
    assert!(matches!(events.last(), Some(ExperimentEvent::Completed(_))));

    // A finished experiment can be reset back to idle
    handle.reset();
    assert_eq!(handle.status(), ExperimentStatus::Idle);
}

/// Test that all firms are asked concurrently within a round
#[tokio::test]
async fn test_decisions_are_collected_simultaneously() {
    let market = MarketConfig::symmetric(
        CompetitionMode::Cournot,
        3,
        DemandFunctionSpec::linear(100.0, 1.0),
        10.0,
        0.0,
    )
    .with_schedule(2, 1);
    let run = RunSettings {
        decision_timeout_ms: 5_000,
        ..Default::default()
    };

    // A sequential collector would never get past the barrier
    let summary = run_experiment(
        config(market, run),
        Arc::new(BarrierProvider {
            barrier: Barrier::new(3),
        }),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_rounds(), 2);
    assert_eq!(summary.replications[0].rounds[0].decisions(), vec![20.0; 3]);
}

/// Test that draws follow the variation policy and the seed
#[tokio::test]
async fn test_variation_policy_scopes_draws() {
    let _ = env_logger::try_init();

    let mut market = duopoly(3, 2);
    market.firms[0].linear_cost = ParameterSpec::uniform(5.0, 15.0);
    let run = RunSettings {
        seed: Some(42),
        ..Default::default()
    };

    let costs = |summary: &oligopoly_runner::ExperimentSummary| -> Vec<Vec<f64>> {
        summary
            .replications
            .iter()
            .map(|rep| {
                rep.rounds
                    .iter()
                    .map(|r| r.parameters.firms[0].costs.linear)
                    .collect()
            })
            .collect()
    };

    let fixed = run_experiment(
        config(market.clone().with_variation(VariationPolicy::Fixed), run.clone()),
        Arc::new(Scripted(vec![20.0, 20.0])),
    )
    .await
    .unwrap();
    let fixed = costs(&fixed);
    assert!(fixed.iter().flatten().all(|&c| c == fixed[0][0]));
    assert!((5.0..=15.0).contains(&fixed[0][0]));

    let per_replication = run_experiment(
        config(
            market.clone().with_variation(VariationPolicy::PerReplication),
            run.clone(),
        ),
        Arc::new(Scripted(vec![20.0, 20.0])),
    )
    .await
    .unwrap();
    let per_replication = costs(&per_replication);
    for rep in &per_replication {
        assert!(rep.iter().all(|&c| c == rep[0]));
    }
    assert_ne!(per_replication[0][0], per_replication[1][0]);

    let per_round_config = config(
        market.clone().with_variation(VariationPolicy::PerRound),
        run.clone(),
    );
    let per_round = run_experiment(
        per_round_config.clone(),
        Arc::new(Scripted(vec![20.0, 20.0])),
    )
    .await
    .unwrap();
    let per_round = costs(&per_round);
    assert_ne!(per_round[0][0], per_round[0][1]);
    assert_ne!(per_round[0][1], per_round[0][2]);

    // Same seed, same draws
    let again = run_experiment(per_round_config, Arc::new(Scripted(vec![20.0, 20.0])))
        .await
        .unwrap();
    assert_eq!(costs(&again), per_round);
}

/// Test that a pause takes effect at the next round boundary and resume continues
#[tokio::test]
async fn test_pause_and_resume_between_rounds() {
    let gate = Arc::new(Semaphore::new(0));
    let mut experiment = Experiment::new(
        config(duopoly(3, 1), RunSettings::default()),
        Arc::new(Gated {
            gate: Arc::clone(&gate),
        }),
    )
    .unwrap();
    let handle = experiment.handle();
    let mut events = experiment.subscribe();
    let task = tokio::spawn(experiment.run());

    handle.wait_for(ExperimentStatus::Running).await;
    handle.pause().unwrap();
    // Let round 1 finish; the pause applies before round 2
    gate.add_permits(2);
    handle.wait_for(ExperimentStatus::Paused).await;

    let completed = drain(&mut events)
        .iter()
        .filter(|e| matches!(e, ExperimentEvent::RoundCompleted(_)))
        .count();
    assert_eq!(completed, 1);
    assert!(handle.pause().is_err());

    handle.resume().unwrap();
    gate.add_permits(4);
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.total_rounds(), 3);
    assert_eq!(handle.status(), ExperimentStatus::Completed);
}

/// Test that a reset issued before the run starts does not cancel it
#[tokio::test]
async fn test_reset_before_run_is_ignored() {
    let experiment = Experiment::new(
        config(duopoly(2, 1), RunSettings::default()),
        Arc::new(Scripted(vec![30.0, 30.0])),
    )
    .unwrap();
    let handle = experiment.handle();

    handle.reset();
    assert_eq!(handle.status(), ExperimentStatus::Idle);

    let summary = experiment.run().await.unwrap();
    assert_eq!(summary.total_rounds(), 2);
    assert_eq!(handle.status(), ExperimentStatus::Completed);
}

/// Test that reset cancels in-flight requests and discards results
#[tokio::test]
async fn test_reset_cancels_running_experiment() {
    let gate = Arc::new(Semaphore::new(0));
    let mut experiment = Experiment::new(
        config(duopoly(3, 1), RunSettings::default()),
        Arc::new(Gated {
            gate: Arc::clone(&gate),
        }),
    )
    .unwrap();
    let handle = experiment.handle();
    let mut events = experiment.subscribe();
    let task = tokio::spawn(experiment.run());

    handle.wait_for(ExperimentStatus::Running).await;
    handle.reset();

    let result = task.await.unwrap();
    assert_eq!(result, Err(ExperimentError::Cancelled));
    assert_eq!(handle.status(), ExperimentStatus::Idle);

    let events = drain(&mut events);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, ExperimentEvent::RoundCompleted(_) | ExperimentEvent::Completed(_)))
    );
    assert_eq!(
        events.last(),
        Some(&ExperimentEvent::StatusChanged(ExperimentStatus::Idle))
    );
}

/// Test that a timeout aborts the run under the default policy
#[tokio::test(start_paused = true)]
async fn test_timeout_aborts_by_default() {
    let run = RunSettings {
        decision_timeout_ms: 50,
        ..Default::default()
    };
    let experiment = Experiment::new(config(duopoly(3, 1), run), Arc::new(Silent)).unwrap();
    let handle = experiment.handle();

    let result = experiment.run().await;
    assert_eq!(
        result,
        Err(ExperimentError::RoundFailed {
            replication: 1,
            round: 1,
            source: ProviderError::Timeout {
                firm: FirmId(2),
                after_ms: 50,
            },
        })
    );
    assert_eq!(handle.status(), ExperimentStatus::CompletedWithError);
}

/// Test that the substitute policy reuses the last decision and flags it
#[tokio::test(start_paused = true)]
async fn test_timeout_substitutes_previous_decision() {
    let run = RunSettings {
        decision_timeout_ms: 50,
        failure_policy: DecisionFailurePolicy::Substitute { value: 5.0 },
        ..Default::default()
    };

    let summary = run_experiment(config(duopoly(3, 1), run), Arc::new(Silent))
        .await
        .unwrap();

    for round in &summary.replications[0].rounds {
        let firm1 = round.outcome(FirmId(1)).unwrap();
        let firm2 = round.outcome(FirmId(2)).unwrap();
        assert_eq!(firm1.decision, 20.0);
        assert!(!firm1.substituted);
        assert_eq!(firm2.decision, 5.0);
        assert!(firm2.substituted);
    }
}

/// Test that the pause policy holds the experiment and replays the failed round
#[tokio::test]
async fn test_failure_pauses_and_replays_round() {
    let run = RunSettings {
        failure_policy: DecisionFailurePolicy::Pause,
        ..Default::default()
    };
    let mut experiment = Experiment::new(
        config(duopoly(2, 1), run),
        Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        }),
    )
    .unwrap();
    let handle = experiment.handle();
    let mut events = experiment.subscribe();
    let task = tokio::spawn(experiment.run());

    handle.wait_for(ExperimentStatus::Paused).await;
    let failed = drain(&mut events).into_iter().find_map(|e| match e {
        ExperimentEvent::RoundFailed {
            replication,
            round,
            error,
        } => Some((replication, round, error.firm())),
        _ => None,
    });
    assert_eq!(failed, Some((1, 1, FirmId(2))));

    handle.resume().unwrap();
    let summary = task.await.unwrap().unwrap();

    let rounds = &summary.replications[0].rounds;
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0].round, 1);
    assert!(rounds.iter().all(|r| r.decisions() == vec![30.0, 30.0]));
    assert!(rounds.iter().flat_map(|r| &r.firms).all(|o| !o.substituted));
}

/// Test that communication turns cycle through firms and precede decisions
#[tokio::test]
async fn test_communication_turns_cycle_firms() {
    let recorder = Arc::new(Recorder::default());
    let run = RunSettings {
        communication_turns: 3,
        ..Default::default()
    };

    let summary = run_experiment(config(duopoly(1, 1), run), recorder.clone())
        .await
        .unwrap();

    let messages = &summary.replications[0].rounds[0].messages;
    let order: Vec<(FirmId, u32)> = messages.iter().map(|m| (m.firm, m.turn)).collect();
    assert_eq!(order, vec![(FirmId(1), 1), (FirmId(2), 2), (FirmId(1), 3)]);
    assert_eq!(messages[1].text, "hello from firm-2");

    let seen = recorder.message_contexts.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![(FirmId(1), 1, 0), (FirmId(2), 2, 1), (FirmId(1), 3, 2)]
    );

    let contexts = recorder.contexts.lock().unwrap();
    assert_eq!(contexts.len(), 2);
    assert!(contexts.iter().all(|(_, ctx)| ctx.messages.len() == 3));
}

/// Test that contexts only carry what the disclosure allows
#[tokio::test]
async fn test_disclosure_controls_context() {
    let full = Arc::new(Recorder::default());
    let run = RunSettings {
        disclosure: InformationDisclosure::full(),
        ..Default::default()
    };
    run_experiment(config(duopoly(2, 1), run), full.clone())
        .await
        .unwrap();

    {
        let contexts = full.contexts.lock().unwrap();
        let (firm, ctx) = contexts
            .iter()
            .find(|(firm, ctx)| *firm == FirmId(1) && ctx.round == 2)
            .unwrap();
        assert_eq!(*firm, FirmId(1));
        assert!(ctx.demand.is_some());
        assert_eq!(ctx.own_costs.unwrap().linear, 10.0);
        assert_eq!(ctx.rival_costs.len(), 1);
        assert_eq!(ctx.rival_costs[0].0, FirmId(2));
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.history[0].rival_decisions, vec![(FirmId(2), 20.0)]);
    }

    let minimal = Arc::new(Recorder::default());
    let run = RunSettings {
        disclosure: InformationDisclosure::minimal(),
        ..Default::default()
    };
    run_experiment(config(duopoly(2, 1), run), minimal.clone())
        .await
        .unwrap();

    let contexts = minimal.contexts.lock().unwrap();
    let (_, ctx) = contexts.iter().find(|(_, ctx)| ctx.round == 2).unwrap();
    assert!(ctx.demand.is_none());
    assert!(ctx.own_costs.is_none());
    assert!(ctx.rival_costs.is_empty());
    assert_eq!(ctx.history.len(), 1);
    assert!(ctx.history[0].rival_decisions.is_empty());
    // Own outcomes are always visible
    assert_eq!(ctx.history[0].own_decision, 20.0);
}

/// Test that repeated best responses settle at the Cournot-Nash quantity
#[tokio::test]
async fn test_best_response_play_converges_to_nash() {
    let _ = env_logger::try_init();

    let summary = run_experiment(
        config(duopoly(30, 1), RunSettings::default()),
        Arc::new(BestResponseProvider::new(10.0)),
    )
    .await
    .unwrap();

    let nash = summary.equilibria.nash.firm(FirmId(1)).unwrap().quantity;
    assert_relative_eq!(nash, 30.0, epsilon = 1e-9);

    let last = summary.replications[0].rounds.last().unwrap();
    for decision in last.decisions() {
        assert_relative_eq!(decision, nash, epsilon = 1e-2);
    }
}

/// Test that invalid configurations are rejected before anything runs
#[tokio::test]
async fn test_invalid_config_rejected() {
    let market = duopoly(3, 1).with_gamma(2.0);
    let result = Experiment::new(
        config(market, RunSettings::default()),
        Arc::new(Scripted(vec![1.0, 1.0])),
    );
    assert!(matches!(
        result,
        Err(ExperimentError::Config(
            oligopoly_core::ConfigError::GammaOutOfRange(_)
        ))
    ));
}
