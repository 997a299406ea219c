//! Oligopoly Runner - Experiment Orchestration
//!
//! Runs repeated-game market experiments between N decision providers:
//!
//! - **Config**: experiment file loading, run settings, failure policy
//! - **Experiment**: replications, rounds, simultaneous decision collection
//! - **Handle**: pause, resume and reset from other tasks
//! - **Summary**: per-firm aggregates against Nash and cooperative benchmarks
//!
//! ## Round flow
//!
//! ```text
//!   ┌──────────────────┐  draw (fixed / per replication / per round)
//!   │   Randomizer     │───────────────────────┐
//!   └──────────────────┘                       ▼
//!                                     ┌──────────────────┐
//!   communication turns ─────────────▶│  RoundContext    │ x N
//!                                     └────────┬─────────┘
//!                                              │ concurrent requests
//!                                              ▼
//!                                     ┌──────────────────┐
//!                                     │ DecisionProvider │
//!                                     └────────┬─────────┘
//!                                              │ N decisions
//!                                              ▼
//!                                     ┌──────────────────┐
//!                                     │  Market Resolver │──▶ RoundResult
//!                                     └──────────────────┘
//! ```

pub mod best_response;
pub mod config;
pub mod error;
pub mod experiment;
pub mod handle;
pub mod status;
pub mod summary;

pub use best_response::BestResponseProvider;
pub use config::{DecisionFailurePolicy, ExperimentConfig, RunSettings};
pub use error::{ExperimentError, Result};
pub use experiment::{Experiment, ExperimentEvent, run_experiment};
pub use handle::ExperimentHandle;
pub use status::{Action, ExperimentStatus};
pub use summary::{ExperimentSummary, FirmBenchmark};
