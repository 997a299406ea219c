//! Oligopoly Ports
//!
//! Port definitions (traits) for the experiment engine.
//! These define the boundaries between the engine and the decision-making agents.

mod context;
mod decision;
mod error;

pub use context::{HistoryEntry, InformationDisclosure, RoundContext};
pub use decision::{Decision, DecisionProvider};
pub use error::{ProviderError, ProviderResult};
