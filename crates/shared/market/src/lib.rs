//! Oligopoly Market
//!
//! Everything needed to turn firm decisions into a market outcome:
//!
//! - [`ParameterRandomizer`]: draws concrete values from declared distributions
//! - [`demand`]: price (Cournot) and allocated quantity (Bertrand) per demand family
//! - [`resolver`]: per-firm price, quantity, revenue, cost and profit for one round
//! - [`best_response`]: a firm's profit-maximizing reply to fixed rival decisions
//!
//! All functions here are pure except the randomizer, which owns its random source.

pub mod best_response;
pub mod demand;
pub mod error;
pub mod numeric;
pub mod randomizer;
pub mod resolver;

pub use best_response::best_response;
pub use demand::{Evaluated, PRICE_TIE_TOLERANCE};
pub use error::{MarketError, Result};
pub use randomizer::ParameterRandomizer;
pub use resolver::{MarketOutcome, aggregate_price, resolve_outcome, resolve_round};
