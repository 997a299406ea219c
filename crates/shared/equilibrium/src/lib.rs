//! Oligopoly Equilibrium
//!
//! Theoretical benchmarks for a market configuration, evaluated at the central values
//! of its parameter distributions:
//!
//! - Nash equilibrium (competitive benchmark)
//! - Cooperative equilibrium (joint-profit maximum)
//! - Limit-pricing classification of asymmetric-cost duopolies
//!
//! Linear demand is solved in closed form for any number of firms. Other demand
//! families are solved only where a tractable condition exists; everything else is
//! reported as not calculable rather than approximated.

mod error;
mod homogeneous;
mod limit_pricing;
mod linear;
mod solver;
mod symmetric;

pub use error::SolverError;
pub use homogeneous::monopoly_price;
pub use limit_pricing::analyze_limit_pricing;
pub use solver::{compute_equilibria, solve_cooperative, solve_nash};
