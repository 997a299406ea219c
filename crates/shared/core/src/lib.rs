//! Oligopoly Core Domain
//!
//! Pure domain types for Cournot/Bertrand market experiments.
//! This crate contains no async, no I/O beyond config parsing, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Benchmarks
    EquilibriumKind,
    EquilibriumReport,
    EquilibriumResult,
    FirmEquilibrium,
    LimitPricingAnalysis,
    LimitPricingRegime,
    // Configuration
    CompetitionMode,
    CostParams,
    DemandFamily,
    DemandFunctionSpec,
    DemandParams,
    FirmDemandSpec,
    FirmSpec,
    LegacyFirmInfo,
    LegacyMarketConfig,
    LegacyValue,
    MarketConfig,
    ParameterSpec,
    VariationPolicy,
    // Realized draws and results
    FirmMessage,
    FirmOutcome,
    FirmSummary,
    RealizedFirm,
    RealizedParameters,
    ReplicationResult,
    RoundResult,
};
pub use error::{ConfigError, Result};
pub use values::{FirmId, MIN_POSITIVE};
