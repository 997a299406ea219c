mod demand;
mod equilibrium;
mod firm;
mod legacy;
mod market;
mod parameter;
mod realized;
mod round;

pub use demand::{DemandFamily, DemandFunctionSpec, DemandParams, FirmDemandSpec};
pub use equilibrium::{
    EquilibriumKind, EquilibriumReport, EquilibriumResult, FirmEquilibrium, LimitPricingAnalysis,
    LimitPricingRegime,
};
pub use firm::FirmSpec;
pub use legacy::{LegacyFirmInfo, LegacyMarketConfig, LegacyValue};
pub use market::{CompetitionMode, MarketConfig, VariationPolicy};
pub use parameter::ParameterSpec;
pub use realized::{CostParams, RealizedFirm, RealizedParameters};
pub use round::{FirmMessage, FirmOutcome, FirmSummary, ReplicationResult, RoundResult};
