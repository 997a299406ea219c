use serde::{Deserialize, Serialize};

/// Smallest positive value a demand argument or shape parameter is floored to
/// before `ln`/power evaluation.
pub const MIN_POSITIVE: f64 = 1e-9;

/// Firm identity, numbered 1..=N in configuration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmId(pub u32);

impl FirmId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Zero-based position of this firm in the canonical firm list
    pub fn index(&self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }

    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }
}

impl std::fmt::Display for FirmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "firm-{}", self.0)
    }
}
