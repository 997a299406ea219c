//! Experiment lifecycle
//!
//! ```text
//! idle ──configure──▶ configuring ──start──▶ running ◀──resume── paused
//!  ▲                                           │  └───pause────────▲
//!  │                                           ├──complete──▶ completed
//!  └───────────────── reset (from any) ────────┴──fail──────▶ completed-with-error
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentStatus {
    #[default]
    Idle,
    Configuring,
    Running,
    Paused,
    Completed,
    CompletedWithError,
}

impl ExperimentStatus {
    /// Returns true while the experiment loop owns the experiment
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ExperimentStatus::Configuring | ExperimentStatus::Running | ExperimentStatus::Paused
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ExperimentStatus::Completed | ExperimentStatus::CompletedWithError
        )
    }

    /// Next status after `action`, or an error if `action` is not allowed here
    pub fn apply(self, action: Action) -> Result<ExperimentStatus> {
        use Action::*;
        use ExperimentStatus::*;

        let next = match (self, action) {
            (_, Reset) => Idle,
            (Idle, Configure) => Configuring,
            (Configuring, Start) => Running,
            (Running, Pause) => Paused,
            (Paused, Resume) => Running,
            (Running, Complete) => Completed,
            (Configuring | Running | Paused, Fail) => CompletedWithError,
            (from, action) => return Err(ExperimentError::InvalidTransition { from, action }),
        };
        Ok(next)
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExperimentStatus::Idle => "idle",
            ExperimentStatus::Configuring => "configuring",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Paused => "paused",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::CompletedWithError => "completed-with-error",
        };
        f.write_str(name)
    }
}

/// Lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Configure,
    Start,
    Pause,
    Resume,
    Complete,
    Fail,
    Reset,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Configure => "configure",
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Complete => "complete",
            Action::Fail => "fail",
            Action::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = ExperimentStatus::Idle
            .apply(Action::Configure)
            .and_then(|s| s.apply(Action::Start))
            .and_then(|s| s.apply(Action::Pause))
            .and_then(|s| s.apply(Action::Resume))
            .and_then(|s| s.apply(Action::Complete))
            .unwrap();
        assert_eq!(status, ExperimentStatus::Completed);
        assert!(status.is_finished());
    }

    #[test]
    fn test_reset_from_anywhere() {
        for status in [
            ExperimentStatus::Idle,
            ExperimentStatus::Configuring,
            ExperimentStatus::Running,
            ExperimentStatus::Paused,
            ExperimentStatus::Completed,
            ExperimentStatus::CompletedWithError,
        ] {
            assert_eq!(status.apply(Action::Reset), Ok(ExperimentStatus::Idle));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert_eq!(
            ExperimentStatus::Idle.apply(Action::Pause),
            Err(ExperimentError::InvalidTransition {
                from: ExperimentStatus::Idle,
                action: Action::Pause
            })
        );
        assert!(ExperimentStatus::Running.apply(Action::Resume).is_err());
        assert!(ExperimentStatus::Paused.apply(Action::Pause).is_err());
        assert!(ExperimentStatus::Paused.apply(Action::Complete).is_err());
        assert!(ExperimentStatus::Completed.apply(Action::Start).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ExperimentStatus::CompletedWithError.to_string(),
            "completed-with-error"
        );
        let err = ExperimentStatus::Completed.apply(Action::Pause).unwrap_err();
        assert_eq!(err.to_string(), "Cannot pause an experiment that is completed");
    }
}
