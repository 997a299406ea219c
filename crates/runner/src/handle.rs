//! Control handle for a running experiment

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Result;
use crate::status::{Action, ExperimentStatus};

/// Signal from handles to the experiment loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Run,
    Pause,
    Reset,
}

/// Clonable remote control: pause, resume, reset and status queries
///
/// Pausing takes effect at the next round boundary; a round whose decisions are
/// being collected always completes. Reset cancels outstanding decision requests.
#[derive(Clone)]
pub struct ExperimentHandle {
    control: Arc<watch::Sender<Control>>,
    status: Arc<watch::Sender<ExperimentStatus>>,
}

impl ExperimentHandle {
    pub(crate) fn new(
        control: Arc<watch::Sender<Control>>,
        status: Arc<watch::Sender<ExperimentStatus>>,
    ) -> Self {
        Self { control, status }
    }

    pub fn status(&self) -> ExperimentStatus {
        *self.status.borrow()
    }

    /// Watch status changes
    pub fn subscribe_status(&self) -> watch::Receiver<ExperimentStatus> {
        self.status.subscribe()
    }

    /// Wait until the experiment reaches `target`
    pub async fn wait_for(&self, target: ExperimentStatus) {
        let mut rx = self.status.subscribe();
        // The sender lives in this handle, so the channel cannot close here
        let _ = rx.wait_for(|status| *status == target).await;
    }

    /// Request a pause at the next round boundary
    pub fn pause(&self) -> Result<()> {
        self.status().apply(Action::Pause)?;
        self.control.send_replace(Control::Pause);
        log::info!("Pause requested");
        Ok(())
    }

    /// Resume a paused experiment, or withdraw a pause not yet taken
    pub fn resume(&self) -> Result<()> {
        let pending_pause =
            self.status() == ExperimentStatus::Running && *self.control.borrow() == Control::Pause;
        if !pending_pause {
            self.status().apply(Action::Resume)?;
        }
        self.control.send_replace(Control::Run);
        log::info!("Resume requested");
        Ok(())
    }

    /// Discard everything and return to idle
    ///
    /// An active experiment loop cancels in-flight requests and returns
    /// `ExperimentError::Cancelled`; a finished experiment simply goes back to idle.
    /// Nothing happens before the experiment has started.
    pub fn reset(&self) {
        if self.status() == ExperimentStatus::Idle {
            log::debug!("Reset ignored: experiment not started");
            return;
        }
        self.control.send_replace(Control::Reset);
        if !self.status().is_active() {
            self.status.send_replace(ExperimentStatus::Idle);
        }
        log::info!("Reset requested");
    }
}
