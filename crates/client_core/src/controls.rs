use std::fmt;

use shared::view::{StopwatchView, TransactionState};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopwatchAction {
    Start,
    Stop,
    Reset,
    Refresh,
}

impl StopwatchAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for StopwatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} is not available: {reason}")]
pub struct ActionRejected {
    pub action: StopwatchAction,
    pub reason: &'static str,
}

/// Which controls are enabled for a given view and transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub stop: bool,
    pub reset: bool,
    pub refresh: bool,
    busy: bool,
}

impl Controls {
    pub fn from_state(view: &StopwatchView, tx: &TransactionState) -> Self {
        let busy = tx.is_loading;
        Self {
            start: !busy && !view.is_running,
            stop: !busy && view.is_running,
            reset: !busy,
            refresh: true,
            busy,
        }
    }

    pub fn permits(&self, action: StopwatchAction) -> bool {
        match action {
            StopwatchAction::Start => self.start,
            StopwatchAction::Stop => self.stop,
            StopwatchAction::Reset => self.reset,
            StopwatchAction::Refresh => self.refresh,
        }
    }

    pub fn check(&self, action: StopwatchAction) -> Result<(), ActionRejected> {
        if self.permits(action) {
            return Ok(());
        }
        let reason = if self.busy {
            "a transaction is still in progress"
        } else if action == StopwatchAction::Start {
            "the stopwatch is already running"
        } else {
            "the stopwatch is not running"
        };
        Err(ActionRejected { action, reason })
    }
}
