//! Backend commands queued from UI to backend worker.

use client_core::StopwatchAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCommand {
    CheckWallet,
    Perform(StopwatchAction),
    SetAutoRefresh(bool),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckWallet => "check_wallet",
            Self::Perform(StopwatchAction::Start) => "start",
            Self::Perform(StopwatchAction::Stop) => "stop",
            Self::Perform(StopwatchAction::Reset) => "reset",
            Self::Perform(StopwatchAction::Refresh) => "refresh",
            Self::SetAutoRefresh(_) => "set_auto_refresh",
        }
    }
}
