//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ActionError, ContractEvent};
use shared::{
    domain::Address,
    error::{ChainError, ErrorKind},
    view::{StopwatchView, TransactionState},
};

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    WalletConnected(Address),
    WalletMissing,
    ViewUpdated(StopwatchView),
    TransactionUpdated(TransactionState),
    AutoRefreshChanged(bool),
    Error(UiError),
}

impl From<ContractEvent> for UiEvent {
    fn from(event: ContractEvent) -> Self {
        match event {
            ContractEvent::ViewUpdated(view) => Self::ViewUpdated(view),
            ContractEvent::TransactionUpdated(state) => Self::TransactionUpdated(state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Wallet,
    Rejected,
    Reverted,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    WalletCheck,
    Write,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("no wallet") || lower.contains("no account") {
            UiErrorCategory::Wallet
        } else if lower.contains("reverted") {
            UiErrorCategory::Reverted
        } else if lower.contains("not available") {
            UiErrorCategory::Rejected
        } else if lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("transport")
            || lower.contains("unreachable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_chain(context: UiErrorContext, err: &ChainError) -> Self {
        let category = match err {
            ChainError::NoAccount => UiErrorCategory::Wallet,
            ChainError::Transport(_) => UiErrorCategory::Transport,
            ChainError::Rpc { .. } | ChainError::Decode(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_action(err: &ActionError) -> Self {
        let category = match err {
            ActionError::Rejected(_) => UiErrorCategory::Rejected,
            ActionError::Write(write) if write.kind() == ErrorKind::NoWallet => {
                UiErrorCategory::Wallet
            }
            ActionError::Write(client_core::WriteError::Call {
                source: ChainError::Transport(_),
                ..
            }) => UiErrorCategory::Transport,
            ActionError::Write(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context: UiErrorContext::Write,
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
