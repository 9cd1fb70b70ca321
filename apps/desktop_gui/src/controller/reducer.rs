//! Folds backend events into the state the window renders.

use client_core::Controls;
use shared::{
    domain::Address,
    view::{StopwatchView, TransactionState},
};

use crate::controller::events::{UiError, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalletState {
    #[default]
    Unknown,
    Connected(Address),
    Missing,
}

#[derive(Debug, Clone)]
pub struct UiModel {
    pub wallet: WalletState,
    pub view: StopwatchView,
    pub tx: TransactionState,
    pub auto_refresh: bool,
    pub status: String,
    pub last_error: Option<UiError>,
}

impl UiModel {
    pub fn new(auto_refresh: bool) -> Self {
        Self {
            wallet: WalletState::Unknown,
            view: StopwatchView::default(),
            tx: TransactionState::default(),
            auto_refresh,
            status: "Connecting...".to_string(),
            last_error: None,
        }
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::WalletConnected(account) => {
                self.wallet = WalletState::Connected(account);
                self.status = format!("Connected as {account}");
            }
            UiEvent::WalletMissing => {
                self.wallet = WalletState::Missing;
                self.status = "No wallet account available".to_string();
            }
            UiEvent::ViewUpdated(view) => self.view = view,
            UiEvent::TransactionUpdated(tx) => {
                if let Some(err) = &tx.error {
                    self.status = format!("Error calling {}: {}", err.function, err.message);
                } else if tx.is_confirmed {
                    self.status = "Transaction confirmed!".to_string();
                    self.last_error = None;
                } else if tx.is_confirming {
                    self.status = "Waiting for confirmation...".to_string();
                }
                self.tx = tx;
            }
            UiEvent::AutoRefreshChanged(enabled) => {
                self.auto_refresh = enabled;
                self.status = if enabled {
                    "Auto-refresh on".to_string()
                } else {
                    "Auto-refresh off".to_string()
                };
            }
            UiEvent::Error(err) => {
                self.status = err.message().to_string();
                self.last_error = Some(err);
            }
        }
    }

    pub fn controls(&self) -> Controls {
        Controls::from_state(&self.view, &self.tx)
    }

    pub fn wallet_connected(&self) -> bool {
        matches!(self.wallet, WalletState::Connected(_))
    }
}
