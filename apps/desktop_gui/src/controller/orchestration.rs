//! Command orchestration helpers from UI actions to backend command queue.

use client_core::StopwatchAction;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::reducer::UiModel;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            false
        }
    }
}

/// Queues `action` when the current model enables it.
pub fn request_action(
    cmd_tx: &Sender<BackendCommand>,
    model: &mut UiModel,
    action: StopwatchAction,
) -> bool {
    if action != StopwatchAction::Refresh && !model.wallet_connected() {
        model.status = "Connect a wallet account before sending transactions".to_string();
        return false;
    }
    if let Err(rejected) = model.controls().check(action) {
        model.status = rejected.to_string();
        return false;
    }
    dispatch_backend_command(cmd_tx, BackendCommand::Perform(action), &mut model.status)
}

pub fn set_auto_refresh(cmd_tx: &Sender<BackendCommand>, model: &mut UiModel, enabled: bool) {
    if dispatch_backend_command(
        cmd_tx,
        BackendCommand::SetAutoRefresh(enabled),
        &mut model.status,
    ) {
        model.auto_refresh = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{events::UiEvent, reducer::WalletState};
    use crossbeam_channel::bounded;
    use shared::view::{StopwatchView, TransactionState};

    fn connected_model() -> UiModel {
        let mut model = UiModel::new(true);
        model.wallet = WalletState::Connected(
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
                .parse()
                .expect("address"),
        );
        model
    }

    #[test]
    fn enabled_action_is_queued() {
        let (tx, rx) = bounded(4);
        let mut model = connected_model();
        assert!(request_action(&tx, &mut model, StopwatchAction::Start));
        assert_eq!(
            rx.try_recv().expect("queued"),
            BackendCommand::Perform(StopwatchAction::Start)
        );
    }

    #[test]
    fn disabled_action_is_not_queued() {
        let (tx, rx) = bounded(4);
        let mut model = connected_model();
        model.apply(UiEvent::ViewUpdated(StopwatchView {
            is_running: true,
            ..StopwatchView::default()
        }));
        assert!(!request_action(&tx, &mut model, StopwatchAction::Start));
        assert!(rx.try_recv().is_err());
        assert!(model.status.contains("already running"));
    }

    #[test]
    fn writes_need_a_wallet_but_refresh_does_not() {
        let (tx, rx) = bounded(4);
        let mut model = UiModel::new(true);
        model.apply(UiEvent::WalletMissing);
        assert!(!request_action(&tx, &mut model, StopwatchAction::Reset));
        assert!(request_action(&tx, &mut model, StopwatchAction::Refresh));
        assert_eq!(
            rx.try_recv().expect("queued"),
            BackendCommand::Perform(StopwatchAction::Refresh)
        );
    }

    #[test]
    fn busy_transaction_blocks_writes() {
        let (tx, _rx) = bounded(4);
        let mut model = connected_model();
        model.apply(UiEvent::TransactionUpdated(TransactionState {
            is_loading: true,
            ..TransactionState::default()
        }));
        assert!(!request_action(&tx, &mut model, StopwatchAction::Reset));
        assert!(model.status.contains("still in progress"));
    }

    #[test]
    fn full_or_closed_queue_reports_status() {
        let (tx, rx) = bounded(1);
        let mut status = String::new();
        assert!(dispatch_backend_command(&tx, BackendCommand::CheckWallet, &mut status));
        assert!(!dispatch_backend_command(&tx, BackendCommand::CheckWallet, &mut status));
        assert!(status.contains("full"));

        drop(rx);
        assert!(!dispatch_backend_command(&tx, BackendCommand::CheckWallet, &mut status));
        assert!(status.contains("disconnected"));
    }

    #[test]
    fn auto_refresh_toggle_is_optimistic() {
        let (tx, rx) = bounded(4);
        let mut model = connected_model();
        set_auto_refresh(&tx, &mut model, false);
        assert!(!model.auto_refresh);
        assert_eq!(
            rx.try_recv().expect("queued"),
            BackendCommand::SetAutoRefresh(false)
        );
    }
}
