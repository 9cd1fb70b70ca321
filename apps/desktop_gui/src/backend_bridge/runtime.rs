//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{
    config::Settings, ActionOutcome, AutoRefresh, ContractEvent, StopwatchAction,
    StopwatchContract,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(settings, cmd_rx, ui_tx));
    })
}

async fn run(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let contract = match client_core::connect(&settings) {
        Ok(contract) => contract,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: {err}"),
            )));
            tracing::error!("invalid contract configuration: {err}");
            return;
        }
    };
    tracing::info!(contract = %contract.address(), rpc = %settings.rpc_url, "backend worker ready");

    let token = CancellationToken::new();
    let event_task = tokio::spawn(forward_events(contract.subscribe_events(), ui_tx.clone()));

    check_wallet(&contract, &ui_tx).await;
    let initial = contract.refresh().await;
    if !initial.is_complete() {
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Some reads failed: {}",
            initial
                .failed
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut auto_refresh = None;
    set_auto_refresh(&mut auto_refresh, settings.auto_refresh, &contract, &settings, &token, &ui_tx);

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::CheckWallet => check_wallet(&contract, &ui_tx).await,
            BackendCommand::Perform(action) => {
                tokio::spawn(perform(contract.clone(), action, ui_tx.clone()));
            }
            BackendCommand::SetAutoRefresh(enabled) => set_auto_refresh(
                &mut auto_refresh,
                enabled,
                &contract,
                &settings,
                &token,
                &ui_tx,
            ),
        }
    }

    tracing::info!("ui command queue closed; stopping backend worker");
    drop(auto_refresh);
    contract.shutdown();
    token.cancel();
    event_task.abort();
}

async fn forward_events(mut events: broadcast::Receiver<ContractEvent>, ui_tx: Sender<UiEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if ui_tx.try_send(event.into()).is_err() {
                    tracing::debug!("ui event queue unavailable; dropping contract event");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "ui event forwarder lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn check_wallet(contract: &StopwatchContract, ui_tx: &Sender<UiEvent>) {
    let event = match contract.connected_account().await {
        Ok(Some(account)) => UiEvent::WalletConnected(account),
        Ok(None) => UiEvent::WalletMissing,
        Err(err) => {
            tracing::warn!("wallet check failed: {err}");
            UiEvent::Error(UiError::from_chain(UiErrorContext::WalletCheck, &err))
        }
    };
    let _ = ui_tx.try_send(event);
}

async fn perform(contract: Arc<StopwatchContract>, action: StopwatchAction, ui_tx: Sender<UiEvent>) {
    match contract.perform(action).await {
        Ok(ActionOutcome::Submitted(hash)) => tracing::debug!(%hash, "{action} submitted"),
        Ok(ActionOutcome::Refreshed) => {}
        Err(err) => {
            tracing::error!("error calling {action}: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_action(&err)));
        }
    }
}

fn set_auto_refresh(
    slot: &mut Option<AutoRefresh>,
    enabled: bool,
    contract: &Arc<StopwatchContract>,
    settings: &Settings,
    token: &CancellationToken,
    ui_tx: &Sender<UiEvent>,
) {
    match (enabled, slot.is_some()) {
        (true, false) => {
            *slot = Some(AutoRefresh::spawn(
                contract.clone(),
                settings.refresh_options(),
                token.child_token(),
            ));
        }
        // Dropping the handle cancels its timer.
        (false, true) => *slot = None,
        _ => {}
    }
    let _ = ui_tx.try_send(UiEvent::AutoRefreshChanged(enabled));
}
