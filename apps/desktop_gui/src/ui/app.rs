use std::time::Duration;

use client_core::StopwatchAction;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiErrorCategory, UiEvent},
    orchestration::{dispatch_backend_command, request_action, set_auto_refresh},
    reducer::{UiModel, WalletState},
};

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

pub struct StopwatchApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    model: UiModel,
}

impl StopwatchApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, auto_refresh: bool) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            model: UiModel::new(auto_refresh),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.model.apply(event);
        }
    }

    fn action_button(&mut self, ui: &mut egui::Ui, action: StopwatchAction, label: &str) {
        let enabled = self.model.controls().permits(action) && self.model.wallet_connected();
        let text = if self.model.tx.is_loading {
            "Processing..."
        } else {
            label
        };
        if ui
            .add_enabled(enabled, egui::Button::new(text).min_size(egui::vec2(96.0, 28.0)))
            .clicked()
        {
            request_action(&self.cmd_tx, &mut self.model, action);
        }
    }

    fn render_no_wallet(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.heading("On-chain Stopwatch");
            ui.add_space(12.0);
            ui.label("Please connect your wallet to use the stopwatch.");
            ui.label("Unlock an account or set `account` in stopwatch.toml, then check again.");
            ui.add_space(12.0);
            if ui.button("Check again").clicked() {
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::CheckWallet,
                    &mut self.model.status,
                );
            }
        });
    }

    fn render_stopwatch(&mut self, ui: &mut egui::Ui) {
        ui.heading("On-chain Stopwatch");
        ui.add_space(8.0);

        let view = self.model.view.clone();
        egui::Grid::new("stopwatch_view")
            .num_columns(2)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                ui.label("Elapsed Time");
                ui.label(egui::RichText::new(&view.elapsed_time).monospace().size(28.0));
                ui.end_row();

                ui.label("Status");
                let (status, color) = if view.is_running {
                    ("Running", egui::Color32::from_rgb(80, 180, 100))
                } else {
                    ("Stopped", egui::Color32::from_rgb(200, 90, 80))
                };
                ui.label(egui::RichText::new(status).strong().color(color));
                ui.end_row();

                ui.label("Start Time");
                ui.monospace(view.start_time.as_str());
                ui.end_row();

                ui.label("Current Chain Time");
                ui.monospace(view.current_time.as_str());
                ui.end_row();
            });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            self.action_button(ui, StopwatchAction::Start, "Start");
            self.action_button(ui, StopwatchAction::Stop, "Stop");
            self.action_button(ui, StopwatchAction::Reset, "Reset");
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let mut auto_refresh = self.model.auto_refresh;
            if ui.checkbox(&mut auto_refresh, "Auto-refresh").changed() {
                set_auto_refresh(&self.cmd_tx, &mut self.model, auto_refresh);
            }
            if ui.button("Refresh now").clicked() {
                request_action(&self.cmd_tx, &mut self.model, StopwatchAction::Refresh);
            }
        });

        self.render_transaction(ui);
        self.render_error(ui);
    }

    fn render_transaction(&self, ui: &mut egui::Ui) {
        let tx = &self.model.tx;
        if tx.hash.is_none() && !tx.is_pending {
            return;
        }
        ui.add_space(12.0);
        egui::Frame::new()
            .fill(ui.visuals().faint_bg_color)
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                if tx.is_pending {
                    ui.label("Submitting transaction...");
                }
                if let Some(hash) = tx.hash {
                    ui.horizontal(|ui| {
                        ui.label("Transaction hash:");
                        ui.monospace(hash.to_string());
                    });
                }
                if tx.is_confirming {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Waiting for confirmation...");
                    });
                }
                if tx.is_confirmed {
                    ui.label(
                        egui::RichText::new("Transaction confirmed!")
                            .color(egui::Color32::from_rgb(80, 180, 100)),
                    );
                }
            });
    }

    fn render_error(&mut self, ui: &mut egui::Ui) {
        let tx_error = self
            .model
            .tx
            .error
            .as_ref()
            .map(|err| format!("Error calling {}: {}", err.function, err.message));
        let ui_error = self.model.last_error.as_ref().map(|err| {
            let prefix = match err.category() {
                UiErrorCategory::Wallet => "Wallet",
                UiErrorCategory::Rejected => "Not allowed",
                UiErrorCategory::Reverted => "Reverted",
                UiErrorCategory::Transport => "Network",
                UiErrorCategory::Unknown => "Error",
            };
            format!("{prefix}: {}", err.message())
        });
        let Some(message) = tx_error.or(ui_error) else {
            return;
        };

        ui.add_space(12.0);
        ui.horizontal_wrapped(|ui| {
            ui.colored_label(ui.visuals().error_fg_color, message);
            if self.model.last_error.is_some() && ui.small_button("Dismiss").clicked() {
                self.model.last_error = None;
            }
        });
    }
}

impl eframe::App for StopwatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.model.wallet {
                    WalletState::Connected(account) => {
                        ui.label(format!("Wallet: {account}"));
                    }
                    WalletState::Missing => {
                        ui.label("Wallet: not connected");
                    }
                    WalletState::Unknown => {
                        ui.label("Wallet: checking...");
                    }
                }
                ui.separator();
                ui.label(self.model.status.as_str());
            });
        });

        let wallet = self.model.wallet;
        egui::CentralPanel::default().show(ctx, |ui| match wallet {
            WalletState::Missing => self.render_no_wallet(ui),
            WalletState::Unknown | WalletState::Connected(_) => self.render_stopwatch(ui),
        });

        // Backend events arrive on another thread.
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
