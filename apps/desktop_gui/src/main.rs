use std::path::PathBuf;

use clap::Parser;
use client_core::config::{load_settings, Settings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::StopwatchApp;

#[derive(Parser, Debug)]
#[command(name = "stopwatch-gui", about = "Desktop window for an on-chain stopwatch")]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract: Option<String>,
    #[arg(long)]
    account: Option<String>,
    /// Start with auto-refresh disabled.
    #[arg(long)]
    no_auto_refresh: bool,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(v) = &self.rpc_url {
            settings.rpc_url = v.clone();
        }
        if let Some(v) = &self.contract {
            settings.contract_address = Some(v.clone());
        }
        if let Some(v) = &self.account {
            settings.account = Some(v.clone());
        }
        if self.no_auto_refresh {
            settings.auto_refresh = false;
        }
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Args::parse().settings()?;
    let auto_refresh = settings.auto_refresh;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    let _backend = backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("On-chain Stopwatch")
            .with_inner_size([560.0, 420.0])
            .with_min_inner_size([420.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "On-chain Stopwatch",
        options,
        Box::new(move |_cc| Ok(Box::new(StopwatchApp::new(cmd_tx, ui_rx, auto_refresh)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run desktop window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_override_flags() {
        let args = Args::try_parse_from([
            "stopwatch-gui",
            "--config",
            "does-not-exist.toml",
            "--rpc-url",
            "http://localhost:9999",
            "--no-auto-refresh",
        ])
        .expect("parse");
        assert!(args.no_auto_refresh);
        assert_eq!(args.rpc_url.as_deref(), Some("http://localhost:9999"));
    }
}
