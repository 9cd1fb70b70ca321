use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, Settings},
    ActionOutcome, AutoRefresh, ContractEvent, StopwatchAction, StopwatchContract,
};
use shared::view::{StopwatchView, TransactionState};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stopwatch", about = "Start, stop, reset and watch an on-chain stopwatch")]
struct Args {
    /// Config file (defaults to ./stopwatch.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    #[arg(long, global = true)]
    contract: Option<String>,
    /// Sender account; defaults to the node's first unlocked account.
    #[arg(long, global = true)]
    account: Option<String>,
    /// Print views as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read and print the current stopwatch state.
    Status,
    Start {
        /// Wait for the transaction to be confirmed.
        #[arg(long)]
        wait: bool,
    },
    Stop {
        #[arg(long)]
        wait: bool,
    },
    Reset {
        #[arg(long)]
        wait: bool,
    },
    /// Poll the contract and print every refreshed view until Ctrl-C.
    Watch {
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Skip ticks while a previous refresh is still outstanding.
        #[arg(long)]
        coalesce: bool,
    },
}

impl Args {
    fn settings(&self) -> Result<Settings> {
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
        if let Command::Watch {
            interval_ms,
            coalesce,
        } = &self.command
        {
            if let Some(v) = interval_ms {
                settings.refresh_interval_ms = *v;
            }
            settings.coalesce_refresh |= *coalesce;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = args.settings()?;
    let contract = client_core::connect(&settings).context("failed to configure contract client")?;

    let result = match args.command {
        Command::Status => status(&contract, args.json).await,
        Command::Start { wait } => write(&contract, StopwatchAction::Start, wait, args.json).await,
        Command::Stop { wait } => write(&contract, StopwatchAction::Stop, wait, args.json).await,
        Command::Reset { wait } => write(&contract, StopwatchAction::Reset, wait, args.json).await,
        Command::Watch { .. } => watch(&contract, &settings, args.json).await,
    };
    contract.shutdown();
    result
}

async fn status(contract: &StopwatchContract, json: bool) -> Result<()> {
    match contract.connected_account().await {
        Ok(Some(account)) => println!("Wallet: {account}"),
        Ok(None) => println!("Wallet: not connected"),
        Err(err) => println!("Wallet: unavailable ({err})"),
    }
    let outcome = contract.refresh().await;
    print_view(&outcome.view, json)?;
    if !outcome.is_complete() {
        let failed: Vec<&str> = outcome.failed.iter().map(|f| f.name()).collect();
        tracing::warn!("some reads failed and show defaults: {}", failed.join(", "));
    }
    Ok(())
}

async fn write(
    contract: &std::sync::Arc<StopwatchContract>,
    action: StopwatchAction,
    wait: bool,
    json: bool,
) -> Result<()> {
    if contract.connected_account().await?.is_none() {
        bail!("no wallet account connected; unlock an account on the node or pass --account");
    }
    contract.refresh().await;
    let mut events = contract.subscribe_events();

    let hash = match contract.perform(action).await {
        Ok(ActionOutcome::Submitted(hash)) => hash,
        Ok(ActionOutcome::Refreshed) => return Ok(()),
        Err(err) => {
            tracing::error!("error calling {action}: {err}");
            return Err(err.into());
        }
    };
    println!("Transaction hash: {hash}");
    if !wait {
        return Ok(());
    }

    println!("Waiting for confirmation...");
    let state = wait_for_settlement(&mut events).await?;
    if let Some(error) = state.error {
        bail!("{} failed: {}", error.function, error.message);
    }
    println!("Transaction confirmed!");
    print_view(&contract.read_all().await, json)
}

async fn wait_for_settlement(events: &mut Receiver<ContractEvent>) -> Result<TransactionState> {
    loop {
        match events.recv().await {
            Ok(ContractEvent::TransactionUpdated(state))
                if state.is_confirmed || state.error.is_some() =>
            {
                return Ok(state)
            }
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => bail!("contract event stream closed"),
        }
    }
}

async fn watch(
    contract: &std::sync::Arc<StopwatchContract>,
    settings: &Settings,
    json: bool,
) -> Result<()> {
    let mut events = contract.subscribe_events();
    print_view(&contract.read_all().await, json)?;

    let token = CancellationToken::new();
    let _refresh = AutoRefresh::spawn(contract.clone(), settings.refresh_options(), token.clone());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                token.cancel();
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(ContractEvent::ViewUpdated(view)) => print_view(&view, json)?,
                Ok(ContractEvent::TransactionUpdated(_)) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

fn print_view(view: &StopwatchView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(view)?);
        return Ok(());
    }
    println!(
        "Elapsed: {}  Status: {}  Started: {}  Chain time: {}",
        view.elapsed_time,
        if view.is_running { "Running" } else { "Stopped" },
        view.start_time,
        view.current_time
    );
    Ok(())
}
