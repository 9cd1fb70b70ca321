//! Timer-driven background refresh.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::contract::StopwatchContract;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRefreshOptions {
    pub period: Duration,
    /// Skip a tick while the previous refresh is still outstanding.
    pub coalesce: bool,
}

impl Default for AutoRefreshOptions {
    fn default() -> Self {
        Self {
            period: DEFAULT_REFRESH_INTERVAL,
            coalesce: false,
        }
    }
}

/// Handle to a running refresh loop. Cancels the loop when stopped or dropped;
/// refreshes already in flight run to completion.
pub struct AutoRefresh {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    pub fn spawn(
        contract: Arc<StopwatchContract>,
        options: AutoRefreshOptions,
        token: CancellationToken,
    ) -> Self {
        let task = tokio::spawn(run(contract, options, token.clone()));
        Self {
            token,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the loop and waits for the timer task to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(
    contract: Arc<StopwatchContract>,
    options: AutoRefreshOptions,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + options.period, options.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("auto refresh cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        if options.coalesce && in_flight.swap(true, Ordering::SeqCst) {
            debug!("previous refresh still outstanding; skipping tick");
            continue;
        }

        // Each tick runs on its own task so a slow refresh never delays the timer.
        let contract = Arc::clone(&contract);
        let in_flight = Arc::clone(&in_flight);
        let coalesce = options.coalesce;
        tokio::spawn(async move {
            contract.refresh().await.discard_best_effort();
            if coalesce {
                in_flight.store(false, Ordering::SeqCst);
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/poll_tests.rs"]
mod tests;
