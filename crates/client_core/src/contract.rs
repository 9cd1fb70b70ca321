use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chain_client::ChainClient;
use shared::{
    domain::{
        AbiKind, Address, ContractValue, ReadFunction, Receipt, ReceiptStatus, TxHash,
        WriteFunction,
    },
    error::ChainError,
    view::{StopwatchView, TransactionError, TransactionState},
};
use tokio::{
    sync::{broadcast, Mutex, RwLock},
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    controls::{Controls, StopwatchAction},
    error::{ActionError, WriteError},
    format::{format_elapsed, format_raw_timestamp},
    transaction::TransactionTracker,
    ContractEvent,
};

const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(180);
const DEFAULT_RECEIPT_MAX_ERRORS: u32 = 5;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Last observed result of one read; a failed read keeps no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ReadSlot {
    value: Option<ContractValue>,
    is_error: bool,
}

/// How long and how hard to look for a submitted transaction's receipt.
/// Hitting either limit records a write error and releases the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Consecutive failed lookups tolerated before giving up.
    pub max_errors: u32,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            timeout: DEFAULT_RECEIPT_TIMEOUT,
            max_errors: DEFAULT_RECEIPT_MAX_ERRORS,
        }
    }
}

enum ReceiptWait {
    Settled(Receipt),
    Superseded,
    Unavailable(ChainError),
}

/// Which of the four reads failed on their most recent attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadErrors {
    pub elapsed_time: bool,
    pub is_running: bool,
    pub start_time: bool,
    pub current_time: bool,
}

/// Result of a refresh. Failed reads are already defaulted in `view`;
/// `failed` lists them for callers that care about partial data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub view: StopwatchView,
    pub failed: Vec<ReadFunction>,
}

impl RefreshOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Drops the outcome of a background refresh on purpose.
    pub fn discard_best_effort(self) {
        if !self.failed.is_empty() {
            debug!(failed = ?self.failed, "background refresh had failed reads; ignoring");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Submitted(TxHash),
    Refreshed,
}

struct SubmittingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> SubmittingGuard<'a> {
    fn acquire(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Binds a deployed stopwatch contract to display data and write actions.
pub struct StopwatchContract {
    chain: Arc<dyn ChainClient>,
    address: Address,
    receipts: ReceiptOptions,
    reads: RwLock<HashMap<ReadFunction, ReadSlot>>,
    tx: Mutex<TransactionTracker>,
    submitting: AtomicUsize,
    events: broadcast::Sender<ContractEvent>,
    shutdown: CancellationToken,
}

impl StopwatchContract {
    pub fn new(chain: Arc<dyn ChainClient>, address: Address) -> Arc<Self> {
        Self::with_receipt_options(chain, address, ReceiptOptions::default())
    }

    pub fn with_receipt_options(
        chain: Arc<dyn ChainClient>,
        address: Address,
        receipts: ReceiptOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            chain,
            address,
            receipts,
            reads: RwLock::new(HashMap::new()),
            tx: Mutex::new(TransactionTracker::default()),
            submitting: AtomicUsize::new(0),
            events,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ContractEvent> {
        self.events.subscribe()
    }

    pub async fn connected_account(&self) -> Result<Option<Address>, ChainError> {
        self.chain.connected_account().await
    }

    /// Snapshot of the last reads without touching the chain.
    pub async fn view(&self) -> StopwatchView {
        build_view(&*self.reads.read().await)
    }

    pub async fn read_errors(&self) -> ReadErrors {
        let reads = self.reads.read().await;
        let failed = |function: ReadFunction| reads.get(&function).is_some_and(|slot| slot.is_error);
        ReadErrors {
            elapsed_time: failed(ReadFunction::ElapsedTime),
            is_running: failed(ReadFunction::IsRunning),
            start_time: failed(ReadFunction::StartTime),
            current_time: failed(ReadFunction::GetCurrentTime),
        }
    }

    pub async fn transaction_state(&self) -> TransactionState {
        self.tx.lock().await.snapshot(self.is_submitting())
    }

    /// True while a write call is waiting on the chain client.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst) > 0
    }

    pub async fn controls(&self) -> Controls {
        let view = self.view().await;
        let tx = self.transaction_state().await;
        Controls::from_state(&view, &tx)
    }

    /// Issues all four reads and returns the resulting view.
    pub async fn read_all(&self) -> StopwatchView {
        self.refresh().await.view
    }

    /// Issues all four reads concurrently and waits for every one to settle.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (elapsed, running, started, now) = futures::join!(
            self.read_one(ReadFunction::ElapsedTime),
            self.read_one(ReadFunction::IsRunning),
            self.read_one(ReadFunction::StartTime),
            self.read_one(ReadFunction::GetCurrentTime),
        );
        let failed = [elapsed, running, started, now]
            .into_iter()
            .filter_map(|result| result.err())
            .collect();
        self.finish_refresh(failed).await
    }

    /// Re-issues a single read.
    pub async fn refetch(&self, function: ReadFunction) -> RefreshOutcome {
        let failed = self.read_one(function).await.err().into_iter().collect();
        self.finish_refresh(failed).await
    }

    pub async fn start(self: &Arc<Self>) -> Result<TxHash, WriteError> {
        self.write(WriteFunction::Start).await
    }

    pub async fn stop(self: &Arc<Self>) -> Result<TxHash, WriteError> {
        self.write(WriteFunction::Stop).await
    }

    pub async fn reset(self: &Arc<Self>) -> Result<TxHash, WriteError> {
        self.write(WriteFunction::Reset).await
    }

    /// Runs `action` if the current state enables it.
    pub async fn perform(
        self: &Arc<Self>,
        action: StopwatchAction,
    ) -> Result<ActionOutcome, ActionError> {
        self.controls().await.check(action)?;
        let hash = match action {
            StopwatchAction::Start => self.start().await?,
            StopwatchAction::Stop => self.stop().await?,
            StopwatchAction::Reset => self.reset().await?,
            StopwatchAction::Refresh => {
                self.refresh().await;
                return Ok(ActionOutcome::Refreshed);
            }
        };
        Ok(ActionOutcome::Submitted(hash))
    }

    /// Stops background receipt observers. Pending chain calls still settle.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn read_one(&self, function: ReadFunction) -> Result<(), ReadFunction> {
        let result = self
            .chain
            .read_contract(self.address, function)
            .await
            .and_then(|value| check_kind(function, value));

        let mut reads = self.reads.write().await;
        match result {
            Ok(value) => {
                reads.insert(
                    function,
                    ReadSlot {
                        value: Some(value),
                        is_error: false,
                    },
                );
                Ok(())
            }
            Err(err) => {
                warn!(function = function.name(), %err, "contract read failed; using default");
                reads.insert(
                    function,
                    ReadSlot {
                        value: None,
                        is_error: true,
                    },
                );
                Err(function)
            }
        }
    }

    async fn finish_refresh(&self, failed: Vec<ReadFunction>) -> RefreshOutcome {
        let view = self.view().await;
        self.publish(ContractEvent::ViewUpdated(view.clone()));
        RefreshOutcome { view, failed }
    }

    async fn write(self: &Arc<Self>, function: WriteFunction) -> Result<TxHash, WriteError> {
        let generation = self.tx.lock().await.begin();
        self.publish_transaction().await;
        info!(function = function.name(), contract = %self.address, "submitting transaction");

        let submitted = {
            let _submitting = SubmittingGuard::acquire(&self.submitting);
            self.chain.write_contract(self.address, function).await
        };

        match submitted {
            Ok(hash) => {
                let current = self.tx.lock().await.accepted(generation, hash);
                self.publish_transaction().await;
                if current {
                    self.spawn_receipt_watcher(generation, function, hash);
                }
                Ok(hash)
            }
            Err(source) => {
                let error = TransactionError {
                    function,
                    message: source.to_string(),
                };
                self.tx.lock().await.failed(generation, error);
                self.publish_transaction().await;
                Err(WriteError::Call { function, source })
            }
        }
    }

    fn spawn_receipt_watcher(
        self: &Arc<Self>,
        generation: u64,
        function: WriteFunction,
        hash: TxHash,
    ) {
        let contract = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = contract.shutdown.cancelled() => {
                    debug!(%hash, "receipt watcher stopped by shutdown");
                }
                _ = contract.watch_receipt(generation, function, hash) => {}
            }
        });
    }

    async fn watch_receipt(&self, generation: u64, function: WriteFunction, hash: TxHash) {
        let waited = tokio::time::timeout(
            self.receipts.timeout,
            self.wait_for_receipt(generation, hash),
        )
        .await;

        let receipt = match waited {
            Ok(ReceiptWait::Settled(receipt)) => receipt,
            Ok(ReceiptWait::Superseded) => {
                debug!(%hash, "transaction superseded; receipt watcher exiting");
                return;
            }
            Ok(ReceiptWait::Unavailable(err)) => {
                warn!(%hash, %err, "giving up on receipt after repeated lookup failures");
                self.fail_transaction(generation, function, format!("receipt lookup failed: {err}"))
                    .await;
                return;
            }
            Err(_) => {
                warn!(%hash, timeout = ?self.receipts.timeout, "no receipt before timeout");
                self.fail_transaction(
                    generation,
                    function,
                    "timed out waiting for confirmation".to_string(),
                )
                .await;
                return;
            }
        };

        match receipt.status {
            ReceiptStatus::Success => {
                let newly_confirmed = self.tx.lock().await.confirmed(generation);
                if !newly_confirmed {
                    return;
                }
                info!(%hash, block = ?receipt.block_number, "transaction confirmed");
                self.publish_transaction().await;
                self.refresh().await.discard_best_effort();
            }
            ReceiptStatus::Reverted => {
                warn!(%hash, function = function.name(), "transaction reverted");
                self.fail_transaction(generation, function, "transaction reverted".to_string())
                    .await;
            }
        }
    }

    async fn wait_for_receipt(&self, generation: u64, hash: TxHash) -> ReceiptWait {
        let mut ticker = interval(self.receipts.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_errors = 0;

        loop {
            ticker.tick().await;
            if !self.tx.lock().await.is_current(generation) {
                return ReceiptWait::Superseded;
            }

            match self.chain.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return ReceiptWait::Settled(receipt),
                Ok(None) => consecutive_errors = 0,
                Err(err) => {
                    consecutive_errors += 1;
                    debug!(%hash, %err, consecutive_errors, "receipt poll failed");
                    if consecutive_errors >= self.receipts.max_errors.max(1) {
                        return ReceiptWait::Unavailable(err);
                    }
                }
            }
        }
    }

    async fn fail_transaction(&self, generation: u64, function: WriteFunction, message: String) {
        let error = TransactionError { function, message };
        if self.tx.lock().await.failed(generation, error) {
            self.publish_transaction().await;
        }
    }

    async fn publish_transaction(&self) {
        let state = self.transaction_state().await;
        self.publish(ContractEvent::TransactionUpdated(state));
    }

    fn publish(&self, event: ContractEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn check_kind(function: ReadFunction, value: ContractValue) -> Result<ContractValue, ChainError> {
    let matches = match (function.output(), value) {
        (AbiKind::Uint256, ContractValue::Uint(_)) | (AbiKind::Bool, ContractValue::Bool(_)) => {
            true
        }
        _ => false,
    };
    if matches {
        Ok(value)
    } else {
        Err(ChainError::decode(format!(
            "{function} returned {value:?}, expected {:?}",
            function.output()
        )))
    }
}

fn build_view(reads: &HashMap<ReadFunction, ReadSlot>) -> StopwatchView {
    let value = |function: ReadFunction| reads.get(&function).and_then(|slot| slot.value);
    let uint = |function: ReadFunction| value(function).and_then(|v| v.as_uint());

    StopwatchView {
        elapsed_time: format_elapsed(uint(ReadFunction::ElapsedTime)),
        is_running: value(ReadFunction::IsRunning)
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        start_time: format_raw_timestamp(uint(ReadFunction::StartTime)),
        current_time: format_raw_timestamp(uint(ReadFunction::GetCurrentTime)),
    }
}
