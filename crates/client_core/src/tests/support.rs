use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chain_client::ChainClient;
use shared::{
    domain::{Address, ContractValue, ReadFunction, Receipt, ReceiptStatus, TxHash, WriteFunction},
    error::ChainError,
};
use tokio::sync::{Mutex, Notify};

pub const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const HASH: TxHash = TxHash([0x42; 32]);

pub fn contract_address() -> Address {
    CONTRACT.parse().expect("contract address")
}

/// In-memory chain with scripted reads, writes and receipts.
pub struct TestChain {
    pub account: Option<Address>,
    values: Mutex<HashMap<ReadFunction, Result<ContractValue, ChainError>>>,
    read_counts: Mutex<HashMap<ReadFunction, usize>>,
    read_delay: Option<Duration>,
    write_result: Mutex<Result<TxHash, ChainError>>,
    writes: Mutex<Vec<WriteFunction>>,
    write_gate: Option<Arc<Notify>>,
    pub write_entered: Arc<Notify>,
    receipts: Mutex<VecDeque<Result<Option<Receipt>, ChainError>>>,
}

impl TestChain {
    pub fn new() -> Self {
        Self {
            account: Some(ACCOUNT.parse().expect("account")),
            values: Mutex::new(HashMap::new()),
            read_counts: Mutex::new(HashMap::new()),
            read_delay: None,
            write_result: Mutex::new(Ok(HASH)),
            writes: Mutex::new(Vec::new()),
            write_gate: None,
            write_entered: Arc::new(Notify::new()),
            receipts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn stopwatch(elapsed: u128, running: bool, started: u128, now: u128) -> Self {
        let chain = Self::new();
        {
            let mut values = chain.values.try_lock().expect("fresh lock");
            values.insert(ReadFunction::ElapsedTime, Ok(ContractValue::Uint(elapsed)));
            values.insert(ReadFunction::IsRunning, Ok(ContractValue::Bool(running)));
            values.insert(ReadFunction::StartTime, Ok(ContractValue::Uint(started)));
            values.insert(ReadFunction::GetCurrentTime, Ok(ContractValue::Uint(now)));
        }
        chain
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Writes block until the returned handle is notified.
    pub fn with_write_gate(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.write_gate = Some(gate.clone());
        (self, gate)
    }

    pub async fn set_value(&self, function: ReadFunction, value: Result<ContractValue, ChainError>) {
        self.values.lock().await.insert(function, value);
    }

    pub async fn set_write_result(&self, result: Result<TxHash, ChainError>) {
        *self.write_result.lock().await = result;
    }

    /// Receipt lookups are answered in order; the last answer repeats.
    pub async fn push_receipt(&self, receipt: Option<Receipt>) {
        self.receipts.lock().await.push_back(Ok(receipt));
    }

    pub async fn push_receipt_error(&self, err: ChainError) {
        self.receipts.lock().await.push_back(Err(err));
    }

    pub async fn read_count(&self, function: ReadFunction) -> usize {
        self.read_counts
            .lock()
            .await
            .get(&function)
            .copied()
            .unwrap_or(0)
    }

    pub async fn total_reads(&self) -> usize {
        self.read_counts.lock().await.values().sum()
    }

    pub async fn writes(&self) -> Vec<WriteFunction> {
        self.writes.lock().await.clone()
    }
}

pub fn receipt(status: ReceiptStatus) -> Option<Receipt> {
    Some(Receipt {
        transaction_hash: HASH,
        status,
        block_number: Some(7),
    })
}

#[async_trait]
impl ChainClient for TestChain {
    async fn connected_account(&self) -> Result<Option<Address>, ChainError> {
        Ok(self.account)
    }

    async fn read_contract(
        &self,
        contract: Address,
        function: ReadFunction,
    ) -> Result<ContractValue, ChainError> {
        assert_eq!(contract, contract_address());
        *self.read_counts.lock().await.entry(function).or_insert(0) += 1;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.values
            .lock()
            .await
            .get(&function)
            .cloned()
            .unwrap_or_else(|| Err(ChainError::decode("no value scripted")))
    }

    async fn write_contract(
        &self,
        _contract: Address,
        function: WriteFunction,
    ) -> Result<TxHash, ChainError> {
        self.writes.lock().await.push(function);
        self.write_entered.notify_one();
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        self.write_result.lock().await.clone()
    }

    async fn transaction_receipt(&self, _hash: TxHash) -> Result<Option<Receipt>, ChainError> {
        let mut receipts = self.receipts.lock().await;
        if receipts.len() > 1 {
            return receipts.pop_front().unwrap_or(Ok(None));
        }
        receipts.front().cloned().unwrap_or(Ok(None))
    }
}
