use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{
    domain::{Address, ContractValue, ReadFunction, Receipt, ReceiptStatus, TxHash, WriteFunction},
    error::ChainError,
};
use tracing::{debug, info};
use url::Url;

use crate::{abi, ChainClient};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

/// Ethereum JSON-RPC client that signs through the node's unlocked accounts.
pub struct JsonRpcChainClient {
    http: Client,
    endpoint: Url,
    account: Option<Address>,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// `request_timeout` bounds every JSON-RPC round trip, connect included.
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| ChainError::transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            endpoint,
            account: None,
            next_id: AtomicU64::new(1),
        })
    }

    /// Uses `account` as the sender instead of the node's first account.
    pub fn with_account(mut self, account: Option<Address>) -> Self {
        self.account = account;
        self
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "json-rpc request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| ChainError::transport(err.to_string()))?;
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|err| ChainError::decode(format!("invalid json-rpc response: {err}")))?;

        if let Some(error) = body.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    async fn sender(&self) -> Result<Address, ChainError> {
        self.connected_account()
            .await?
            .ok_or(ChainError::NoAccount)
    }
}

fn expect_str<'a>(value: &'a Value, method: &str) -> Result<&'a str, ChainError> {
    value
        .as_str()
        .ok_or_else(|| ChainError::decode(format!("{method} returned a non-string result")))
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn connected_account(&self) -> Result<Option<Address>, ChainError> {
        if let Some(account) = self.account {
            return Ok(Some(account));
        }
        let accounts: Vec<Address> = serde_json::from_value(self.call("eth_accounts", json!([])).await?)
            .map_err(|err| ChainError::decode(format!("eth_accounts: {err}")))?;
        Ok(accounts.into_iter().next())
    }

    async fn read_contract(
        &self,
        contract: Address,
        function: ReadFunction,
    ) -> Result<ContractValue, ChainError> {
        let params = json!([
            { "to": contract, "data": abi::encode_call(function.signature()) },
            "latest"
        ]);
        let result = self.call("eth_call", params).await?;
        abi::decode_output(function.output(), expect_str(&result, "eth_call")?)
    }

    async fn write_contract(
        &self,
        contract: Address,
        function: WriteFunction,
    ) -> Result<TxHash, ChainError> {
        let from = self.sender().await?;
        let params = json!([{
            "from": from,
            "to": contract,
            "data": abi::encode_call(function.signature()),
        }]);
        let result = self.call("eth_sendTransaction", params).await?;
        let hash: TxHash = expect_str(&result, "eth_sendTransaction")?
            .parse()
            .map_err(|err| ChainError::decode(format!("eth_sendTransaction: {err}")))?;
        info!(%hash, %from, function = function.name(), "transaction submitted");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, ChainError> {
        let result = self
            .call("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RpcReceipt = serde_json::from_value(result)
            .map_err(|err| ChainError::decode(format!("eth_getTransactionReceipt: {err}")))?;

        // Receipts without a status field predate EIP-658 and only exist for included transactions.
        let status = match raw.status.as_deref() {
            None => ReceiptStatus::Success,
            Some(status) if abi::parse_quantity(status)? == 1 => ReceiptStatus::Success,
            Some(_) => ReceiptStatus::Reverted,
        };
        let block_number = raw
            .block_number
            .as_deref()
            .map(abi::parse_quantity)
            .transpose()?;

        Ok(Some(Receipt {
            transaction_hash: raw.transaction_hash,
            status,
            block_number,
        }))
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
