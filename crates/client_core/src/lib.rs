use std::sync::Arc;

use chain_client::JsonRpcChainClient;
use config::{ConfigError, Settings};
use shared::view::{StopwatchView, TransactionState};

pub mod config;
mod contract;
pub mod controls;
pub mod error;
pub mod format;
pub mod poll;
mod transaction;

pub use contract::{
    ActionOutcome, ReadErrors, ReceiptOptions, RefreshOutcome, StopwatchContract,
};
pub use controls::{ActionRejected, Controls, StopwatchAction};
pub use error::{ActionError, WriteError};
pub use poll::{AutoRefresh, AutoRefreshOptions};

/// Changes published by [`StopwatchContract`], including those produced in
/// the background by receipt observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    ViewUpdated(StopwatchView),
    TransactionUpdated(TransactionState),
}

/// Builds a contract binding over JSON-RPC from resolved settings.
pub fn connect(settings: &Settings) -> Result<Arc<StopwatchContract>, ConfigError> {
    let chain = JsonRpcChainClient::new(settings.rpc_endpoint()?, settings.request_timeout())
        .map_err(ConfigError::HttpClient)?
        .with_account(settings.account_override()?);
    Ok(StopwatchContract::with_receipt_options(
        Arc::new(chain),
        settings.contract()?,
        settings.receipt_options(),
    ))
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
