use async_trait::async_trait;
use shared::{
    domain::{Address, ContractValue, ReadFunction, Receipt, TxHash, WriteFunction},
    error::ChainError,
};

pub mod abi;
mod rpc;

pub use rpc::JsonRpcChainClient;

/// Wallet, RPC and receipt access for a single chain.
///
/// Implementations own signing, transport and any internal retries; callers
/// only see settled results.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn connected_account(&self) -> Result<Option<Address>, ChainError>;

    async fn read_contract(
        &self,
        contract: Address,
        function: ReadFunction,
    ) -> Result<ContractValue, ChainError>;

    /// Submits a transaction and resolves once the node has accepted it.
    async fn write_contract(
        &self,
        contract: Address,
        function: WriteFunction,
    ) -> Result<TxHash, ChainError>;

    /// Returns `None` while the transaction has not been included yet.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, ChainError>;
}
