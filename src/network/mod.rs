//! Network collaborator contract
//!
//! The engine never talks JSON-RPC directly; everything it needs from the
//! chain goes through `Network`. `RpcProvider` is the production
//! implementation, tests substitute mocks or in-memory fakes.

pub mod provider;

pub use provider::RpcProvider;

use crate::error::WalletResult;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Block the state query is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
        }
    }
}

/// The parts of a transaction needed for gas estimation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSkeleton {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Network: Send + Sync {
    /// Transaction count of `address`, used as the next nonce
    async fn get_transaction_count(&self, address: Address, block: BlockTag) -> WalletResult<u64>;

    async fn estimate_gas(&self, tx: &TxSkeleton) -> WalletResult<u64>;

    /// Suggested legacy gas price in wei
    async fn gas_price(&self) -> WalletResult<U256>;

    /// Submit a signed payload, returning the transaction hash
    async fn send_raw_transaction(&self, raw: &[u8]) -> WalletResult<B256>;

    async fn get_balance(&self, address: Address, block: BlockTag) -> WalletResult<U256>;
}
