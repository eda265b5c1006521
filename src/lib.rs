//! EVM wallet engine
//!
//! Key derivation, legacy transaction construction, EIP-155 signing and
//! broadcast with per-address nonce coordination.

pub mod codec;
pub mod config;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod network;
pub mod tx;

pub use config::Settings;
pub use error::{WalletError, WalletResult};
pub use keys::{sign_message, MessageSignature, Wallet};
pub use network::{BlockTag, Network, RpcProvider, TxSkeleton};
pub use tx::{
    GasEstimator, GasSetting, NonceCoordinator, SignedTransaction, TransactionSender,
    TransactionSigner, UnsignedTransaction,
};
