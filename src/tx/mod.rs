//! Transaction construction, signing and submission with nonce management

mod gas;
mod nonce;
mod sender;
mod signer;
mod types;

pub use gas::GasEstimator;
pub use nonce::{NonceCoordinator, NonceReservation};
pub use sender::TransactionSender;
pub use signer::{TransactionSignature, TransactionSigner};
pub use types::{GasSetting, HashedTransaction, SignedTransaction, UnsignedTransaction};

/// Intrinsic gas cost of a plain value transfer
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
