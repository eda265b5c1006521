//! Error types for the wallet engine

use thiserror::Error;

/// Rejection messages meaning the exact payload is already in the mempool
const ALREADY_KNOWN: &[&str] = &["already known", "known transaction"];

/// Main error type for the wallet engine
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid address {input}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Nonce conflict: {0}")]
    NonceConflict(String),

    #[error("Insufficient balance: have {have} wei, need {need} wei")]
    InsufficientBalance { have: String, need: String },

    #[error("Network error in {method}: {message}")]
    Network { method: String, message: String },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    pub(crate) fn network(method: &str, message: impl Into<String>) -> Self {
        WalletError::Network {
            method: method.to_string(),
            message: message.into(),
        }
    }

    /// The caller's input was rejected before any network involvement
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WalletError::KeyGeneration(_)
                | WalletError::InvalidPrivateKey(_)
                | WalletError::InvalidMnemonic(_)
                | WalletError::InvalidAddress { .. }
                | WalletError::Encoding(_)
                | WalletError::Signing(_)
        )
    }

    /// The network rejected the request or could not be reached
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            WalletError::Network { .. }
                | WalletError::Timeout { .. }
                | WalletError::NonceConflict(_)
                | WalletError::InsufficientBalance { .. }
        )
    }

    /// Check if error is retryable by the caller's own policy
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::Network { .. } | WalletError::Timeout { .. }
        )
    }

    /// The node already holds this exact payload, so the broadcast landed
    /// even though the call reported an error
    pub fn is_already_known(&self) -> bool {
        match self {
            WalletError::Network { message, .. } => {
                let lowered = message.to_lowercase();
                ALREADY_KNOWN.iter().any(|pattern| lowered.contains(pattern))
            }
            _ => false,
        }
    }

    /// The cached nonce must be evicted before any retry
    pub fn requires_nonce_reset(&self) -> bool {
        matches!(self, WalletError::NonceConflict(_))
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
