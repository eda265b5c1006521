//! Wallet identity: one secp256k1 keypair and its address

use super::{derive_address, derive_public_key, PUBLIC_KEY_LEN};
use crate::encoding::encode_hex;
use crate::error::{WalletError, WalletResult};

use alloy_primitives::Address;
use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use tracing::info;
use zeroize::Zeroizing;

/// Standard Ethereum HD path (BIP-44, coin type 60, first account)
pub const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// 128 bits of entropy renders as a 12-word phrase
const ENTROPY_BYTES: usize = 16;

/// A keypair bound to its address. Immutable once created.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    public_key: [u8; PUBLIC_KEY_LEN],
    address: Address,
    mnemonic: Option<Zeroizing<String>>,
}

impl Wallet {
    /// Create a wallet from fresh OS entropy via a 12-word mnemonic
    pub fn generate() -> WalletResult<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
        OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| WalletError::KeyGeneration(format!("entropy source failed: {}", e)))?;

        let mnemonic = Mnemonic::from_entropy(&entropy[..])
            .map_err(|e| WalletError::KeyGeneration(format!("mnemonic generation failed: {}", e)))?;

        let signing_key = derive_hd_key(&mnemonic)?;
        let wallet = Self::from_signing_key(signing_key, Some(Zeroizing::new(mnemonic.to_string())));
        info!("Generated wallet {}", wallet.address);
        Ok(wallet)
    }

    /// Restore the wallet `generate` produced for this phrase
    pub fn from_mnemonic(phrase: &str) -> WalletResult<Self> {
        let mnemonic = Mnemonic::parse(phrase.trim())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

        let signing_key = derive_hd_key(&mnemonic)?;
        let wallet = Self::from_signing_key(signing_key, Some(Zeroizing::new(mnemonic.to_string())));
        info!("Restored wallet {} from mnemonic", wallet.address);
        Ok(wallet)
    }

    /// Import a raw 32-byte secret given as 64 hex digits, `0x` optional
    pub fn from_private_key(input: &str) -> WalletResult<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(WalletError::InvalidPrivateKey(format!(
                "expected 64 hex digits, found {}",
                digits.len()
            )));
        }

        let bytes = Zeroizing::new(
            hex::decode(digits).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?,
        );
        let signing_key = SigningKey::from_slice(&bytes).map_err(|_| {
            WalletError::InvalidPrivateKey("scalar is zero or not below the curve order".to_string())
        })?;

        let wallet = Self::from_signing_key(signing_key, None);
        info!("Imported wallet {}", wallet.address);
        Ok(wallet)
    }

    fn from_signing_key(signing_key: SigningKey, mnemonic: Option<Zeroizing<String>>) -> Self {
        let public_key = derive_public_key(&signing_key);
        let address = derive_address(&public_key);
        Self {
            signing_key,
            public_key,
            address,
            mnemonic,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Uncompressed public key, `0x04 || X || Y`
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        encode_hex(self.public_key)
    }

    /// `0x`-prefixed secret, zeroized when dropped
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&self.signing_key.to_bytes());
        Zeroizing::new(encode_hex(&bytes[..]))
    }

    /// Present only for wallets created or restored from a phrase
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(|m| m.as_str())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("has_mnemonic", &self.mnemonic.is_some())
            .finish_non_exhaustive()
    }
}

fn derive_hd_key(mnemonic: &Mnemonic) -> WalletResult<SigningKey> {
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let path: DerivationPath = DERIVATION_PATH
        .parse()
        .map_err(|e| WalletError::KeyGeneration(format!("invalid HD path: {}", e)))?;

    let child = XPrv::derive_from_path(&seed[..], &path)
        .map_err(|e| WalletError::KeyGeneration(format!("key derivation failed: {}", e)))?;

    let key_bytes = Zeroizing::new(child.to_bytes());
    SigningKey::from_slice(&key_bytes[..])
        .map_err(|_| WalletError::KeyGeneration("derived key is not a usable scalar".to_string()))
}
