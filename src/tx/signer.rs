//! EIP-155 transaction signing
//!
//! `v = parity + 35 + 2 * chain_id`. Kept separate from message signatures,
//! whose `v` is 27 or 28.

use super::types::{SignedTransaction, UnsignedTransaction};
use crate::encoding::MinimalBytes;
use crate::error::{WalletError, WalletResult};
use crate::keys::{derive_address, recover_public_key, sign_digest, RawSignature, Wallet};

use alloy_primitives::Address;
use tracing::debug;

const V_OFFSET: u64 = 35;

/// Replay-protected signature fields of a legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    v: u64,
    r: MinimalBytes,
    s: MinimalBytes,
}

impl TransactionSignature {
    /// Build from decoded fields; `v` must carry a chain id
    pub fn from_parts(v: u64, r: MinimalBytes, s: MinimalBytes) -> WalletResult<Self> {
        if v < V_OFFSET {
            return Err(WalletError::Signing(format!(
                "v = {} carries no chain id",
                v
            )));
        }
        Ok(Self { v, r, s })
    }

    fn from_raw(raw: &RawSignature, chain_id: u64) -> WalletResult<Self> {
        let v = eip155_v(raw.y_odd, chain_id)?;
        Ok(Self {
            v,
            r: MinimalBytes::trim(&raw.r)?,
            s: MinimalBytes::trim(&raw.s)?,
        })
    }

    pub fn v(&self) -> u64 {
        self.v
    }

    pub fn r(&self) -> &MinimalBytes {
        &self.r
    }

    pub fn s(&self) -> &MinimalBytes {
        &self.s
    }

    pub fn chain_id(&self) -> u64 {
        (self.v - V_OFFSET) / 2
    }

    pub fn y_odd(&self) -> bool {
        (self.v - V_OFFSET) % 2 == 1
    }

    fn to_raw(&self) -> RawSignature {
        RawSignature {
            r: self.r.to_uint().to_be_bytes::<32>(),
            s: self.s.to_uint().to_be_bytes::<32>(),
            y_odd: self.y_odd(),
        }
    }
}

/// `parity + 35 + 2 * chain_id`, rejecting chain ids that overflow `v`
pub fn eip155_v(y_odd: bool, chain_id: u64) -> WalletResult<u64> {
    chain_id
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(V_OFFSET + u64::from(y_odd)))
        .ok_or_else(|| WalletError::Signing(format!("chain id {} is too large", chain_id)))
}

/// Signs legacy transactions for a specific chain
pub struct TransactionSigner;

impl TransactionSigner {
    pub fn sign(wallet: &Wallet, tx: UnsignedTransaction) -> WalletResult<SignedTransaction> {
        if tx.chain_id == 0 {
            return Err(WalletError::Signing(
                "chain id 0 gives no replay protection".to_string(),
            ));
        }
        let chain_id = tx.chain_id;
        let nonce = tx.nonce;

        let hashed = tx.hash();
        debug!(
            "Signing nonce {} for chain {}: digest {}",
            nonce,
            chain_id,
            hashed.digest()
        );

        let raw = sign_digest(wallet.signing_key(), &hashed.digest())?;
        let signature = TransactionSignature::from_raw(&raw, chain_id)?;
        let signed = hashed.into_signed(signature);

        crate::metrics::record_tx_signed(chain_id);
        Ok(signed)
    }

    /// Recover the signer of `tx`. The signature must be bound to the
    /// transaction's chain.
    pub fn recover(tx: &UnsignedTransaction, signature: &TransactionSignature) -> WalletResult<Address> {
        if signature.chain_id() != tx.chain_id {
            return Err(WalletError::Signing(format!(
                "signature is bound to chain {}, transaction targets chain {}",
                signature.chain_id(),
                tx.chain_id
            )));
        }
        let digest = tx.clone().hash().digest();
        let public_key = recover_public_key(&digest, &signature.to_raw())?;
        Ok(derive_address(&public_key))
    }
}
