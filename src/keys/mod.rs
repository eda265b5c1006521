//! Key derivation, addresses and raw secp256k1 signing
//!
//! Two signature encodings are built on top of the primitives here and must
//! not be mixed up:
//! - `MessageSignature`: `r || s || v` with `v` in {27, 28}
//! - `TransactionSignature` (see `tx::signer`): EIP-155 `v = parity + 35 + 2 * chain_id`

mod message;
mod wallet;

pub use message::{sign_message, MessageSignature};
pub use wallet::{Wallet, DERIVATION_PATH};

use crate::encoding::keccak256;
use crate::error::{WalletError, WalletResult};

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Length of an uncompressed SEC1 public key (marker byte + X + Y)
pub const PUBLIC_KEY_LEN: usize = 65;

/// Uncompressed public key for a secret scalar
pub fn derive_public_key(signing_key: &SigningKey) -> [u8; PUBLIC_KEY_LEN] {
    encode_public_key(signing_key.verifying_key())
}

fn encode_public_key(verifying_key: &VerifyingKey) -> [u8; PUBLIC_KEY_LEN] {
    let point = verifying_key.to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Last 20 bytes of keccak-256 over the public key without its marker byte.
/// Generated, imported and recovered keys all go through this function.
pub fn derive_address(public_key: &[u8; PUBLIC_KEY_LEN]) -> Address {
    let hash = keccak256(&public_key[1..]);
    Address::from_slice(&hash[12..])
}

/// A low-s secp256k1 signature with its y-parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub y_odd: bool,
}

/// Deterministic (RFC 6979) signature over a 32-byte digest, normalized to
/// low-s
pub(crate) fn sign_digest(signing_key: &SigningKey, digest: &B256) -> WalletResult<RawSignature> {
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|e| WalletError::Signing(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    if recovery_id.is_x_reduced() {
        return Err(WalletError::Signing(
            "signature point x-coordinate exceeds the curve order".to_string(),
        ));
    }

    let bytes = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);

    Ok(RawSignature {
        r,
        s,
        y_odd: recovery_id.is_y_odd(),
    })
}

/// Recover the uncompressed public key that produced `signature` over
/// `digest`. High-s signatures are rejected.
pub(crate) fn recover_public_key(
    digest: &B256,
    signature: &RawSignature,
) -> WalletResult<[u8; PUBLIC_KEY_LEN]> {
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let parsed = Signature::from_slice(&compact)
        .map_err(|e| WalletError::Signing(format!("invalid signature scalars: {}", e)))?;
    if parsed.normalize_s().is_some() {
        return Err(WalletError::Signing("signature is not in low-s form".to_string()));
    }

    let recovery_id = RecoveryId::new(signature.y_odd, false);
    let verifying_key = VerifyingKey::recover_from_prehash(digest.as_slice(), &parsed, recovery_id)
        .map_err(|e| WalletError::Signing(format!("public key recovery failed: {}", e)))?;

    Ok(encode_public_key(&verifying_key))
}
