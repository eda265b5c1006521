//! Plain message signatures (`r || s || v`, `v` in {27, 28})

use super::{derive_address, recover_public_key, sign_digest, RawSignature, Wallet};
use crate::encoding::{decode_bytes, encode_hex, keccak256};
use crate::error::{WalletError, WalletResult};

use alloy_primitives::Address;

/// A 65-byte message signature. Not interchangeable with transaction
/// signatures, whose `v` also carries the chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl MessageSignature {
    /// `v` for an even y-coordinate
    pub const V_EVEN: u8 = 27;
    /// `v` for an odd y-coordinate
    pub const V_ODD: u8 = 28;

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        encode_hex(self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != 65 {
            return Err(WalletError::Signing(format!(
                "message signature must be 65 bytes, found {}",
                bytes.len()
            )));
        }
        let v = bytes[64];
        if v != Self::V_EVEN && v != Self::V_ODD {
            return Err(WalletError::Signing(format!("unexpected v value {}", v)));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v })
    }

    pub fn from_hex(input: &str) -> WalletResult<Self> {
        Self::from_bytes(&decode_bytes(input)?)
    }

    /// Address of the key that signed `message`
    pub fn recover(&self, message: &[u8]) -> WalletResult<Address> {
        let raw = RawSignature {
            r: self.r,
            s: self.s,
            y_odd: self.v == Self::V_ODD,
        };
        let public_key = recover_public_key(&keccak256(message), &raw)?;
        Ok(derive_address(&public_key))
    }
}

/// Sign keccak-256 of the raw message bytes
pub fn sign_message(wallet: &Wallet, message: &[u8]) -> WalletResult<MessageSignature> {
    let raw = sign_digest(wallet.signing_key(), &keccak256(message))?;
    Ok(MessageSignature {
        r: raw.r,
        s: raw.s,
        v: if raw.y_odd {
            MessageSignature::V_ODD
        } else {
            MessageSignature::V_EVEN
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> Wallet {
        Wallet::from_private_key("0x0000000000000000000000000000000000000000000000000000000000000001")
            .unwrap()
    }

    #[test]
    fn test_known_message_signature() {
        let signature = sign_message(&key_one(), b"hello").unwrap();
        assert_eq!(
            signature.to_hex(),
            "0x433ec3d37e4f1253df15e2dea412fed8e915737730f74b3dfb1353268f932ef5\
             557c9158e0b34bce39de28d11797b42e9b1acb2749230885fe075aedc3e491a41b"
        );
        assert_eq!(signature.v(), MessageSignature::V_EVEN);
    }

    #[test]
    fn test_recover_message_signer() {
        let wallet = Wallet::generate().unwrap();
        let signature = sign_message(&wallet, b"sign in to example.org").unwrap();
        let parsed = MessageSignature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(parsed.recover(b"sign in to example.org").unwrap(), wallet.address());
        assert_ne!(parsed.recover(b"another message").ok(), Some(wallet.address()));
    }

    #[test]
    fn test_rejects_transaction_style_v() {
        let mut bytes = sign_message(&key_one(), b"hello").unwrap().to_bytes();
        bytes[64] = 37;
        assert!(MessageSignature::from_bytes(&bytes).is_err());
    }
}
