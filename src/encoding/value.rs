//! Tagged transaction field values.
//!
//! Numeric fields only ever reach the codec as their canonical minimal
//! big-endian form; opaque byte strings (addresses, call data, signatures
//! before trimming) are carried separately so the two are never confused.

use crate::error::{WalletError, WalletResult};

use alloy_primitives::{Address, U256};

/// A single transaction field before length-prefixed encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Unsigned integer, encoded as its minimal big-endian bytes
    Integer(U256),
    /// Big-endian integer bytes already in canonical form
    Minimal(MinimalBytes),
    /// Opaque bytes whose length is significant (addresses, call data)
    Fixed(Vec<u8>),
}

impl FieldValue {
    /// The byte string the codec will length-prefix
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            FieldValue::Integer(value) => minimal_be_bytes(*value),
            FieldValue::Minimal(bytes) => bytes.as_slice().to_vec(),
            FieldValue::Fixed(bytes) => bytes.clone(),
        }
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Integer(U256::from(value))
    }
}

impl From<U256> for FieldValue {
    fn from(value: U256) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Address> for FieldValue {
    fn from(address: Address) -> Self {
        FieldValue::Fixed(address.as_slice().to_vec())
    }
}

impl From<MinimalBytes> for FieldValue {
    fn from(bytes: MinimalBytes) -> Self {
        FieldValue::Minimal(bytes)
    }
}

/// Big-endian integer bytes with no leading zero byte. Zero is the empty
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MinimalBytes(Vec<u8>);

impl MinimalBytes {
    /// Wrap bytes that are already minimal; leading zeros are rejected
    pub fn new(bytes: Vec<u8>) -> WalletResult<Self> {
        if bytes.first() == Some(&0) {
            return Err(WalletError::Encoding(format!(
                "integer 0x{} has a leading zero byte",
                hex::encode(&bytes)
            )));
        }
        if bytes.len() > 32 {
            return Err(WalletError::Encoding(format!(
                "integer of {} bytes exceeds 256 bits",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Trim a fixed-width big-endian integer to minimal form
    pub fn trim(bytes: &[u8]) -> WalletResult<Self> {
        Self::new(strip_leading_zeros(bytes).to_vec())
    }

    pub fn from_uint(value: U256) -> Self {
        Self(minimal_be_bytes(value))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_uint(&self) -> U256 {
        U256::from_be_slice(&self.0)
    }
}

/// Minimal big-endian representation of an integer; zero is empty
pub fn minimal_be_bytes(value: U256) -> Vec<u8> {
    let bytes = value.to_be_bytes::<32>();
    strip_leading_zeros(&bytes).to_vec()
}

pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Interpret a decoded integer field, enforcing canonical form
pub fn uint_from_be(bytes: &[u8]) -> WalletResult<U256> {
    MinimalBytes::new(bytes.to_vec()).map(|minimal| minimal.to_uint())
}
