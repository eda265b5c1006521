//! Recursive length-prefixed encoding of transaction fields
//!
//! Layout:
//! - A single byte below `0x80` is its own encoding
//! - Strings of 0-55 bytes: `0x80 + len`, then the bytes
//! - Longer strings: `0xb7 + len(len)`, big-endian length, then the bytes
//! - Lists use the same scheme over the concatenated member encodings with
//!   base tags `0xc0` / `0xf7`

mod decode;

pub use decode::decode;

use crate::encoding::{minimal_be_bytes, FieldValue};

use alloy_primitives::U256;

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb7;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf7;
const SHORT_LIMIT: usize = 56;

/// A node in the encoding tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Some(bytes),
            RlpItem::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items),
            RlpItem::Bytes(_) => None,
        }
    }
}

impl From<FieldValue> for RlpItem {
    fn from(value: FieldValue) -> Self {
        RlpItem::Bytes(value.to_bytes())
    }
}

impl From<&FieldValue> for RlpItem {
    fn from(value: &FieldValue) -> Self {
        RlpItem::Bytes(value.to_bytes())
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(bytes: Vec<u8>) -> Self {
        RlpItem::Bytes(bytes)
    }
}

impl From<u64> for RlpItem {
    fn from(value: u64) -> Self {
        RlpItem::Bytes(minimal_be_bytes(U256::from(value)))
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

/// Encode one item, recursing into lists
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

/// Encode a flat field list, as used for transaction payloads
pub fn encode_fields(fields: &[FieldValue]) -> Vec<u8> {
    let items: Vec<RlpItem> = fields.iter().map(RlpItem::from).collect();
    encode_list(&items)
}

pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        encode_into(item, &mut payload);
    }
    let mut out = length_prefix(payload.len(), SHORT_LIST, LONG_LIST);
    out.extend_from_slice(&payload);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < SHORT_STRING {
                out.push(bytes[0]);
            } else {
                out.extend_from_slice(&length_prefix(bytes.len(), SHORT_STRING, LONG_STRING));
                out.extend_from_slice(bytes);
            }
        }
        RlpItem::List(items) => out.extend_from_slice(&encode_list(items)),
    }
}

fn length_prefix(len: usize, short_base: u8, long_base: u8) -> Vec<u8> {
    if len < SHORT_LIMIT {
        vec![short_base + len as u8]
    } else {
        let len_bytes = minimal_be_bytes(U256::from(len as u64));
        let mut prefix = Vec::with_capacity(1 + len_bytes.len());
        prefix.push(long_base + len_bytes.len() as u8);
        prefix.extend_from_slice(&len_bytes);
        prefix
    }
}
