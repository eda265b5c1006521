//! Shared encoding utilities
//!
//! Every conversion between caller-supplied text and the byte strings the
//! codec consumes happens here:
//! - `0x` hex parsing for quantities, byte strings and addresses
//! - Tagged field values with canonical minimal integer encoding
//! - Keccak-256 hashing
//! - Fixed-point ether/gwei formatting for presentation

pub mod hash;
pub mod hex;
pub mod units;
pub mod value;

pub use self::hash::keccak256;
pub use self::hex::{decode_bytes, encode_hex, parse_address, parse_quantity, quantity_to_hex};
pub use self::units::{format_ether, format_gwei, parse_ether, parse_gwei};
pub use self::value::{minimal_be_bytes, strip_leading_zeros, uint_from_be, FieldValue, MinimalBytes};
