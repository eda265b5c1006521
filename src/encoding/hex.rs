//! `0x`-prefixed hex at the caller boundary.
//!
//! Quantities and byte strings are parsed by different functions: a quantity
//! is a number and may have an odd digit count, a byte string may not.

use crate::error::{WalletError, WalletResult};

use alloy_primitives::{Address, U256};

fn strip_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Parse a hex quantity. `0x` and `0x0` are zero, odd digit counts are
/// accepted, anything wider than 256 bits is rejected.
pub fn parse_quantity(input: &str) -> WalletResult<U256> {
    let digits = strip_prefix(input.trim());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::Encoding(format!(
            "quantity {:?} is not hexadecimal",
            input
        )));
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::ZERO);
    }
    if significant.len() > 64 {
        return Err(WalletError::Encoding(format!(
            "quantity {:?} exceeds 256 bits",
            input
        )));
    }

    U256::from_str_radix(significant, 16)
        .map_err(|e| WalletError::Encoding(format!("quantity {:?}: {}", input, e)))
}

/// Render a quantity the way JSON-RPC does: minimal digits, `0x0` for zero
pub fn quantity_to_hex(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Decode a hex byte string. The digit count must be even.
pub fn decode_bytes(input: &str) -> WalletResult<Vec<u8>> {
    let digits = strip_prefix(input.trim());
    if digits.len() % 2 != 0 {
        return Err(WalletError::Encoding(format!(
            "byte string {:?} has an odd number of hex digits",
            input
        )));
    }
    hex::decode(digits).map_err(|e| WalletError::Encoding(format!("byte string {:?}: {}", input, e)))
}

/// Encode bytes as `0x`-prefixed lowercase hex
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes.as_ref()))
}

/// Parse a `0x`-prefixed 20-byte address. Mixed-case input must carry a
/// valid EIP-55 checksum.
pub fn parse_address(input: &str) -> WalletResult<Address> {
    let invalid = |reason: &str| WalletError::InvalidAddress {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("expected 40 hex digits"));
    }

    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        return Address::parse_checksummed(input, None).map_err(|_| invalid("checksum mismatch"));
    }

    let bytes = hex::decode(digits).map_err(|e| invalid(&e.to_string()))?;
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_accepts_odd_digits() {
        assert_eq!(parse_quantity("0x5208").unwrap(), U256::from(21_000u64));
        assert_eq!(parse_quantity("0x4a817c800").unwrap(), U256::from(20_000_000_000u64));
        assert_eq!(parse_quantity("0xf").unwrap(), U256::from(15u64));
    }

    #[test]
    fn test_parse_quantity_zero_forms() {
        assert_eq!(parse_quantity("0x").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity("0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity("0x0000").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_quantity_rejects_bad_input() {
        assert!(parse_quantity("-0x1").is_err());
        assert!(parse_quantity("0xzz").is_err());
        let oversized = format!("0x1{}", "0".repeat(64));
        assert!(matches!(parse_quantity(&oversized), Err(WalletError::Encoding(_))));
    }

    #[test]
    fn test_quantity_to_hex_is_minimal() {
        assert_eq!(quantity_to_hex(U256::ZERO), "0x0");
        assert_eq!(quantity_to_hex(U256::from(21_000u64)), "0x5208");
    }

    #[test]
    fn test_decode_bytes_rejects_odd_length() {
        assert_eq!(decode_bytes("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_bytes("0xa9059cbb").unwrap(), vec![0xa9, 0x05, 0x9c, 0xbb]);
        assert!(decode_bytes("0xabc").is_err());
    }

    #[test]
    fn test_parse_address_checksum() {
        let checksummed = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
        let lower = checksummed.to_lowercase();
        assert_eq!(parse_address(checksummed).unwrap(), parse_address(&lower).unwrap());

        let broken = "0x7e5F4552091A69125d5DfCb7b8C2659029395Bdf";
        assert!(matches!(
            parse_address(broken),
            Err(WalletError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_parse_address_shape() {
        assert!(parse_address("7e5f4552091a69125d5dfcb7b8c2659029395bdf").is_err());
        assert!(parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395b").is_err());
    }
}
