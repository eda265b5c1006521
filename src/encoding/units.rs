//! Fixed-point conversion between wei and human-readable units.
//!
//! Presentation only: amounts inside the engine are always integer wei.

use crate::error::{WalletError, WalletResult};

use alloy_primitives::utils::{ParseUnits, Unit};
use alloy_primitives::U256;

/// Render `value` in `unit` with trailing fractional zeros trimmed
fn format_in(value: U256, unit: Unit) -> String {
    let formatted = ParseUnits::from(value).format_units(unit);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted,
    }
}

/// Parse a non-negative decimal amount in `unit`. More fractional digits
/// than the unit holds is an error rather than a silent truncation, and so
/// is an amount past 256 bits.
fn parse_in(input: &str, unit: Unit) -> WalletResult<U256> {
    let invalid = |reason: &str| WalletError::Encoding(format!("amount {:?}: {}", input, reason));

    let trimmed = input.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected decimal digits"));
    }
    if fraction.len() > unit.get() as usize {
        return Err(invalid("too many decimal places"));
    }
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|e| invalid(&e.to_string()))?
    };

    let wei = ParseUnits::parse_units(trimmed, unit)
        .map(<U256 as From<ParseUnits>>::from)
        .map_err(|e| invalid(&e.to_string()))?;
    // Scaling wraps silently past 256 bits
    if wei / unit.wei() != whole {
        return Err(invalid("exceeds 256 bits"));
    }
    Ok(wei)
}

pub fn format_ether(wei: U256) -> String {
    format_in(wei, Unit::ETHER)
}

pub fn parse_ether(input: &str) -> WalletResult<U256> {
    parse_in(input, Unit::ETHER)
}

pub fn format_gwei(wei: U256) -> String {
    format_in(wei, Unit::GWEI)
}

pub fn parse_gwei(input: &str) -> WalletResult<U256> {
    parse_in(input, Unit::GWEI)
}
