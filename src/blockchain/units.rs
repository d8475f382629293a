// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between human-readable amounts and token base units.

use alloy::primitives::U256;

use super::client::ChainError;

/// Decimals of a gwei amount relative to wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Parse a human-readable amount into the token's smallest unit.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "0.042")
/// * `decimals` - Number of decimals (18 for most ERC-20 tokens, 0 for raw units)
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit
/// * `Err` - If the text is not a plain non-negative decimal, carries more
///   fractional digits than `decimals`, or overflows 256 bits
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainError> {
    let amount = amount.trim();
    let invalid = |reason: &str| ChainError::InvalidAmount(format!("{amount:?}: {reason}"));

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty amount"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("not a decimal number"));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid(&format!("too many decimal places (max {decimals})")));
    }

    // Pad the fraction so the concatenation is already in base units
    let digits = format!("{whole}{fraction:0<width$}", width = decimals as usize);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10).map_err(|_| invalid("amount overflow"))
}

/// Parse a gwei amount (e.g., "1.5") into wei.
pub fn parse_gwei(amount: &str) -> Result<u128, ChainError> {
    let wei = parse_amount(amount, GWEI_DECIMALS)?;
    u128::try_from(wei)
        .map_err(|_| ChainError::InvalidAmount(format!("{amount:?}: fee overflow")))
}

/// Format base units to a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
}
