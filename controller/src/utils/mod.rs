//! # Utilities Module
//!
//! Helper functions used across the controller: conversion between
//! human-readable ether amounts and wei, and log formatting.

use alloy::primitives::{utils, U256};
use thiserror::Error;

/// Errors produced when converting an ether amount to wei.
#[derive(Debug, Error)]
pub enum UnitsError {
    /// The input was empty or whitespace.
    #[error("Amount is empty")]
    Empty,

    /// Amounts are never negative.
    #[error("Amount is negative: {0}")]
    Negative(String),

    /// Not a decimal number that fits in wei.
    #[error("Invalid amount: {0}")]
    Invalid(#[from] utils::UnitsError),
}

/// Convert an ether amount string into wei.
///
/// The conversion is exact: `"1.5"` yields `1_500_000_000_000_000_000`.
pub fn parse_ether(amount: &str) -> Result<U256, UnitsError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(UnitsError::Negative(trimmed.to_string()));
    }

    Ok(utils::parse_ether(trimmed)?)
}

/// Format a wei amount as ether.
///
/// Trailing fractional zeros are dropped and whole values carry no decimal
/// point, so `format_ether(parse_ether(s)?)` returns `s` for canonical
/// inputs such as `"1.5"` or `"2"`.
pub fn format_ether(value: U256) -> String {
    let formatted = utils::format_ether(value);
    if !formatted.contains('.') {
        return formatted;
    }

    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Truncate a string to a maximum length in characters.
///
/// Useful for logging long hashes and addresses.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        return s.to_string();
    }

    let half = max_len.saturating_sub(3) / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{}...{}", head, tail)
}
