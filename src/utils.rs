//! Amount formatting and percentage helpers.
//!
//! On-chain amounts stay `U256` everywhere; these helpers only produce display
//! strings or parse caller input back into integers.

use ethers::types::{U256, U512};
use ethers::utils::format_units as ethers_format_units;

/// Formats a raw integer amount scaled by `10^decimals`, without trailing
/// zeros (`5000000000000000000` with 18 decimals is `"5"`).
pub fn format_units(amount: U256, decimals: u32) -> String {
    match ethers_format_units(amount, decimals) {
        Ok(formatted) => trim_fraction(formatted),
        // Only reachable for decimals beyond 77, where no scaling fits in U256.
        Err(_) => amount.to_string(),
    }
}

/// `format_units` with 18 decimals.
pub fn format_ether(amount: U256) -> String {
    format_units(amount, 18)
}

fn trim_fraction(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Parses a human decimal amount (`"1.5"`) into its raw integer form.
///
/// Amounts whose scaled value does not fit in a `U256` are rejected.
pub fn parse_units(amount: &str, decimals: u32) -> Result<U256, String> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return Err(format!("'{}' is not a non-negative decimal amount", amount));
    }
    if fraction.len() > decimals as usize {
        return Err(format!(
            "'{}' has more than {} decimal places",
            amount, decimals
        ));
    }

    let overflow = || format!("'{}' is too large for {} decimals", amount, decimals);
    let scale = |pow: usize| -> Result<U256, String> {
        (0..pow).try_fold(U256::one(), |acc, _| {
            acc.checked_mul(U256::from(10u64)).ok_or_else(overflow)
        })
    };

    let whole = parse_wei(whole).map_err(|_| overflow())?;
    let whole = whole
        .checked_mul(scale(decimals as usize)?)
        .ok_or_else(overflow)?;
    if fraction.is_empty() {
        return Ok(whole);
    }
    let fraction = parse_wei(fraction)?
        .checked_mul(scale(decimals as usize - fraction.len())?)
        .ok_or_else(overflow)?;
    whole.checked_add(fraction).ok_or_else(overflow)
}

/// Parses a raw decimal integer string (wei).
pub fn parse_wei(amount: &str) -> Result<U256, String> {
    let amount = amount.trim();
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a decimal integer", amount));
    }
    U256::from_dec_str(amount).map_err(|e| format!("invalid amount '{}': {}", amount, e))
}

/// `numerator / denominator * 100` rendered with `precision` decimal places,
/// rounded half up. Returns `"0"` when the denominator is zero.
pub fn percent(numerator: U256, denominator: U256, precision: u32) -> String {
    percent_wide(U512::from(numerator), U512::from(denominator), precision)
}

/// [`percent`] over 512-bit operands, for numerators that are products of
/// two 256-bit values.
pub fn percent_wide(numerator: U512, denominator: U512, precision: u32) -> String {
    if denominator.is_zero() {
        return "0".to_string();
    }
    let two = U512::from(2u64);
    let scaled = numerator
        .saturating_mul(U512::from(100u64))
        .saturating_mul(U512::exp10(precision as usize));
    let rounded = (scaled.saturating_mul(two) + denominator) / (denominator * two);
    fixed_point(rounded.to_string(), precision as usize)
}

// Inserts a decimal point `precision` digits from the right.
fn fixed_point(digits: String, precision: usize) -> String {
    if precision == 0 {
        return digits;
    }
    let padded = format!("{:0>width$}", digits, width = precision + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - precision);
    format!("{}.{}", int_part, frac_part)
}
