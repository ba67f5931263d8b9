//! Fixed-point amount codec
//!
//! Converts between human-entered decimal strings and base-unit integers
//! under a token's decimal precision. Integer amounts are exact; only the
//! display direction may drop trailing zeros, never significant digits.

use alloy_primitives::U256;

use crate::error::{Error, Result};

/// Parse a decimal string into base units under `decimals` precision.
///
/// Empty or whitespace-only input parses as zero. Signs, non-digit
/// characters, repeated decimal points and fractional digits beyond the
/// token's precision are rejected: silently rounding a user's input before
/// moving funds is never acceptable.
pub fn to_base_units(input: &str, decimals: u8) -> Result<U256> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(U256::ZERO);
    }

    let malformed = || Error::MalformedAmount(input.to_string());

    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, f),
        None => (input, ""),
    };

    // "1." and ".5" are fine, "." alone is not
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(malformed());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }
    if frac_part.len() > decimals as usize {
        return Err(malformed());
    }

    let scale = U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or(Error::MathOverflow)?;

    let int_units = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).map_err(|_| malformed())?
    };
    let frac_units = if frac_part.is_empty() {
        U256::ZERO
    } else {
        // pad the fraction to full precision: "5" at 6 decimals is 500000
        let padding = decimals as usize - frac_part.len();
        let frac = U256::from_str_radix(frac_part, 10).map_err(|_| malformed())?;
        frac.checked_mul(U256::from(10u8).pow(U256::from(padding)))
            .ok_or(Error::MathOverflow)?
    };

    int_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or(Error::MathOverflow)
}

/// Format a base-unit amount as an exact decimal string.
///
/// Trailing fractional zeros are trimmed and whole values carry no decimal
/// point; the output always round-trips through [`to_base_units`].
pub fn to_display_string(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = match U256::from(10u8).checked_pow(U256::from(decimals)) {
        Some(scale) => scale,
        // precision wider than 256 bits: the whole amount is fractional
        None => {
            let digits = format!("{:0>width$}", amount.to_string(), width = decimals as usize);
            let digits = digits.trim_end_matches('0');
            if digits.is_empty() {
                return "0".to_string();
            }
            return format!("0.{digits}");
        }
    };
    let int_part = amount / scale;
    let frac_part = amount % scale;
    if frac_part.is_zero() {
        return int_part.to_string();
    }
    let frac = format!("{:0>width$}", frac_part.to_string(), width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    format!("{int_part}.{frac}")
}
