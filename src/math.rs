//! Proportional share accounting
//!
//! Converts a user's pool-share balance into underlying token amounts, for
//! full or percentage withdrawals. All products are widened to 512 bits
//! before any division so multiply-before-divide never overflows and
//! rounding error stays at a single floor step.

use alloy_primitives::{U256, U512};

use crate::error::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Safe multiplication then division with configurable rounding.
///
/// Computes: (value × numerator) / denominator
/// Uses a U512 intermediate to prevent overflow.
pub fn mul_div(value: U256, numerator: U256, denominator: U256, rounding: Rounding) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::DivisionByZero);
    }

    let product = U512::from(value)
        .checked_mul(U512::from(numerator))
        .ok_or(Error::MathOverflow)?;
    let denom = U512::from(denominator);

    let result = match rounding {
        Rounding::Floor => product / denom,
        Rounding::Ceiling => product
            .checked_add(denom - U512::from(1u8))
            .ok_or(Error::MathOverflow)?
            / denom,
    };

    if result > U512::from(U256::MAX) {
        return Err(Error::MathOverflow);
    }
    Ok(result.to::<U256>())
}

/// Convert a share balance into proportional token amounts.
///
/// Formula: `(reserve_i × owner_shares / total_shares)`, floor division.
/// An empty pool (`total_shares == 0`) or an empty position short-circuits
/// to `(0, 0)` rather than dividing by zero.
pub fn shares_to_tokens(
    owner_shares: U256,
    total_shares: U256,
    reserve0: U256,
    reserve1: U256,
) -> Result<(U256, U256)> {
    if total_shares.is_zero() || owner_shares.is_zero() {
        return Ok((U256::ZERO, U256::ZERO));
    }
    let amount0 = mul_div(reserve0, owner_shares, total_shares, Rounding::Floor)?;
    let amount1 = mul_div(reserve1, owner_shares, total_shares, Rounding::Floor)?;
    Ok((amount0, amount1))
}

/// Convert a percentage of a share balance into proportional token amounts.
///
/// Formula: `reserve_i × owner_shares × percentage / (100 × total_shares)`,
/// with both multiplications performed before the single division. Dividing
/// first would compound two floor steps; at 100 percent this must agree with
/// [`shares_to_tokens`] exactly.
pub fn shares_to_tokens_at_percentage(
    owner_shares: U256,
    total_shares: U256,
    reserve0: U256,
    reserve1: U256,
    percentage: u8,
) -> Result<(U256, U256)> {
    if percentage > 100 {
        return Err(Error::InvalidPercentage(percentage));
    }
    if total_shares.is_zero() || owner_shares.is_zero() || percentage == 0 {
        return Ok((U256::ZERO, U256::ZERO));
    }

    let pct = U512::from(percentage);
    let denom = U512::from(total_shares)
        .checked_mul(U512::from(100u8))
        .ok_or(Error::MathOverflow)?;

    let mut out = [U256::ZERO; 2];
    for (slot, reserve) in out.iter_mut().zip([reserve0, reserve1]) {
        let product = U512::from(reserve)
            .checked_mul(U512::from(owner_shares))
            .ok_or(Error::MathOverflow)?
            .checked_mul(pct)
            .ok_or(Error::MathOverflow)?;
        let result = product / denom;
        if result > U512::from(U256::MAX) {
            return Err(Error::MathOverflow);
        }
        *slot = result.to::<U256>();
    }
    Ok((out[0], out[1]))
}
