//! Domain types and protocol constants

use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Immutable description of one of the pool's tokens.
///
/// Discovered from the pool contract at session start, never configured.
#[derive(Debug, Clone, Serialize)]
pub struct TokenDescriptor {
    /// Token contract address
    pub address: Address,
    /// Display symbol, e.g. "USDC"
    pub symbol: String,
    /// Decimal precision of the token's base unit
    pub decimals: u8,
}

/// A user's share position in the pool ledger.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShareBalance {
    /// Shares held by the session account
    pub owner_shares: U256,
    /// Total share supply of the pool
    pub total_shares: U256,
}

/// The pool's yield-bearing underlying balances.
///
/// Always a server-confirmed read, never mutated locally.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolReserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

/// Which way a swap moves through the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapDirection {
    /// Sell token0, receive token1
    ZeroForOne,
    /// Sell token1, receive token0
    OneForZero,
}

impl SwapDirection {
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, SwapDirection::ZeroForOne)
    }
}

/// Parameters of a single exact-input swap, built per execution and
/// discarded afterwards.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SwapRequest {
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub min_amount_out: U256,
    /// Unix timestamp after which the router must reject the swap
    pub deadline: u64,
}

/// Fee tier of the pool's router bracket (0.3%).
pub const POOL_FEE: u32 = 3000;

/// Tick spacing of the pool's router bracket.
pub const POOL_TICK_SPACING: i32 = 1;

/// Default slippage haircut in basis points (0.05%).
pub const DEFAULT_SLIPPAGE_BPS: u32 = 5;

/// The pool's swap fee in basis points, used for the local quote preview.
pub const POOL_SWAP_FEE_BPS: u32 = 5;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Validity window added to the submission timestamp of a swap.
pub const SWAP_DEADLINE_SECS: u64 = 1200;

/// Router command byte selecting v4 swap mode.
pub const COMMAND_V4_SWAP: u8 = 0x10;

/// Router action byte: exact-input single-pool swap.
pub const ACTION_SWAP_EXACT_IN_SINGLE: u8 = 0x06;

/// Router action byte: settle the full input owed.
pub const ACTION_SETTLE_ALL: u8 = 0x0c;

/// Router action byte: take the full output owed.
pub const ACTION_TAKE_ALL: u8 = 0x0f;

/// Maximum amount a Permit2 grant can carry (uint160).
pub fn permit2_max_amount() -> U256 {
    (U256::from(1u8) << 160) - U256::from(1u8)
}

/// Maximum expiration a Permit2 grant can carry (uint48).
pub const PERMIT2_MAX_EXPIRATION: u64 = (1 << 48) - 1;
