//! Router call encoding for exact-input swaps
//!
//! The universal router takes an opaque command byte string plus one
//! ABI-encoded input per command; a v4 swap packs an action sequence and one
//! self-describing parameter block per action so the router can validate
//! each action in isolation. Everything here is a pure function of its
//! inputs, so the encoding is exhaustively unit-testable offline.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolValue};

use crate::error::{Error, Result};
use crate::math::{mul_div, Rounding};
use crate::types::{
    SwapDirection, SwapRequest, ACTION_SETTLE_ALL, ACTION_SWAP_EXACT_IN_SINGLE, ACTION_TAKE_ALL,
    BPS_DENOMINATOR, COMMAND_V4_SWAP, SWAP_DEADLINE_SECS,
};

sol! {
    /// Identifies a specific v4 pool and its fee bracket.
    #[derive(Debug, PartialEq, Eq)]
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    /// Parameter block of the exact-input-single action.
    #[derive(Debug, PartialEq, Eq)]
    struct ExactInputSingleParams {
        PoolKey poolKey;
        bool zeroForOne;
        uint128 amountIn;
        uint128 minAmountOut;
        bytes hookData;
    }
}

/// Fully encoded `execute(commands, inputs, deadline)` arguments.
#[derive(Debug, Clone)]
pub struct RouterCall {
    pub commands: Bytes,
    pub inputs: Vec<Bytes>,
    pub deadline: U256,
}

/// Slippage-bounded minimum output for an exact-input swap.
///
/// `floor(amount_in × (10000 − slippage_bps) / 10000)`; the tolerance is
/// strictly a haircut, so the result never exceeds `amount_in`.
pub fn min_amount_out(amount_in: U256, slippage_bps: u32) -> Result<U256> {
    if slippage_bps >= BPS_DENOMINATOR {
        return Err(Error::InvalidSlippage(slippage_bps));
    }
    mul_div(
        amount_in,
        U256::from(BPS_DENOMINATOR - slippage_bps),
        U256::from(BPS_DENOMINATOR),
        Rounding::Floor,
    )
}

/// Local output estimate shown before a swap is submitted.
///
/// The pool charges its fee on the input and trades stable pairs near
/// parity, so the preview is the plain fee haircut.
pub fn quote_exact_input(amount_in: U256, fee_bps: u32) -> Result<U256> {
    if fee_bps >= BPS_DENOMINATOR {
        return Err(Error::InvalidSlippage(fee_bps));
    }
    mul_div(
        amount_in,
        U256::from(BPS_DENOMINATOR - fee_bps),
        U256::from(BPS_DENOMINATOR),
        Rounding::Floor,
    )
}

/// Plan an exact-input swap: slippage-bounded minimum output plus the
/// validity deadline, `now_unix + 1200` seconds.
pub fn plan_exact_input(
    direction: SwapDirection,
    amount_in: U256,
    slippage_bps: u32,
    now_unix: u64,
) -> Result<SwapRequest> {
    Ok(SwapRequest {
        direction,
        amount_in,
        min_amount_out: min_amount_out(amount_in, slippage_bps)?,
        deadline: now_unix + SWAP_DEADLINE_SECS,
    })
}

/// Build the router arguments for an exact-input swap through `pool_key`.
///
/// Encodes the v4 swap command, the action triple (exact-input-single,
/// settle-all, take-all) and one parameter block per action.
pub fn build_exact_input_single(pool_key: &PoolKey, request: &SwapRequest) -> Result<RouterCall> {
    let amount_in_128 = to_u128(request.amount_in)?;
    let min_out_128 = to_u128(request.min_amount_out)?;

    let (input_token, output_token) = match request.direction {
        SwapDirection::ZeroForOne => (pool_key.currency0, pool_key.currency1),
        SwapDirection::OneForZero => (pool_key.currency1, pool_key.currency0),
    };

    let swap_params = ExactInputSingleParams {
        poolKey: pool_key.clone(),
        zeroForOne: request.direction.is_zero_for_one(),
        amountIn: amount_in_128,
        minAmountOut: min_out_128,
        hookData: Bytes::new(),
    };

    let actions = Bytes::from(vec![
        ACTION_SWAP_EXACT_IN_SINGLE,
        ACTION_SETTLE_ALL,
        ACTION_TAKE_ALL,
    ]);
    let params: Vec<Bytes> = vec![
        swap_params.abi_encode().into(),
        (input_token, amount_in_128).abi_encode_params().into(),
        (output_token, min_out_128).abi_encode_params().into(),
    ];

    Ok(RouterCall {
        commands: Bytes::from(vec![COMMAND_V4_SWAP]),
        inputs: vec![(actions, params).abi_encode_params().into()],
        deadline: U256::from(request.deadline),
    })
}

fn to_u128(value: U256) -> Result<u128> {
    u128::try_from(value)
        .map_err(|_| Error::Encoding("amount exceeds the router's uint128 width".to_string()))
}
