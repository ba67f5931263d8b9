//! Chain access seam
//!
//! The pool, the two tokens, Permit2 and the universal router are black-box
//! RPC endpoints; everything the client needs from them is captured by the
//! [`ChainClient`] trait. A wallet-backed provider implements it in the host
//! application, the tests implement it in-memory.

#[cfg(test)]
pub(crate) mod mock;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

use crate::swap::RouterCall;

/// Raw failure modes of a provider-backed call.
///
/// These are deliberately coarse: the orchestrator refines them into the
/// user-facing taxonomy with [`crate::error::Error::from_chain`].
#[derive(Debug, Error)]
pub enum ChainError {
    /// The user declined to sign the transaction.
    #[error("user rejected: {0}")]
    Rejected(String),

    /// The transaction was mined but reverted; carries the revert reason.
    #[error("reverted: {0}")]
    Reverted(String),

    /// Provider or transport failure.
    #[error("rpc error: {0}")]
    Rpc(#[from] anyhow::Error),
}

/// Result type alias for chain calls
pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Read and write surface of the on-chain collaborators.
///
/// Write calls submit a transaction for signing and return its hash once the
/// network accepts it; they do not wait for inclusion. Confirmation is a
/// separate suspension point via [`ChainClient::confirm`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    // --- pool reads ---

    /// Address of the pool's first token.
    async fn token0(&self, pool: Address) -> ChainResult<Address>;

    /// Address of the pool's second token.
    async fn token1(&self, pool: Address) -> ChainResult<Address>;

    /// Share balance of `owner` in the pool's internal ledger.
    async fn token_shares(&self, pool: Address, owner: Address) -> ChainResult<U256>;

    /// Total share supply of the pool.
    async fn total_token_shares(&self, pool: Address) -> ChainResult<U256>;

    /// Current yield-bearing underlying balances `(reserve0, reserve1)`.
    async fn pool_reserves(&self, pool: Address) -> ChainResult<(U256, U256)>;

    // --- token reads ---

    async fn balance_of(&self, token: Address, owner: Address) -> ChainResult<U256>;

    async fn decimals(&self, token: Address) -> ChainResult<u8>;

    async fn symbol(&self, token: Address) -> ChainResult<String>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> ChainResult<U256>;

    // --- writes ---

    /// Standard token approval.
    async fn approve(&self, token: Address, spender: Address, amount: U256)
        -> ChainResult<TxHash>;

    /// Permit2 delegated approval: `approve(token, spender, amount160, expiration48)`.
    async fn permit2_approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        expiration: u64,
    ) -> ChainResult<TxHash>;

    /// Pool deposit of both token amounts.
    async fn deposit(&self, pool: Address, amount0: U256, amount1: U256) -> ChainResult<TxHash>;

    /// Pool withdrawal of both token amounts.
    async fn withdraw(&self, pool: Address, amount0: U256, amount1: U256) -> ChainResult<TxHash>;

    /// Universal router `execute(commands, inputs, deadline)`.
    async fn execute_router(&self, router: Address, call: RouterCall) -> ChainResult<TxHash>;

    /// Wait until the given transaction is confirmed.
    async fn confirm(&self, tx: TxHash) -> ChainResult<()>;
}
