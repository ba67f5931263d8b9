//! Allowance management
//!
//! Token transfers need a standing approval before the pool or Permit2 can
//! pull funds. The allowance is re-read before every dependent transfer,
//! never cached across transactions, and an approval is only submitted when
//! the standing grant is short.

use alloy_primitives::{Address, TxHash, U256};
use tracing::info;

use crate::chain::ChainClient;
use crate::error::{Error, Result, Stage};
use crate::types::{permit2_max_amount, TokenDescriptor, PERMIT2_MAX_EXPIRATION};

/// What [`AllowanceManager::ensure_allowance`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The standing allowance already covered the amount; nothing submitted.
    AlreadySufficient,
    /// An approval for the exact amount was submitted and confirmed.
    Approved(TxHash),
}

/// Drives the approve-then-act half of the transfer permission model.
pub struct AllowanceManager<'a, C: ChainClient> {
    client: &'a C,
}

impl<'a, C: ChainClient> AllowanceManager<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Make sure `spender` may transfer `required` of `token` from `owner`.
    ///
    /// Idempotent: a sufficient standing allowance returns immediately with
    /// no on-chain write. Otherwise an approval for exactly `required` is
    /// submitted and awaited, never an unbounded one; that is reserved for
    /// the Permit2 bootstrap below.
    pub async fn ensure_allowance(
        &self,
        owner: Address,
        spender: Address,
        token: &TokenDescriptor,
        required: U256,
    ) -> Result<AllowanceOutcome> {
        let current = self
            .client
            .allowance(token.address, owner, spender)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;

        if current >= required {
            return Ok(AllowanceOutcome::AlreadySufficient);
        }

        info!(
            token = %token.symbol,
            %spender,
            %required,
            %current,
            "Submitting approval"
        );
        let tx = self
            .client
            .approve(token.address, spender, required)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;
        self.client
            .confirm(tx)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;

        Ok(AllowanceOutcome::Approved(tx))
    }

    /// Permit2 bootstrap: grant the delegated-approval intermediary an
    /// effectively permanent allowance, then have it sub-approve the router.
    ///
    /// The router re-derives per-call limits itself, which is why this path
    /// alone uses the maximum representable grant. Ordinary transfers go
    /// through [`Self::ensure_allowance`] with exact amounts.
    pub async fn ensure_unlimited_allowance(
        &self,
        owner: Address,
        token: &TokenDescriptor,
        permit2: Address,
        router: Address,
    ) -> Result<()> {
        let current = self
            .client
            .allowance(token.address, owner, permit2)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;

        // a half-spent unlimited grant is still unlimited for any practical
        // transfer; only re-approve when the remainder dips below uint160
        if current < permit2_max_amount() {
            info!(token = %token.symbol, "Approving Permit2 for unlimited spend");
            let tx = self
                .client
                .approve(token.address, permit2, U256::MAX)
                .await
                .map_err(|e| Error::from_chain(e, Stage::Approval))?;
            self.client
                .confirm(tx)
                .await
                .map_err(|e| Error::from_chain(e, Stage::Approval))?;
        }

        info!(token = %token.symbol, %router, "Delegating router approval via Permit2");
        let tx = self
            .client
            .permit2_approve(
                token.address,
                router,
                permit2_max_amount(),
                PERMIT2_MAX_EXPIRATION,
            )
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;
        self.client
            .confirm(tx)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Approval))?;

        Ok(())
    }
}
