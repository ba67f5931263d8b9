//! Transaction orchestration
//!
//! Sequences approvals and contract calls for the deposit, withdraw, swap
//! and Permit2 flows, driving one status machine per user action:
//! `Idle → Validating → Approving → Submitting → Pending → Confirmed`, with
//! any step able to divert to `Failed`. A failed action leaves a classified
//! message behind and the next action re-enters from the top; nothing is
//! retried automatically.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{TxHash, U256};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::allowance::AllowanceManager;
use crate::amount::{to_base_units, to_display_string};
use crate::chain::ChainClient;
use crate::error::{Error, Result, Stage};
use crate::math::{shares_to_tokens, shares_to_tokens_at_percentage};
use crate::session::SessionContext;
use crate::swap::{build_exact_input_single, plan_exact_input, quote_exact_input};
use crate::sync::{BalanceSynchronizer, PoolSnapshot};
use crate::types::{SwapDirection, TokenDescriptor, POOL_SWAP_FEE_BPS};

/// Lifecycle of one user-initiated action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TxStatus {
    Idle,
    Validating,
    Approving { symbol: String },
    Submitting,
    Pending { tx: TxHash },
    Confirmed,
    Failed { message: String },
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Idle => write!(f, "Idle"),
            TxStatus::Validating => write!(f, "Validating inputs..."),
            TxStatus::Approving { symbol } => write!(f, "Approving {symbol}..."),
            TxStatus::Submitting => write!(f, "Submitting transaction..."),
            TxStatus::Pending { tx } => write!(f, "Transaction pending... Transaction: {tx}"),
            TxStatus::Confirmed => write!(f, "Transaction confirmed"),
            TxStatus::Failed { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Drives every mutating flow against the pool and router.
///
/// Methods take `&mut self`: transactions from one account must stay
/// strictly ordered on its nonce, so two mutating actions can never run
/// concurrently. Reads ([`Orchestrator::refresh`], quotes) are free of that
/// constraint.
pub struct Orchestrator<C: ChainClient> {
    client: Arc<C>,
    session: Arc<SessionContext>,
    sync: BalanceSynchronizer<C>,
    status: watch::Sender<TxStatus>,
}

impl<C: ChainClient> Orchestrator<C> {
    pub fn new(client: Arc<C>, session: Arc<SessionContext>) -> Self {
        let (status, _) = watch::channel(TxStatus::Idle);
        Self {
            sync: BalanceSynchronizer::new(client.clone()),
            client,
            session,
            status,
        }
    }

    /// Status stream for the presentation layer.
    pub fn subscribe_status(&self) -> watch::Receiver<TxStatus> {
        self.status.subscribe()
    }

    /// Snapshot stream for the presentation layer.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<PoolSnapshot>> {
        self.sync.subscribe()
    }

    /// Swap in a freshly rebuilt session after an account change.
    pub fn set_session(&mut self, session: Arc<SessionContext>) {
        self.session = session;
        self.status.send_replace(TxStatus::Idle);
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Re-read balances and reserves on demand.
    pub async fn refresh(&self) -> Result<PoolSnapshot> {
        self.sync.refresh(&self.session).await
    }

    /// Local preview of a swap's output, fee haircut only. No network access.
    pub fn quote_swap(&self, direction: SwapDirection, amount: &str) -> Result<String> {
        let (input, output) = self.session.swap_tokens(direction);
        let amount_in = to_base_units(amount, input.decimals)?;
        let amount_out = quote_exact_input(amount_in, POOL_SWAP_FEE_BPS)?;
        Ok(to_display_string(amount_out, output.decimals))
    }

    /// Deposit both token amounts into the pool.
    ///
    /// A zero amount on either side skips that token's approval entirely
    /// (single-sided deposits); both zero is rejected before any network
    /// call.
    pub async fn deposit(&mut self, amount0: &str, amount1: &str) -> Result<TxHash> {
        let result = self.deposit_inner(amount0, amount1).await;
        self.finish("deposit", result)
    }

    async fn deposit_inner(&self, amount0: &str, amount1: &str) -> Result<TxHash> {
        self.set_status(TxStatus::Validating);
        let session = self.session.clone();
        let a0 = to_base_units(amount0, session.token0.decimals)?;
        let a1 = to_base_units(amount1, session.token1.decimals)?;
        if a0.is_zero() && a1.is_zero() {
            return Err(Error::EmptyAmount);
        }

        // approvals are sequential in fixed order: same-owner approvals
        // racing on the account nonce would collide
        let allowances = AllowanceManager::new(self.client.as_ref());
        for (token, amount) in [(&session.token0, a0), (&session.token1, a1)] {
            if amount.is_zero() {
                continue;
            }
            self.set_status(TxStatus::Approving {
                symbol: token.symbol.clone(),
            });
            allowances
                .ensure_allowance(session.account, session.pool, token, amount)
                .await?;
        }

        self.set_status(TxStatus::Submitting);
        let tx = self
            .client
            .deposit(session.pool, a0, a1)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        self.confirm_and_refresh(tx).await
    }

    /// Withdraw explicit token amounts from the pool.
    pub async fn withdraw(&mut self, amount0: &str, amount1: &str) -> Result<TxHash> {
        let result = self.withdraw_inner(amount0, amount1).await;
        self.finish("withdraw", result)
    }

    async fn withdraw_inner(&self, amount0: &str, amount1: &str) -> Result<TxHash> {
        self.set_status(TxStatus::Validating);
        let session = self.session.clone();
        let a0 = to_base_units(amount0, session.token0.decimals)?;
        let a1 = to_base_units(amount1, session.token1.decimals)?;
        if a0.is_zero() && a1.is_zero() {
            return Err(Error::EmptyAmount);
        }

        // the pool burns from its own share ledger; no approval step
        self.submit_withdraw(a0, a1).await
    }

    /// Withdraw the user's entire pool position.
    pub async fn withdraw_all(&mut self) -> Result<TxHash> {
        let result = self.withdraw_percentage_inner(100).await;
        self.finish("withdraw_all", result)
    }

    /// Withdraw a percentage of the user's pool position.
    pub async fn withdraw_percentage(&mut self, percentage: u8) -> Result<TxHash> {
        let result = self.withdraw_percentage_inner(percentage).await;
        self.finish("withdraw_percentage", result)
    }

    async fn withdraw_percentage_inner(&self, percentage: u8) -> Result<TxHash> {
        self.set_status(TxStatus::Validating);
        if percentage > 100 {
            return Err(Error::InvalidPercentage(percentage));
        }
        let session = self.session.clone();

        let owner_shares = self
            .client
            .token_shares(session.pool, session.account)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        if owner_shares.is_zero() {
            // fail fast rather than issue a withdrawal of zero
            return Err(Error::NoSharesToWithdraw);
        }

        // derive amounts from reads taken immediately before submission so
        // the window between read and write stays minimal
        let total_shares = self
            .client
            .total_token_shares(session.pool)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        let (reserve0, reserve1) = self
            .client
            .pool_reserves(session.pool)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;

        let (a0, a1) = if percentage == 100 {
            shares_to_tokens(owner_shares, total_shares, reserve0, reserve1)?
        } else {
            shares_to_tokens_at_percentage(
                owner_shares,
                total_shares,
                reserve0,
                reserve1,
                percentage,
            )?
        };
        if a0.is_zero() && a1.is_zero() {
            return Err(Error::EmptyAmount);
        }

        self.submit_withdraw(a0, a1).await
    }

    async fn submit_withdraw(&self, amount0: U256, amount1: U256) -> Result<TxHash> {
        self.set_status(TxStatus::Submitting);
        let tx = self
            .client
            .withdraw(self.session.pool, amount0, amount1)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        self.confirm_and_refresh(tx).await
    }

    /// Swap an exact input amount through the router.
    pub async fn swap(
        &mut self,
        direction: SwapDirection,
        amount: &str,
        slippage_bps: u32,
    ) -> Result<TxHash> {
        let result = self.swap_inner(direction, amount, slippage_bps).await;
        self.finish("swap", result)
    }

    async fn swap_inner(
        &self,
        direction: SwapDirection,
        amount: &str,
        slippage_bps: u32,
    ) -> Result<TxHash> {
        self.set_status(TxStatus::Validating);
        let session = self.session.clone();
        let (input, _) = session.swap_tokens(direction);
        let amount_in = to_base_units(amount, input.decimals)?;
        if amount_in.is_zero() {
            return Err(Error::EmptyAmount);
        }
        self.preflight_balance(input, amount_in).await?;

        let now = Utc::now().timestamp().max(0) as u64;
        let request = plan_exact_input(direction, amount_in, slippage_bps, now)?;
        info!(
            amount_in = %request.amount_in,
            min_amount_out = %request.min_amount_out,
            deadline = request.deadline,
            "Swap planned"
        );
        let call = build_exact_input_single(session.pool_key(), &request)?;

        self.set_status(TxStatus::Submitting);
        let tx = self
            .client
            .execute_router(session.router, call)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        self.confirm_and_refresh(tx).await
    }

    /// Permit2 bootstrap for the swap input token: grant the intermediary an
    /// unlimited allowance and delegate the router through it.
    pub async fn approve_router_permit2(&mut self, direction: SwapDirection) -> Result<()> {
        let result = self.approve_router_permit2_inner(direction).await;
        self.finish("approve_router_permit2", result)
    }

    async fn approve_router_permit2_inner(&self, direction: SwapDirection) -> Result<()> {
        let session = self.session.clone();
        let (input, _) = session.swap_tokens(direction);
        self.set_status(TxStatus::Approving {
            symbol: input.symbol.clone(),
        });

        AllowanceManager::new(self.client.as_ref())
            .ensure_unlimited_allowance(session.account, input, session.permit2, session.router)
            .await?;
        self.set_status(TxStatus::Confirmed);
        Ok(())
    }

    async fn preflight_balance(&self, token: &TokenDescriptor, required: U256) -> Result<()> {
        let balance = self
            .client
            .balance_of(token.address, self.session.account)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        if balance < required {
            return Err(Error::InsufficientBalance(format!(
                "have {} {}, need {}",
                to_display_string(balance, token.decimals),
                token.symbol,
                to_display_string(required, token.decimals),
            )));
        }
        Ok(())
    }

    async fn confirm_and_refresh(&self, tx: TxHash) -> Result<TxHash> {
        self.set_status(TxStatus::Pending { tx });
        self.client
            .confirm(tx)
            .await
            .map_err(|e| Error::from_chain(e, Stage::Action))?;
        self.set_status(TxStatus::Confirmed);
        self.sync.refresh(&self.session).await?;
        Ok(tx)
    }

    /// Close out an action chain: report success or classify-and-surface the
    /// failure. Either way the machine is re-entrant for the next action.
    fn finish<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => info!(action, "Action confirmed"),
            Err(err) => {
                warn!(action, error = %err, "Action failed");
                self.set_status(TxStatus::Failed {
                    message: err.to_string(),
                });
            }
        }
        result
    }

    fn set_status(&self, status: TxStatus) {
        info!(status = %status, "Status");
        self.status.send_replace(status);
    }
}
