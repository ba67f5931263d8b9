//! Balance synchronization
//!
//! Re-reads on-chain balances, share totals and reserves after every
//! successful mutation and publishes a derived snapshot for the presentation
//! layer. Reads have no side effects and are safe to re-issue at any time.

use std::sync::Arc;

use alloy_primitives::U256;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::amount::to_display_string;
use crate::chain::ChainClient;
use crate::error::{Error, Result, Stage};
use crate::math::{mul_div, shares_to_tokens, Rounding};
use crate::session::SessionContext;
use crate::types::{PoolReserves, ShareBalance, BPS_DENOMINATOR};

/// One coherent view of the user's wallet and pool position.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    /// Wallet balance of token0, base units
    pub user_balance0: U256,
    /// Wallet balance of token1, base units
    pub user_balance1: U256,
    pub shares: ShareBalance,
    pub reserves: PoolReserves,

    // derived display figures
    /// User's slice of the pool in basis points
    pub user_share_bps: u32,
    /// Proportional token0 amount backing the user's shares
    pub user_pool_amount0: U256,
    /// Proportional token1 amount backing the user's shares
    pub user_pool_amount1: U256,
    /// Formatted wallet balances, e.g. "12.5"
    pub user_balance0_display: String,
    pub user_balance1_display: String,
    /// Formatted position amounts
    pub user_pool_amount0_display: String,
    pub user_pool_amount1_display: String,
}

/// Refreshes and publishes [`PoolSnapshot`]s.
pub struct BalanceSynchronizer<C: ChainClient> {
    client: Arc<C>,
    snapshots: watch::Sender<Option<PoolSnapshot>>,
}

impl<C: ChainClient> BalanceSynchronizer<C> {
    pub fn new(client: Arc<C>) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self { client, snapshots }
    }

    /// Receiver the presentation layer listens on.
    pub fn subscribe(&self) -> watch::Receiver<Option<PoolSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Re-read everything and publish the derived snapshot.
    pub async fn refresh(&self, session: &SessionContext) -> Result<PoolSnapshot> {
        let as_network = |e| Error::from_chain(e, Stage::Action);

        let user_balance0 = self
            .client
            .balance_of(session.token0.address, session.account)
            .await
            .map_err(as_network)?;
        let user_balance1 = self
            .client
            .balance_of(session.token1.address, session.account)
            .await
            .map_err(as_network)?;
        let owner_shares = self
            .client
            .token_shares(session.pool, session.account)
            .await
            .map_err(as_network)?;
        let total_shares = self
            .client
            .total_token_shares(session.pool)
            .await
            .map_err(as_network)?;
        let (reserve0, reserve1) = self
            .client
            .pool_reserves(session.pool)
            .await
            .map_err(as_network)?;

        let (user_pool_amount0, user_pool_amount1) =
            shares_to_tokens(owner_shares, total_shares, reserve0, reserve1)?;
        let user_share_bps = if total_shares.is_zero() {
            0
        } else {
            // owner <= total, so the quotient always fits a u32
            mul_div(
                owner_shares,
                U256::from(BPS_DENOMINATOR),
                total_shares,
                Rounding::Floor,
            )?
            .to::<u32>()
        };

        let snapshot = PoolSnapshot {
            user_balance0,
            user_balance1,
            shares: ShareBalance {
                owner_shares,
                total_shares,
            },
            reserves: PoolReserves { reserve0, reserve1 },
            user_share_bps,
            user_pool_amount0,
            user_pool_amount1,
            user_balance0_display: to_display_string(user_balance0, session.token0.decimals),
            user_balance1_display: to_display_string(user_balance1, session.token1.decimals),
            user_pool_amount0_display: to_display_string(
                user_pool_amount0,
                session.token0.decimals,
            ),
            user_pool_amount1_display: to_display_string(
                user_pool_amount1,
                session.token1.decimals,
            ),
        };

        info!(
            share_bps = snapshot.user_share_bps,
            balance0 = %snapshot.user_balance0_display,
            balance1 = %snapshot.user_balance1_display,
            "Balances refreshed"
        );
        self.snapshots.send_replace(Some(snapshot.clone()));
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::session::SessionConfig;

    async fn session(chain: &MockChain) -> Arc<SessionContext> {
        SessionContext::initialize(
            chain,
            SessionConfig {
                pool: chain.pool_addr,
                router: chain.router_addr,
                permit2: chain.permit2_addr,
            },
            chain.account,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn derives_position_figures() {
        let chain = MockChain::new();
        chain.set_shares(chain.account, U256::from(200u64));
        chain.set_total_shares(U256::from(1_000u64));
        chain.set_reserves(U256::from(5_000_000u64), U256::from(3_000_000u64));
        chain.set_balance(chain.token0_addr, chain.account, U256::from(1_500_000u64));

        let session = session(&chain).await;
        let sync = BalanceSynchronizer::new(Arc::new(chain));
        let snapshot = sync.refresh(&session).await.unwrap();

        assert_eq!(snapshot.user_share_bps, 2_000);
        assert_eq!(snapshot.user_pool_amount0, U256::from(1_000_000u64));
        assert_eq!(snapshot.user_pool_amount1, U256::from(600_000u64));
        assert_eq!(snapshot.user_balance0_display, "1.5");
        assert_eq!(snapshot.user_pool_amount0_display, "1");
    }

    #[tokio::test]
    async fn empty_pool_snapshot_is_all_zero() {
        let chain = MockChain::new();
        let session = session(&chain).await;
        let sync = BalanceSynchronizer::new(Arc::new(chain));
        let snapshot = sync.refresh(&session).await.unwrap();

        assert_eq!(snapshot.user_share_bps, 0);
        assert_eq!(snapshot.user_pool_amount0, U256::ZERO);
        assert_eq!(snapshot.user_pool_amount1, U256::ZERO);
    }

    #[tokio::test]
    async fn refresh_publishes_to_subscribers() {
        let chain = MockChain::new();
        let session = session(&chain).await;
        let sync = BalanceSynchronizer::new(Arc::new(chain));
        let mut rx = sync.subscribe();

        assert!(rx.borrow().is_none());
        sync.refresh(&session).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
    }
}
