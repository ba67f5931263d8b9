//! Session context
//!
//! All per-account state lives in one immutable [`SessionContext`], built
//! atomically at connect time and rebuilt wholesale when the host wallet
//! reports an account change. Token identities are discovered from the pool
//! contract, never configured.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{
    aliases::{I24, U24},
    Address,
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::chain::ChainClient;
use crate::error::{Error, Result, Stage};
use crate::swap::PoolKey;
use crate::types::{SwapDirection, TokenDescriptor, POOL_FEE, POOL_TICK_SPACING};

/// Addresses the host supplies once at session start.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub pool: Address,
    pub router: Address,
    pub permit2: Address,
}

impl SessionConfig {
    /// Parse the configured addresses, rejecting malformed input before any
    /// network call is made.
    pub fn parse(pool: &str, router: &str, permit2: &str) -> Result<Self> {
        Ok(Self {
            pool: parse_address(pool)?,
            router: parse_address(router)?,
            permit2: parse_address(permit2)?,
        })
    }
}

fn parse_address(input: &str) -> Result<Address> {
    Address::from_str(input.trim()).map_err(|_| Error::InvalidAddress(input.to_string()))
}

/// Immutable snapshot of everything an action chain needs to know about the
/// connected account and its contracts.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub account: Address,
    pub pool: Address,
    pub router: Address,
    pub permit2: Address,
    pub token0: TokenDescriptor,
    pub token1: TokenDescriptor,
    pool_key: PoolKey,
}

impl SessionContext {
    /// Discover both tokens from the pool contract and assemble the context.
    pub async fn initialize<C: ChainClient>(
        client: &C,
        config: SessionConfig,
        account: Address,
    ) -> Result<Arc<Self>> {
        let as_network = |e| Error::from_chain(e, Stage::Action);

        let token0_addr = client.token0(config.pool).await.map_err(as_network)?;
        let token1_addr = client.token1(config.pool).await.map_err(as_network)?;

        let token0 = describe_token(client, token0_addr).await?;
        let token1 = describe_token(client, token1_addr).await?;

        let pool_key = PoolKey {
            currency0: token0.address,
            currency1: token1.address,
            fee: U24::from(POOL_FEE),
            tickSpacing: I24::try_from(POOL_TICK_SPACING)
                .map_err(|_| Error::Encoding("tick spacing exceeds int24".to_string()))?,
            // the pool doubles as the router hook; a mismatched hook address
            // makes the router reject the call
            hooks: config.pool,
        };

        info!(
            %account,
            pool = %config.pool,
            token0 = %token0.symbol,
            token1 = %token1.symbol,
            "Session initialized"
        );

        Ok(Arc::new(Self {
            account,
            pool: config.pool,
            router: config.router,
            permit2: config.permit2,
            token0,
            token1,
            pool_key,
        }))
    }

    /// The v4 pool key selecting this pool and its fee bracket.
    pub fn pool_key(&self) -> &PoolKey {
        &self.pool_key
    }

    /// Input and output token descriptors for a swap direction.
    pub fn swap_tokens(&self, direction: SwapDirection) -> (&TokenDescriptor, &TokenDescriptor) {
        match direction {
            SwapDirection::ZeroForOne => (&self.token0, &self.token1),
            SwapDirection::OneForZero => (&self.token1, &self.token0),
        }
    }
}

async fn describe_token<C: ChainClient>(client: &C, address: Address) -> Result<TokenDescriptor> {
    let as_network = |e| Error::from_chain(e, Stage::Action);
    Ok(TokenDescriptor {
        address,
        symbol: client.symbol(address).await.map_err(as_network)?,
        decimals: client.decimals(address).await.map_err(as_network)?,
    })
}

/// React to the host wallet's account-change notifications.
///
/// Each notification discards the previous context and publishes a
/// wholesale-rebuilt one; an incremental patch would leak identities from
/// the previous account's network. Returns when the host closes the channel.
pub async fn watch_account_changes<C: ChainClient>(
    client: Arc<C>,
    config: SessionConfig,
    mut accounts: mpsc::Receiver<Address>,
    sessions: watch::Sender<Arc<SessionContext>>,
) {
    while let Some(account) = accounts.recv().await {
        match SessionContext::initialize(client.as_ref(), config, account).await {
            Ok(ctx) => {
                if sessions.send(ctx).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(%account, error = %err, "Session rebuild failed; keeping previous context")
            }
        }
    }
}
