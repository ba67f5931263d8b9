//! In-memory chain client for tests
//!
//! Holds a ledger of balances, allowances, shares and reserves behind a
//! shared handle, records every call it serves, and can inject a user
//! rejection or an on-chain revert into the next write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;

use crate::swap::RouterCall;

use super::{ChainClient, ChainError, ChainResult};

/// One recorded chain interaction.
#[derive(Debug, Clone)]
pub enum Call {
    AllowanceRead {
        token: Address,
        owner: Address,
        spender: Address,
    },
    ReservesRead,
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Permit2Approve {
        token: Address,
        spender: Address,
        amount: U256,
        expiration: u64,
    },
    Deposit {
        amount0: U256,
        amount1: U256,
    },
    Withdraw {
        amount0: U256,
        amount1: U256,
    },
    ExecuteRouter {
        router: Address,
        call: RouterCall,
    },
    Confirm(TxHash),
}

#[derive(Debug, Default)]
struct State {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    shares: HashMap<Address, U256>,
    total_shares: U256,
    reserves: (U256, U256),
    decimals: HashMap<Address, u8>,
    symbols: HashMap<Address, String>,
    calls: Vec<Call>,
    reject_next_write: bool,
    revert_next_confirm: Option<String>,
    next_tx: u64,
}

/// Shared-handle mock; clones see the same ledger.
#[derive(Clone)]
pub struct MockChain {
    pub account: Address,
    pub pool_addr: Address,
    pub token0_addr: Address,
    pub token1_addr: Address,
    pub router_addr: Address,
    pub permit2_addr: Address,
    state: Arc<Mutex<State>>,
}

impl MockChain {
    pub fn new() -> Self {
        let chain = Self {
            account: address!("1111111111111111111111111111111111111111"),
            pool_addr: address!("c0db3c05eda0a0ad64ae139003f6324cd7e59888"),
            token0_addr: address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            token1_addr: address!("dac17f958d2ee523a2206206994597c13d831ec7"),
            router_addr: address!("1095692a6237d83c6a72f3f5efedb9a670c49223"),
            permit2_addr: address!("000000000022d473030f116ddee9f6b43ac78ba3"),
            state: Arc::new(Mutex::new(State::default())),
        };
        {
            let mut s = chain.state.lock().unwrap();
            for (token, symbol) in [(chain.token0_addr, "USDC"), (chain.token1_addr, "USDT")] {
                s.decimals.insert(token, 6);
                s.symbols.insert(token, symbol.to_string());
                // a comfortable default balance so happy paths just work
                s.balances
                    .insert((token, chain.account), U256::from(1_000_000_000_000u64));
            }
        }
        chain
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_shares(&self, owner: Address, shares: U256) {
        self.state.lock().unwrap().shares.insert(owner, shares);
    }

    pub fn set_total_shares(&self, total: U256) {
        self.state.lock().unwrap().total_shares = total;
    }

    pub fn set_reserves(&self, reserve0: U256, reserve1: U256) {
        self.state.lock().unwrap().reserves = (reserve0, reserve1);
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// The next submitted write fails as a user rejection.
    pub fn reject_next_write(&self) {
        self.state.lock().unwrap().reject_next_write = true;
    }

    /// The next confirmation fails as an on-chain revert with `reason`.
    pub fn revert_next_confirm(&self, reason: &str) {
        self.state.lock().unwrap().revert_next_confirm = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn submit_write(&self, call: Call) -> ChainResult<TxHash> {
        let mut s = self.state.lock().unwrap();
        if s.reject_next_write {
            s.reject_next_write = false;
            return Err(ChainError::Rejected("user rejected signing".to_string()));
        }
        s.calls.push(call);
        s.next_tx += 1;
        Ok(TxHash::from(U256::from(s.next_tx)))
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn token0(&self, _pool: Address) -> ChainResult<Address> {
        Ok(self.token0_addr)
    }

    async fn token1(&self, _pool: Address) -> ChainResult<Address> {
        Ok(self.token1_addr)
    }

    async fn token_shares(&self, _pool: Address, owner: Address) -> ChainResult<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .shares
            .get(&owner)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn total_token_shares(&self, _pool: Address) -> ChainResult<U256> {
        Ok(self.state.lock().unwrap().total_shares)
    }

    async fn pool_reserves(&self, _pool: Address) -> ChainResult<(U256, U256)> {
        self.record(Call::ReservesRead);
        Ok(self.state.lock().unwrap().reserves)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> ChainResult<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn decimals(&self, token: Address) -> ChainResult<u8> {
        self.state
            .lock()
            .unwrap()
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::Rpc(anyhow::anyhow!("unknown token {token}")))
    }

    async fn symbol(&self, token: Address) -> ChainResult<String> {
        self.state
            .lock()
            .unwrap()
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(anyhow::anyhow!("unknown token {token}")))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> ChainResult<U256> {
        self.record(Call::AllowanceRead { token, owner, spender });
        Ok(self.allowance_of(token, owner, spender))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> ChainResult<TxHash> {
        let tx = self.submit_write(Call::Approve { token, spender, amount })?;
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, self.account, spender), amount);
        Ok(tx)
    }

    async fn permit2_approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        expiration: u64,
    ) -> ChainResult<TxHash> {
        self.submit_write(Call::Permit2Approve {
            token,
            spender,
            amount,
            expiration,
        })
    }

    async fn deposit(&self, _pool: Address, amount0: U256, amount1: U256) -> ChainResult<TxHash> {
        self.submit_write(Call::Deposit { amount0, amount1 })
    }

    async fn withdraw(&self, _pool: Address, amount0: U256, amount1: U256) -> ChainResult<TxHash> {
        self.submit_write(Call::Withdraw { amount0, amount1 })
    }

    async fn execute_router(&self, router: Address, call: RouterCall) -> ChainResult<TxHash> {
        self.submit_write(Call::ExecuteRouter { router, call })
    }

    async fn confirm(&self, tx: TxHash) -> ChainResult<()> {
        let mut s = self.state.lock().unwrap();
        if let Some(reason) = s.revert_next_confirm.take() {
            return Err(ChainError::Reverted(reason));
        }
        s.calls.push(Call::Confirm(tx));
        Ok(())
    }
}
