//! StableSwap client
//!
//! Transaction orchestration and accounting layer for a two-token
//! yield-bearing liquidity pool and its universal swap router: proportional
//! share-to-token conversion, the approve-then-act allowance machine, the
//! router's command/action calldata encoding, and the per-action status
//! lifecycle with classified failures.
//!
//! The library is invoked by a presentation layer. On-chain collaborators
//! (pool, tokens, Permit2, router) sit behind the [`chain::ChainClient`]
//! trait; the host wires in a wallet-backed implementation and feeds
//! account-change notifications into [`session::watch_account_changes`].

pub mod allowance;
pub mod amount;
pub mod chain;
pub mod error;
pub mod math;
pub mod orchestrator;
pub mod session;
pub mod swap;
pub mod sync;
pub mod types;

pub use allowance::{AllowanceManager, AllowanceOutcome};
pub use chain::{ChainClient, ChainError};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, TxStatus};
pub use session::{SessionConfig, SessionContext};
pub use swap::{PoolKey, RouterCall};
pub use sync::{BalanceSynchronizer, PoolSnapshot};
pub use types::{SwapDirection, SwapRequest, TokenDescriptor};
