//! Error types for the StableSwap client
//!
//! Every failure an action chain can hit maps to one variant here, so the
//! presentation layer always receives a classified, human-readable message.

use thiserror::Error;

use crate::chain::ChainError;

/// Client error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed amount: {0}")]
    MalformedAmount(String),

    #[error("Please enter an amount greater than zero")]
    EmptyAmount,

    #[error("No pool shares to withdraw")]
    NoSharesToWithdraw,

    #[error("Withdrawal percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(u8),

    #[error("Slippage must be below 10000 basis points, got {0}")]
    InvalidSlippage(u32),

    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("Approval cancelled by user: {0}")]
    ApprovalRejected(String),

    #[error("Approval transaction failed: {0}")]
    ApprovalFailed(String),

    #[error("Transaction cancelled by user: {0}")]
    UserRejected(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Which step of an action chain a chain error came from.
///
/// Approvals and the primary action surface to the user under different
/// labels, so the classifier needs to know where the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Approval,
    Action,
}

impl Error {
    /// Classify a raw chain failure into a user-facing error.
    ///
    /// Revert reasons are sniffed for the two shortfall signatures the pool
    /// emits: the token's transfer-exceeds-balance message on deposit and
    /// the checked-arithmetic panic on an overdrawn withdraw.
    pub fn from_chain(err: ChainError, stage: Stage) -> Self {
        match err {
            ChainError::Rejected(msg) => match stage {
                Stage::Approval => Error::ApprovalRejected(msg),
                Stage::Action => Error::UserRejected(msg),
            },
            ChainError::Reverted(reason) => {
                if reason.contains("transfer amount exceeds balance") {
                    Error::InsufficientBalance("deposit amount exceeds balance".to_string())
                } else if reason.contains("arithmetic") {
                    Error::InsufficientBalance("withdraw amount exceeds balance".to_string())
                } else {
                    match stage {
                        Stage::Approval => Error::ApprovalFailed(reason),
                        Stage::Action => Error::TransactionReverted(reason),
                    }
                }
            }
            ChainError::Rpc(source) => Error::Network(source.to_string()),
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
