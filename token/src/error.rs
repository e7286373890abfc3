//! Token ledger errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("token {0} is not known to the ledger")]
    UnknownToken(String),

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("transfer amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("transfer rejected: {0}")]
    Rejected(String),
}
