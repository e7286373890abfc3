//! Token ledger: the fungible-token service backing weighted and staked voting.
//!
//! The engine only needs a narrow slice of a token ledger:
//! - `balance_of` to check a voter's holdings
//! - `transfer_from` to pull staked tokens into custody
//! - `transfer` to pay unstaked tokens back out
//!
//! [`TokenLedger`] is that slice. [`MemoryLedger`] is a complete in-memory
//! ledger (balances, allowances, supply) used by the CLI and by tests.

pub mod error;
pub mod ledger;
pub mod memory;

pub use error::LedgerError;
pub use ledger::TokenLedger;
pub use memory::MemoryLedger;
