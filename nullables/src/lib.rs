//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external dependencies (clock and token ledger) sit behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Can be told to fail on demand
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::{NullLedger, TransferHook};
