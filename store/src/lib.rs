//! In-memory election store.
//!
//! Owns every Election, Candidate, Vote and Stake record and enforces the
//! invariants that do not depend on time or on the token ledger:
//! unique ids, one candidate record per (election, address), one vote per
//! (election, voter), and stakes that never go negative.

pub mod entities;
pub mod error;
pub mod record;
pub mod store;

pub use entities::{Candidate, Election, NewElection, Stake, VoteRecord};
pub use error::StoreError;
pub use record::ElectionRecord;
pub use store::ElectionStore;
