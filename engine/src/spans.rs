//! Span constructors for engine operations.
//!
//! Every mutating operation runs inside one of these so log lines from the
//! engine, the store and the ledger can be correlated by election and actor.

use ballot_types::{Address, ElectionId, TokenId};
use tracing::{info_span, Span};

pub fn create_election_span(creator: &Address) -> Span {
    info_span!("create_election", creator = %creator)
}

pub fn register_span(election: ElectionId, candidate: &Address) -> Span {
    info_span!("register_candidate", election = %election, candidate = %candidate)
}

pub fn vote_span(election: ElectionId, voter: &Address) -> Span {
    info_span!("vote", election = %election, voter = %voter)
}

/// Span covering a stake or unstake round trip through the token ledger.
pub fn stake_span(action: &'static str, voter: &Address, token: &TokenId) -> Span {
    info_span!("stake", action, voter = %voter, token = %token)
}
