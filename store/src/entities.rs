//! The four entity kinds owned by the store.
//!
//! Everything here is plain data. Readers outside the store only ever see
//! clones of these records.

use ballot_types::{Address, ElectionId, Phase, Schedule, TimeRemaining, Timestamp, TokenId, VotingType};
use serde::{Deserialize, Serialize};

/// Fields supplied by the caller when creating an election.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewElection {
    pub title: String,
    pub description: String,
    pub creator: Address,
    pub schedule: Schedule,
    pub voting_type: VotingType,
    /// Required for `TokenWeighted` and `StakedVoting`.
    pub token: Option<TokenId>,
    /// Minimum vote weight; ignored by `OneVotePerAddress`.
    pub min_token_required: u128,
}

/// An election. Immutable after creation apart from the running totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    pub creator: Address,
    pub created_at: Timestamp,
    pub schedule: Schedule,
    pub voting_type: VotingType,
    pub token: Option<TokenId>,
    pub min_token_required: u128,
    /// Number of votes cast, maintained by the vote operation.
    pub total_votes: u64,
    /// Sum of all vote weights, maintained by the vote operation.
    pub total_weighted_votes: u128,
}

impl Election {
    pub fn phase_at(&self, now: Timestamp) -> Phase {
        self.schedule.phase_at(now)
    }

    pub fn time_remaining(&self, now: Timestamp) -> TimeRemaining {
        self.schedule.time_remaining(now)
    }
}

/// A candidate registered in one election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: Address,
    pub name: String,
    pub description: String,
    pub vote_count: u64,
    pub weighted_vote_count: u128,
    pub registered: bool,
    pub registered_at: Timestamp,
}

/// Audit record of one cast ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: Address,
    pub candidate: Address,
    pub timestamp: Timestamp,
    /// Zero for `OneVotePerAddress` elections.
    pub weight: u128,
}

/// Tokens a voter has placed in the engine's custody.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub voter: Address,
    pub token: TokenId,
    pub amount: u128,
    /// Last stake, unstake, or vote that touched this record.
    pub updated_at: Timestamp,
    pub active: bool,
}

impl Stake {
    pub(crate) fn empty(voter: Address, token: TokenId, now: Timestamp) -> Self {
        Self {
            voter,
            token,
            amount: 0,
            updated_at: now,
            active: false,
        }
    }

    pub(crate) fn set_amount(&mut self, amount: u128, now: Timestamp) {
        self.amount = amount;
        self.active = amount > 0;
        self.updated_at = now;
    }
}
