//! Results aggregation. A pure read over one election's candidates.

use ballot_store::ElectionRecord;
use ballot_types::Address;
use serde::{Deserialize, Serialize};

/// One row of the standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate: Address,
    pub name: String,
    pub vote_count: u64,
    pub weighted_vote_count: u128,
}

/// Running totals for an election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTotals {
    pub total_votes: u64,
    pub total_weighted_votes: u128,
}

/// Standings ranked by raw vote count, highest first.
///
/// The sort is stable, so ties keep registration order. Weighted totals are
/// reported but never affect the ranking, in any voting type.
pub fn rank(record: &ElectionRecord) -> Vec<CandidateResult> {
    let mut results: Vec<CandidateResult> = record
        .candidates()
        .map(|c| CandidateResult {
            candidate: c.address.clone(),
            name: c.name.clone(),
            vote_count: c.vote_count,
            weighted_vote_count: c.weighted_vote_count,
        })
        .collect();
    results.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
    results
}

pub fn totals(record: &ElectionRecord) -> VoteTotals {
    let election = record.election();
    VoteTotals {
        total_votes: election.total_votes,
        total_weighted_votes: election.total_weighted_votes,
    }
}
