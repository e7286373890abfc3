//! Per-election aggregate: the election plus its candidates, voters and vote log.

use std::collections::HashMap;

use crate::entities::{Candidate, Election, VoteRecord};
use crate::error::StoreError;
use ballot_types::{Address, ElectionId, Timestamp};

/// Counter values a vote will produce, computed before anything is written.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VoteTally {
    candidate_votes: u64,
    candidate_weight: u128,
    total_votes: u64,
    total_weight: u128,
}

/// Everything scoped to a single election, kept together so a vote can be
/// checked in full and then applied in one step.
#[derive(Clone, Debug)]
pub struct ElectionRecord {
    election: Election,
    candidates: HashMap<Address, Candidate>,
    /// Candidate addresses in registration order.
    candidate_order: Vec<Address>,
    /// Has-voted marker: voter → index of their record in `votes`.
    voters: HashMap<Address, usize>,
    /// Append-only vote log.
    votes: Vec<VoteRecord>,
}

impl ElectionRecord {
    pub(crate) fn new(election: Election) -> Self {
        Self {
            election,
            candidates: HashMap::new(),
            candidate_order: Vec::new(),
            voters: HashMap::new(),
            votes: Vec::new(),
        }
    }

    pub fn id(&self) -> ElectionId {
        self.election.id
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn candidate(&self, address: &Address) -> Option<&Candidate> {
        self.candidates.get(address)
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.candidates
            .get(address)
            .is_some_and(|c| c.registered)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_order.len()
    }

    /// Candidate addresses in registration order.
    pub fn candidate_list(&self) -> &[Address] {
        &self.candidate_order
    }

    /// Candidates in registration order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidate_order
            .iter()
            .filter_map(|addr| self.candidates.get(addr))
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains_key(voter)
    }

    pub fn vote_of(&self, voter: &Address) -> Option<&VoteRecord> {
        self.voters.get(voter).and_then(|&i| self.votes.get(i))
    }

    pub fn votes(&self) -> &[VoteRecord] {
        &self.votes
    }

    /// Add a candidate with zero counters at the end of the registration order.
    pub(crate) fn register_candidate(
        &mut self,
        address: Address,
        name: String,
        description: String,
        now: Timestamp,
    ) -> Result<&Candidate, StoreError> {
        if self.is_registered(&address) {
            return Err(StoreError::AlreadyRegistered {
                election: self.election.id,
                candidate: address,
            });
        }
        let candidate = Candidate {
            address: address.clone(),
            name,
            description,
            vote_count: 0,
            weighted_vote_count: 0,
            registered: true,
            registered_at: now,
        };
        self.candidate_order.push(address.clone());
        Ok(self.candidates.entry(address).or_insert(candidate))
    }

    /// Check every precondition of a vote and compute the resulting counters.
    ///
    /// Candidate existence is checked before the has-voted marker.
    pub(crate) fn check_vote(
        &self,
        voter: &Address,
        candidate: &Address,
        weight: u128,
    ) -> Result<VoteTally, StoreError> {
        let entry = self
            .candidates
            .get(candidate)
            .filter(|c| c.registered)
            .ok_or_else(|| StoreError::CandidateNotFound {
                election: self.election.id,
                candidate: candidate.clone(),
            })?;
        if self.voters.contains_key(voter) {
            return Err(StoreError::AlreadyVoted {
                election: self.election.id,
                voter: voter.clone(),
            });
        }
        Ok(VoteTally {
            candidate_votes: entry.vote_count.checked_add(1).ok_or(StoreError::Overflow)?,
            candidate_weight: entry
                .weighted_vote_count
                .checked_add(weight)
                .ok_or(StoreError::Overflow)?,
            total_votes: self
                .election
                .total_votes
                .checked_add(1)
                .ok_or(StoreError::Overflow)?,
            total_weight: self
                .election
                .total_weighted_votes
                .checked_add(weight)
                .ok_or(StoreError::Overflow)?,
        })
    }

    /// Apply a tally produced by [`Self::check_vote`] against the same state.
    pub(crate) fn apply_vote(
        &mut self,
        voter: &Address,
        candidate: &Address,
        weight: u128,
        tally: VoteTally,
        now: Timestamp,
    ) -> VoteRecord {
        if let Some(entry) = self.candidates.get_mut(candidate) {
            entry.vote_count = tally.candidate_votes;
            entry.weighted_vote_count = tally.candidate_weight;
        }
        self.election.total_votes = tally.total_votes;
        self.election.total_weighted_votes = tally.total_weight;
        self.voters.insert(voter.clone(), self.votes.len());
        let record = VoteRecord {
            voter: voter.clone(),
            candidate: candidate.clone(),
            timestamp: now,
            weight,
        };
        self.votes.push(record.clone());
        record
    }
}
