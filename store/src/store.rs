//! The election store: an arena of election aggregates plus the stake table.

use std::collections::HashMap;

use crate::entities::{Candidate, Election, NewElection, Stake, VoteRecord};
use crate::error::StoreError;
use crate::record::ElectionRecord;
use ballot_types::{Address, ElectionId, Timestamp, TokenId};

/// Authoritative storage for elections, candidates, votes and stakes.
///
/// Elections live in an arena: id `n` is stored at index `n - 1`, so ids are
/// allocated from 1, never reused, and lookups are O(1).
#[derive(Clone, Debug, Default)]
pub struct ElectionStore {
    elections: Vec<ElectionRecord>,
    /// (voter, token) → stake.
    stakes: HashMap<(Address, TokenId), Stake>,
}

impl ElectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next successful [`Self::create_election`] will return.
    pub fn next_election_id(&self) -> ElectionId {
        ElectionId::new(self.elections.len() as u64 + 1)
    }

    /// Validate and insert a new election.
    ///
    /// Check order: timestamp ordering, registration in the future, token
    /// presence. Nothing is written unless every check passes.
    pub fn create_election(
        &mut self,
        new: NewElection,
        now: Timestamp,
    ) -> Result<ElectionId, StoreError> {
        new.schedule.validate(now)?;
        let token = new.token.filter(|t| t.is_valid());
        if new.voting_type.requires_token() && token.is_none() {
            return Err(StoreError::TokenRequired(new.voting_type));
        }
        let id = self.next_election_id();
        let election = Election {
            id,
            title: new.title,
            description: new.description,
            creator: new.creator,
            created_at: now,
            schedule: new.schedule,
            voting_type: new.voting_type,
            token,
            min_token_required: new.min_token_required,
            total_votes: 0,
            total_weighted_votes: 0,
        };
        self.elections.push(ElectionRecord::new(election));
        Ok(id)
    }

    fn index_of(&self, id: ElectionId) -> Result<usize, StoreError> {
        let index = id
            .get()
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|&i| i < self.elections.len());
        index.ok_or(StoreError::ElectionNotFound(id))
    }

    pub fn record(&self, id: ElectionId) -> Result<&ElectionRecord, StoreError> {
        let index = self.index_of(id)?;
        Ok(&self.elections[index])
    }

    fn record_mut(&mut self, id: ElectionId) -> Result<&mut ElectionRecord, StoreError> {
        let index = self.index_of(id)?;
        Ok(&mut self.elections[index])
    }

    pub fn election(&self, id: ElectionId) -> Result<&Election, StoreError> {
        self.record(id).map(ElectionRecord::election)
    }

    pub fn total_elections(&self) -> u64 {
        self.elections.len() as u64
    }

    /// All elections in creation order.
    pub fn elections(&self) -> impl Iterator<Item = &Election> + '_ {
        self.elections.iter().map(ElectionRecord::election)
    }

    pub fn register_candidate(
        &mut self,
        id: ElectionId,
        address: Address,
        name: String,
        description: String,
        now: Timestamp,
    ) -> Result<&Candidate, StoreError> {
        self.record_mut(id)?
            .register_candidate(address, name, description, now)
    }

    /// Record a vote, optionally paying its weight out of the voter's stake.
    ///
    /// Checks candidate, has-voted, stake sufficiency and every counter for
    /// overflow before writing anything, so a rejected vote changes nothing.
    pub fn record_vote(
        &mut self,
        id: ElectionId,
        voter: &Address,
        candidate: &Address,
        weight: u128,
        stake_token: Option<&TokenId>,
        now: Timestamp,
    ) -> Result<VoteRecord, StoreError> {
        let index = self.index_of(id)?;
        let tally = self.elections[index].check_vote(voter, candidate, weight)?;
        let remaining_stake = match stake_token {
            Some(token) => Some(self.check_debit(voter, token, weight)?),
            None => None,
        };

        if let (Some(token), Some(remaining)) = (stake_token, remaining_stake) {
            self.set_stake(voter, token, remaining, now);
        }
        Ok(self.elections[index].apply_vote(voter, candidate, weight, tally, now))
    }

    pub fn stake(&self, voter: &Address, token: &TokenId) -> Option<&Stake> {
        self.stakes.get(&(voter.clone(), token.clone()))
    }

    pub fn staked_amount(&self, voter: &Address, token: &TokenId) -> u128 {
        self.stake(voter, token).map(|s| s.amount).unwrap_or(0)
    }

    fn check_debit(&self, voter: &Address, token: &TokenId, amount: u128) -> Result<u128, StoreError> {
        let available = self.staked_amount(voter, token);
        available
            .checked_sub(amount)
            .ok_or(StoreError::InsufficientStake {
                needed: amount,
                available,
            })
    }

    fn set_stake(&mut self, voter: &Address, token: &TokenId, amount: u128, now: Timestamp) {
        self.stakes
            .entry((voter.clone(), token.clone()))
            .or_insert_with(|| Stake::empty(voter.clone(), token.clone(), now))
            .set_amount(amount, now);
    }

    /// Add `amount` to a stake, returning the new amount.
    pub fn credit_stake(
        &mut self,
        voter: &Address,
        token: &TokenId,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, StoreError> {
        let updated = self
            .staked_amount(voter, token)
            .checked_add(amount)
            .ok_or(StoreError::Overflow)?;
        self.set_stake(voter, token, updated, now);
        Ok(updated)
    }

    /// Remove `amount` from a stake, returning the new amount. Never goes negative.
    pub fn debit_stake(
        &mut self,
        voter: &Address,
        token: &TokenId,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, StoreError> {
        let updated = self.check_debit(voter, token, amount)?;
        self.set_stake(voter, token, updated, now);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::{Schedule, VotingType};

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    fn gov() -> TokenId {
        TokenId::new("GOV")
    }

    fn schedule() -> Schedule {
        Schedule::new(
            Timestamp::new(100),
            Timestamp::new(200),
            Timestamp::new(300),
            Timestamp::new(400),
        )
    }

    fn new_election(voting_type: VotingType, token: Option<TokenId>) -> NewElection {
        NewElection {
            title: "Board".into(),
            description: "Annual board election".into(),
            creator: addr("creator"),
            schedule: schedule(),
            voting_type,
            token,
            min_token_required: 0,
        }
    }

    fn store_with_candidates() -> (ElectionStore, ElectionId) {
        let mut store = ElectionStore::new();
        let id = store
            .create_election(new_election(VotingType::StakedVoting, Some(gov())), Timestamp::new(0))
            .unwrap();
        for name in ["a", "b"] {
            store
                .register_candidate(id, addr(name), name.into(), String::new(), Timestamp::new(150))
                .unwrap();
        }
        (store, id)
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut store = ElectionStore::new();
        let now = Timestamp::new(0);
        let first = store
            .create_election(new_election(VotingType::OneVotePerAddress, None), now)
            .unwrap();
        let second = store
            .create_election(new_election(VotingType::OneVotePerAddress, None), now)
            .unwrap();
        assert_eq!(first, ElectionId::FIRST);
        assert_eq!(second.get(), 2);
        assert_eq!(store.total_elections(), 2);
    }

    #[test]
    fn test_rejected_creation_does_not_consume_an_id() {
        let mut store = ElectionStore::new();
        let err = store
            .create_election(new_election(VotingType::TokenWeighted, None), Timestamp::new(0))
            .unwrap_err();
        assert_eq!(err, StoreError::TokenRequired(VotingType::TokenWeighted));
        assert_eq!(store.total_elections(), 0);
        assert_eq!(store.next_election_id(), ElectionId::FIRST);
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let mut store = ElectionStore::new();
        let err = store
            .create_election(
                new_election(VotingType::StakedVoting, Some(TokenId::new(""))),
                Timestamp::new(0),
            )
            .unwrap_err();
        assert_eq!(err, StoreError::TokenRequired(VotingType::StakedVoting));
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let store = ElectionStore::new();
        assert_eq!(
            store.election(ElectionId::new(0)).unwrap_err(),
            StoreError::ElectionNotFound(ElectionId::new(0))
        );
        assert!(store.election(ElectionId::new(7)).is_err());
    }

    #[test]
    fn test_candidate_order_is_registration_order() {
        let (mut store, id) = store_with_candidates();
        store
            .register_candidate(id, addr("c"), "c".into(), String::new(), Timestamp::new(160))
            .unwrap();
        let record = store.record(id).unwrap();
        assert_eq!(record.candidate_list(), &[addr("a"), addr("b"), addr("c")]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let (mut store, id) = store_with_candidates();
        let err = store
            .register_candidate(id, addr("a"), "again".into(), String::new(), Timestamp::new(170))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyRegistered { .. }));
        assert_eq!(store.record(id).unwrap().candidate_count(), 2);
    }

    #[test]
    fn test_staked_vote_debits_stake_and_counts() {
        let (mut store, id) = store_with_candidates();
        store
            .credit_stake(&addr("v"), &gov(), 1_000, Timestamp::new(10))
            .unwrap();
        let record = store
            .record_vote(id, &addr("v"), &addr("a"), 400, Some(&gov()), Timestamp::new(350))
            .unwrap();
        assert_eq!(record.weight, 400);
        assert_eq!(store.staked_amount(&addr("v"), &gov()), 600);
        let election = store.election(id).unwrap();
        assert_eq!((election.total_votes, election.total_weighted_votes), (1, 400));
        let candidate = store.record(id).unwrap().candidate(&addr("a")).unwrap();
        assert_eq!((candidate.vote_count, candidate.weighted_vote_count), (1, 400));
    }

    #[test]
    fn test_insufficient_stake_changes_nothing() {
        let (mut store, id) = store_with_candidates();
        store
            .credit_stake(&addr("v"), &gov(), 100, Timestamp::new(10))
            .unwrap();
        let err = store
            .record_vote(id, &addr("v"), &addr("a"), 400, Some(&gov()), Timestamp::new(350))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InsufficientStake {
                needed: 400,
                available: 100
            }
        );
        assert_eq!(store.staked_amount(&addr("v"), &gov()), 100);
        assert!(!store.record(id).unwrap().has_voted(&addr("v")));
        assert_eq!(store.election(id).unwrap().total_votes, 0);
    }

    #[test]
    fn test_second_vote_rejected_before_stake_is_touched() {
        let (mut store, id) = store_with_candidates();
        store
            .credit_stake(&addr("v"), &gov(), 1_000, Timestamp::new(10))
            .unwrap();
        store
            .record_vote(id, &addr("v"), &addr("a"), 500, Some(&gov()), Timestamp::new(350))
            .unwrap();
        let err = store
            .record_vote(id, &addr("v"), &addr("b"), 500, Some(&gov()), Timestamp::new(351))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyVoted { .. }));
        assert_eq!(store.staked_amount(&addr("v"), &gov()), 500);
    }

    #[test]
    fn test_unknown_candidate_reported_before_double_vote() {
        let (mut store, id) = store_with_candidates();
        store
            .record_vote(id, &addr("v"), &addr("a"), 0, None, Timestamp::new(350))
            .unwrap();
        let err = store
            .record_vote(id, &addr("v"), &addr("nobody"), 0, None, Timestamp::new(351))
            .unwrap_err();
        assert!(matches!(err, StoreError::CandidateNotFound { .. }));
    }

    #[test]
    fn test_vote_of_returns_audit_record() {
        let (mut store, id) = store_with_candidates();
        store
            .record_vote(id, &addr("v"), &addr("b"), 0, None, Timestamp::new(350))
            .unwrap();
        let record = store.record(id).unwrap();
        let vote = record.vote_of(&addr("v")).unwrap();
        assert_eq!(vote.candidate, addr("b"));
        assert_eq!(vote.timestamp, Timestamp::new(350));
        assert!(record.vote_of(&addr("w")).is_none());
    }

    #[test]
    fn test_stake_active_flag_follows_amount() {
        let mut store = ElectionStore::new();
        store
            .credit_stake(&addr("v"), &gov(), 50, Timestamp::new(1))
            .unwrap();
        assert!(store.stake(&addr("v"), &gov()).unwrap().active);
        store
            .debit_stake(&addr("v"), &gov(), 50, Timestamp::new(2))
            .unwrap();
        let stake = store.stake(&addr("v"), &gov()).unwrap();
        assert!(!stake.active);
        assert_eq!(stake.updated_at, Timestamp::new(2));
        assert!(store
            .debit_stake(&addr("v"), &gov(), 1, Timestamp::new(3))
            .is_err());
    }
}
