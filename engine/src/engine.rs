//! The election engine: every public operation over elections and stakes.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ballot_store::{Candidate, Election, ElectionStore, NewElection, Stake, StoreError, VoteRecord};
use ballot_token::{LedgerError, TokenLedger};
use ballot_types::{Address, Clock, ElectionId, Phase, TimeRemaining, Timestamp, TokenId};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{ElectionEvent, EventBus, EventLog, EventRecord};
use crate::gate::WriterGate;
use crate::policy::{self, WeightBacking};
use crate::results::{self, CandidateResult, VoteTotals};
use crate::spans;

#[derive(Default)]
struct EngineState {
    store: ElectionStore,
    log: EventLog,
}

/// Runs elections against a clock and a token ledger.
///
/// Mutations are serialized by a writer gate held for the whole operation,
/// ledger calls included. The state lock itself is only taken for the short
/// read and commit steps, never across a ledger call, so queries never wait
/// on the ledger. Every operation samples the clock exactly once.
pub struct ElectionEngine<C, L> {
    clock: C,
    ledger: L,
    config: EngineConfig,
    state: RwLock<EngineState>,
    gate: WriterGate,
    bus: RwLock<EventBus>,
}

impl<C: Clock, L: TokenLedger> ElectionEngine<C, L> {
    pub fn new(clock: C, ledger: L, config: EngineConfig) -> Self {
        Self {
            clock,
            ledger,
            config,
            state: RwLock::new(EngineState::default()),
            gate: WriterGate::new(),
            bus: RwLock::new(EventBus::new()),
        }
    }

    pub fn with_defaults(clock: C, ledger: L) -> Self {
        Self::new(clock, ledger, EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ledger account holding every staked token.
    pub fn custody(&self) -> &Address {
        &self.config.custody
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, record: &EventRecord) {
        let bus = self.bus.read().unwrap_or_else(PoisonError::into_inner).clone();
        bus.emit(record);
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Create an election and return its id.
    ///
    /// Text fields are checked first, then the schedule (ordering, then
    /// registration in the future), then token presence for token policies.
    pub fn create_election(&self, new: NewElection) -> Result<ElectionId, EngineError> {
        let _span = spans::create_election_span(&new.creator).entered();
        self.create_election_inner(new)
            .inspect_err(|e| tracing::debug!(error = %e, "create_election rejected"))
    }

    fn create_election_inner(&self, new: NewElection) -> Result<ElectionId, EngineError> {
        let _guard = self.gate.enter()?;
        check_text("title", &new.title, self.config.max_title_len, true)?;
        check_text(
            "description",
            &new.description,
            self.config.max_description_len,
            false,
        )?;
        let now = self.clock.now();

        let creator = new.creator.clone();
        let title = new.title.clone();
        let voting_type = new.voting_type;
        let (id, record) = {
            let mut state = self.write();
            let id = state.store.create_election(new, now)?;
            let record = state.log.append(
                ElectionEvent::ElectionCreated {
                    election: id,
                    creator,
                    title,
                    voting_type,
                },
                now,
            );
            (id, record)
        };
        tracing::info!(election = %id, "election created");
        self.emit(&record);
        Ok(id)
    }

    /// Register `actor` as a candidate while the registration window is open.
    pub fn register_candidate(
        &self,
        id: ElectionId,
        actor: &Address,
        name: &str,
        description: &str,
    ) -> Result<(), EngineError> {
        let _span = spans::register_span(id, actor).entered();
        self.register_candidate_inner(id, actor, name, description)
            .inspect_err(|e| tracing::debug!(error = %e, "register_candidate rejected"))
    }

    fn register_candidate_inner(
        &self,
        id: ElectionId,
        actor: &Address,
        name: &str,
        description: &str,
    ) -> Result<(), EngineError> {
        let _guard = self.gate.enter()?;
        let now = self.clock.now();

        let record = {
            let mut state = self.write();
            let election = state.store.record(id)?;
            if !election.election().schedule.accepts_registrations(now) {
                return Err(EngineError::NotInRegistrationPeriod(id));
            }
            if election.is_registered(actor) {
                return Err(StoreError::AlreadyRegistered {
                    election: id,
                    candidate: actor.clone(),
                }
                .into());
            }
            check_text("name", name, self.config.max_name_len, true)?;
            check_text(
                "description",
                description,
                self.config.max_description_len,
                false,
            )?;
            if election.candidate_count() >= self.config.max_candidates {
                return Err(EngineError::TooManyCandidates {
                    election: id,
                    max: self.config.max_candidates,
                });
            }

            state.store.register_candidate(
                id,
                actor.clone(),
                name.to_string(),
                description.to_string(),
                now,
            )?;
            state.log.append(
                ElectionEvent::CandidateRegistered {
                    election: id,
                    candidate: actor.clone(),
                    name: name.to_string(),
                },
                now,
            )
        };
        tracing::info!(election = %id, candidate = %actor, "candidate registered");
        self.emit(&record);
        Ok(())
    }

    /// Cast `actor`'s single vote in election `id`.
    ///
    /// `weight` must be 0 for one-vote-per-address elections. For token
    /// policies it must meet the election minimum and be covered by the
    /// voter's ledger balance (token-weighted, nothing moves) or by their
    /// stake (staked, the stake is debited).
    pub fn vote(
        &self,
        id: ElectionId,
        actor: &Address,
        candidate: &Address,
        weight: u128,
    ) -> Result<(), EngineError> {
        let _span = spans::vote_span(id, actor).entered();
        self.vote_inner(id, actor, candidate, weight)
            .inspect_err(|e| tracing::debug!(error = %e, "vote rejected"))
    }

    fn vote_inner(
        &self,
        id: ElectionId,
        actor: &Address,
        candidate: &Address,
        weight: u128,
    ) -> Result<(), EngineError> {
        let _guard = self.gate.enter()?;
        let now = self.clock.now();

        let backing = {
            let state = self.read();
            let record = state.store.record(id)?;
            if !record.election().schedule.accepts_votes(now) {
                return Err(EngineError::NotInVotingPeriod(id));
            }
            if !record.is_registered(candidate) {
                return Err(StoreError::CandidateNotFound {
                    election: id,
                    candidate: candidate.clone(),
                }
                .into());
            }
            if record.has_voted(actor) {
                return Err(StoreError::AlreadyVoted {
                    election: id,
                    voter: actor.clone(),
                }
                .into());
            }
            policy::check_weight(record.election(), weight)?
        };

        let stake_token = match &backing {
            WeightBacking::Unweighted => None,
            WeightBacking::Balance(token) => {
                let available = self
                    .ledger
                    .balance_of(actor, token)
                    .map_err(|e| token_error(token, e))?;
                if available < weight {
                    return Err(EngineError::InsufficientTokenBalance {
                        needed: weight,
                        available,
                    });
                }
                None
            }
            WeightBacking::Stake(token) => Some(token),
        };

        let record = {
            let mut state = self.write();
            state
                .store
                .record_vote(id, actor, candidate, weight, stake_token, now)
                .map_err(|e| match e {
                    StoreError::InsufficientStake { needed, available } => {
                        EngineError::InsufficientStake { needed, available }
                    }
                    other => other.into(),
                })?;
            state.log.append(
                ElectionEvent::VoteCast {
                    election: id,
                    voter: actor.clone(),
                    candidate: candidate.clone(),
                    weight,
                },
                now,
            )
        };
        tracing::info!(election = %id, voter = %actor, candidate = %candidate, weight, "vote cast");
        self.emit(&record);
        Ok(())
    }

    /// Move `amount` of `token` from `actor` into custody and credit their
    /// stake. Returns the new staked total.
    ///
    /// The actor must have approved the custody account on the ledger.
    pub fn stake_tokens(
        &self,
        actor: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<u128, EngineError> {
        let _span = spans::stake_span("stake", actor, token).entered();
        self.stake_tokens_inner(actor, token, amount)
            .inspect_err(|e| tracing::debug!(error = %e, "stake rejected"))
    }

    fn stake_tokens_inner(
        &self,
        actor: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<u128, EngineError> {
        let _guard = self.gate.enter()?;
        let now = self.clock.now();
        check_amount(token, amount)?;

        let available = self
            .ledger
            .balance_of(actor, token)
            .map_err(|e| token_error(token, e))?;
        if available < amount {
            return Err(EngineError::InsufficientTokenBalance {
                needed: amount,
                available,
            });
        }
        let current = self.read().store.staked_amount(actor, token);
        current.checked_add(amount).ok_or(StoreError::Overflow)?;

        let custody = &self.config.custody;
        self.ledger
            .transfer_from(custody, actor, custody, token, amount)
            .map_err(EngineError::LedgerTransferFailed)?;

        let committed = {
            let mut state = self.write();
            state
                .store
                .credit_stake(actor, token, amount, now)
                .map(|total| {
                    let record = state.log.append(
                        ElectionEvent::TokensStaked {
                            voter: actor.clone(),
                            token: token.clone(),
                            amount,
                            total,
                        },
                        now,
                    );
                    (total, record)
                })
        };
        let (total, record) = match committed {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(voter = %actor, amount, error = %e, "stake credit failed, refunding");
                if let Err(refund) = self.ledger.transfer(custody, actor, token, amount) {
                    tracing::error!(voter = %actor, amount, error = %refund, "refund failed");
                }
                return Err(e.into());
            }
        };
        tracing::info!(voter = %actor, token = %token, amount, total, "tokens staked");
        self.emit(&record);
        Ok(total)
    }

    /// Debit `amount` from `actor`'s stake and return the tokens from
    /// custody. Returns the remaining stake.
    ///
    /// The stake is only debited once the ledger has returned the tokens, so
    /// a rejected transfer leaves nothing to undo.
    pub fn unstake_tokens(
        &self,
        actor: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<u128, EngineError> {
        let _span = spans::stake_span("unstake", actor, token).entered();
        self.unstake_tokens_inner(actor, token, amount)
            .inspect_err(|e| tracing::debug!(error = %e, "unstake rejected"))
    }

    fn unstake_tokens_inner(
        &self,
        actor: &Address,
        token: &TokenId,
        amount: u128,
    ) -> Result<u128, EngineError> {
        let _guard = self.gate.enter()?;
        let now = self.clock.now();
        check_amount(token, amount)?;

        // The gate keeps other writers off this stake until the debit below.
        let available = self.read().store.staked_amount(actor, token);
        if available < amount {
            return Err(EngineError::InsufficientStakedAmount {
                needed: amount,
                available,
            });
        }

        self.ledger
            .transfer(&self.config.custody, actor, token, amount)
            .map_err(EngineError::LedgerTransferFailed)?;

        let (remaining, record) = {
            let mut state = self.write();
            let remaining = state.store.debit_stake(actor, token, amount, now)?;
            let record = state.log.append(
                ElectionEvent::TokensUnstaked {
                    voter: actor.clone(),
                    token: token.clone(),
                    amount,
                    remaining,
                },
                now,
            );
            (remaining, record)
        };
        tracing::info!(voter = %actor, token = %token, amount, remaining, "tokens unstaked");
        self.emit(&record);
        Ok(remaining)
    }

    /// Register a listener for every event committed from now on.
    pub fn subscribe(&self, listener: impl Fn(&EventRecord) + Send + Sync + 'static) {
        self.bus
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(listener);
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_election(&self, id: ElectionId) -> Result<Election, EngineError> {
        Ok(self.read().store.election(id)?.clone())
    }

    /// All elections in creation order.
    pub fn get_elections(&self) -> Vec<Election> {
        self.read().store.elections().cloned().collect()
    }

    pub fn get_total_elections(&self) -> u64 {
        self.read().store.total_elections()
    }

    pub fn get_candidate(&self, id: ElectionId, candidate: &Address) -> Result<Candidate, EngineError> {
        let state = self.read();
        let record = state.store.record(id)?;
        record
            .candidate(candidate)
            .cloned()
            .ok_or_else(|| {
                StoreError::CandidateNotFound {
                    election: id,
                    candidate: candidate.clone(),
                }
                .into()
            })
    }

    /// Candidate addresses in registration order.
    pub fn get_candidate_list(&self, id: ElectionId) -> Result<Vec<Address>, EngineError> {
        Ok(self.read().store.record(id)?.candidate_list().to_vec())
    }

    /// Standings ranked by raw vote count; available in any phase.
    pub fn get_results(&self, id: ElectionId) -> Result<Vec<CandidateResult>, EngineError> {
        Ok(results::rank(self.read().store.record(id)?))
    }

    pub fn get_total_votes(&self, id: ElectionId) -> Result<VoteTotals, EngineError> {
        Ok(results::totals(self.read().store.record(id)?))
    }

    pub fn has_voted(&self, id: ElectionId, voter: &Address) -> Result<bool, EngineError> {
        Ok(self.read().store.record(id)?.has_voted(voter))
    }

    pub fn get_vote(&self, id: ElectionId, voter: &Address) -> Result<Option<VoteRecord>, EngineError> {
        Ok(self.read().store.record(id)?.vote_of(voter).cloned())
    }

    /// Vote log of one election in casting order.
    pub fn get_votes(&self, id: ElectionId) -> Result<Vec<VoteRecord>, EngineError> {
        Ok(self.read().store.record(id)?.votes().to_vec())
    }

    /// Current phase, derived from the clock.
    ///
    /// Between `registration_end` and `voting_start` this reports
    /// [`Phase::Registration`] even though `register_candidate` is already
    /// refused with `NotInRegistrationPeriod`. Use
    /// [`Schedule::accepts_registrations`](ballot_types::Schedule::accepts_registrations)
    /// to ask whether registration is open.
    pub fn get_status(&self, id: ElectionId) -> Result<Phase, EngineError> {
        let now = self.clock.now();
        Ok(self.read().store.election(id)?.phase_at(now))
    }

    pub fn get_time_remaining(&self, id: ElectionId) -> Result<TimeRemaining, EngineError> {
        let now = self.clock.now();
        Ok(self.read().store.election(id)?.time_remaining(now))
    }

    pub fn get_staked_amount(&self, voter: &Address, token: &TokenId) -> u128 {
        self.read().store.staked_amount(voter, token)
    }

    pub fn get_stake(&self, voter: &Address, token: &TokenId) -> Option<Stake> {
        self.read().store.stake(voter, token).cloned()
    }

    /// Every event committed so far, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.read().log.records().to_vec()
    }

    /// Events with a sequence number greater than `after`.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.read().log.since(after).to_vec()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

fn check_text(field: &'static str, value: &str, max: usize, required: bool) -> Result<(), EngineError> {
    if required && value.trim().is_empty() {
        return Err(EngineError::EmptyField { field });
    }
    if value.len() > max {
        return Err(EngineError::FieldTooLong { field, max });
    }
    Ok(())
}

fn check_amount(token: &TokenId, amount: u128) -> Result<(), EngineError> {
    if amount == 0 {
        return Err(EngineError::InvalidAmount);
    }
    if !token.is_valid() {
        return Err(EngineError::InvalidToken(token.clone()));
    }
    Ok(())
}

fn token_error(token: &TokenId, err: LedgerError) -> EngineError {
    match err {
        LedgerError::UnknownToken(_) => EngineError::InvalidToken(token.clone()),
        other => EngineError::Ledger(other),
    }
}
