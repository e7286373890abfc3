//! Replays a [`Scenario`] against a fresh engine and collects a report.

use std::sync::Arc;

use anyhow::Context;
use ballot_engine::{CandidateResult, ElectionEngine, EngineConfig, EventRecord, VoteTotals};
use ballot_nullables::NullClock;
use ballot_store::{Election, NewElection};
use ballot_token::MemoryLedger;
use ballot_types::{Address, ElectionId, Phase, Schedule, TimeRemaining, Timestamp, TokenId};
use ballot_utils::format_duration;
use serde::Serialize;

use crate::scenario::{Scenario, Step};

pub type SimEngine = ElectionEngine<Arc<NullClock>, Arc<MemoryLedger>>;

#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub at: Timestamp,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ElectionReport {
    pub election: Election,
    pub status: Phase,
    pub time_remaining: TimeRemaining,
    /// `time_remaining.voting_secs` in readable form.
    pub voting_closes_in: String,
    pub totals: VoteTotals,
    pub results: Vec<CandidateResult>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub finished_at: Timestamp,
    pub steps: Vec<StepOutcome>,
    pub elections: Vec<ElectionReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRecord>,
}

/// An engine wired to a simulated clock and an in-memory ledger.
pub struct Simulator {
    clock: Arc<NullClock>,
    ledger: Arc<MemoryLedger>,
    engine: SimEngine,
}

impl Simulator {
    pub fn new(config: EngineConfig, start: u64) -> Self {
        let clock = Arc::new(NullClock::new(start));
        let ledger = Arc::new(MemoryLedger::new());
        let engine = ElectionEngine::new(Arc::clone(&clock), Arc::clone(&ledger), config);
        Self {
            clock,
            ledger,
            engine,
        }
    }

    pub fn engine(&self) -> &SimEngine {
        &self.engine
    }

    /// Apply one step, returning a short description of what it produced.
    pub fn apply(&self, step: &Step) -> anyhow::Result<Option<String>> {
        let detail = match step {
            Step::SetTime { at } => {
                self.clock.set(*at);
                None
            }
            Step::Advance { secs } => {
                self.clock.advance(*secs);
                None
            }
            Step::Mint {
                account,
                token,
                amount,
            } => {
                self.ledger
                    .mint(&Address::new(account.as_str()), &TokenId::new(token.as_str()), *amount)?;
                None
            }
            Step::Approve {
                owner,
                token,
                amount,
            } => {
                self.ledger.approve(
                    &Address::new(owner.as_str()),
                    self.engine.custody(),
                    &TokenId::new(token.as_str()),
                    *amount,
                )?;
                None
            }
            Step::Create {
                creator,
                title,
                description,
                voting_type,
                token,
                min_token_required,
                registration_start,
                registration_end,
                voting_start,
                voting_end,
            } => {
                let id = self.engine.create_election(NewElection {
                    title: title.clone(),
                    description: description.clone(),
                    creator: Address::new(creator.as_str()),
                    schedule: Schedule::new(
                        Timestamp::new(*registration_start),
                        Timestamp::new(*registration_end),
                        Timestamp::new(*voting_start),
                        Timestamp::new(*voting_end),
                    ),
                    voting_type: *voting_type,
                    token: token.as_deref().map(TokenId::new),
                    min_token_required: *min_token_required,
                })?;
                Some(format!("election {id}"))
            }
            Step::Register {
                election,
                candidate,
                name,
                description,
            } => {
                self.engine.register_candidate(
                    ElectionId::new(*election),
                    &Address::new(candidate.as_str()),
                    name,
                    description,
                )?;
                None
            }
            Step::Vote {
                election,
                voter,
                candidate,
                weight,
            } => {
                self.engine.vote(
                    ElectionId::new(*election),
                    &Address::new(voter.as_str()),
                    &Address::new(candidate.as_str()),
                    *weight,
                )?;
                None
            }
            Step::Stake {
                voter,
                token,
                amount,
            } => {
                let total = self.engine.stake_tokens(
                    &Address::new(voter.as_str()),
                    &TokenId::new(token.as_str()),
                    *amount,
                )?;
                Some(format!("staked total {total}"))
            }
            Step::Unstake {
                voter,
                token,
                amount,
            } => {
                let remaining = self.engine.unstake_tokens(
                    &Address::new(voter.as_str()),
                    &TokenId::new(token.as_str()),
                    *amount,
                )?;
                Some(format!("remaining stake {remaining}"))
            }
        };
        Ok(detail)
    }

    /// Snapshot every election as of the current simulated time.
    pub fn report(&self, steps: Vec<StepOutcome>, include_events: bool) -> anyhow::Result<Report> {
        let elections = self
            .engine
            .get_elections()
            .into_iter()
            .map(|election| -> anyhow::Result<ElectionReport> {
                let id = election.id;
                let time_remaining = self.engine.get_time_remaining(id)?;
                Ok(ElectionReport {
                    status: self.engine.get_status(id)?,
                    voting_closes_in: format_duration(time_remaining.voting_secs),
                    time_remaining,
                    totals: self.engine.get_total_votes(id)?,
                    results: self.engine.get_results(id)?,
                    election,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Report {
            finished_at: self.engine.now(),
            steps,
            elections,
            events: if include_events {
                self.engine.events()
            } else {
                Vec::new()
            },
        })
    }
}

/// Run every step of `scenario` and report the final state.
///
/// A failing step is recorded and the run continues, unless the scenario is
/// strict, in which case the failure is returned.
pub fn run(scenario: &Scenario, config: EngineConfig, include_events: bool) -> anyhow::Result<Report> {
    let sim = Simulator::new(config, scenario.start);
    let mut outcomes = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let action = step.action();
        let result = sim.apply(step);
        let at = sim.engine().now();
        match result {
            Ok(detail) => {
                tracing::debug!(step = index, action, "step applied");
                outcomes.push(StepOutcome {
                    index,
                    action,
                    at,
                    ok: true,
                    detail,
                    error: None,
                });
            }
            Err(e) if scenario.strict => {
                return Err(e).with_context(|| format!("step {index} ({action}) failed"));
            }
            Err(e) => {
                tracing::info!(step = index, action, error = %e, "step rejected");
                outcomes.push(StepOutcome {
                    index,
                    action,
                    at,
                    ok: false,
                    detail: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    sim.report(outcomes, include_events)
}
