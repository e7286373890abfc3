//! Election identity, voting policy, and the time-derived phase machine.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of an election. Allocated from 1 and never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElectionId(u64);

impl ElectionId {
    /// The first id handed out by a fresh store.
    pub const FIRST: Self = Self(1);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the `weight` of a vote is validated and applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingType {
    /// Every address gets one unweighted vote. Weight must be zero.
    OneVotePerAddress,
    /// Weight is backed by the voter's live token balance (not escrowed).
    TokenWeighted,
    /// Weight is consumed from tokens the voter staked with the engine.
    StakedVoting,
}

impl VotingType {
    /// Whether elections of this type must reference a token.
    pub fn requires_token(&self) -> bool {
        !matches!(self, Self::OneVotePerAddress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneVotePerAddress => "one_vote_per_address",
            Self::TokenWeighted => "token_weighted",
            Self::StakedVoting => "staked_voting",
        }
    }
}

impl fmt::Display for VotingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four phases of an election, derived from the clock and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Registration,
    Voting,
    Ended,
}

impl Phase {
    /// Human-readable phase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Registration => "Registration",
            Self::Voting => "Voting",
            Self::Ended => "Ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a schedule was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time range: timestamps must be strictly increasing")]
    InvalidTimeRange,

    #[error("registration must start after {now}, got {registration_start}")]
    RegistrationNotFuture {
        registration_start: Timestamp,
        now: Timestamp,
    },
}

/// Seconds left in each window, plus the phase they were computed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub registration_secs: u64,
    pub voting_secs: u64,
    pub phase: Phase,
}

/// The four ordered timestamps bounding an election.
///
/// Invariant after [`Schedule::validate`]:
/// `registration_start < registration_end < voting_start < voting_end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub registration_start: Timestamp,
    pub registration_end: Timestamp,
    pub voting_start: Timestamp,
    pub voting_end: Timestamp,
}

impl Schedule {
    pub fn new(
        registration_start: Timestamp,
        registration_end: Timestamp,
        voting_start: Timestamp,
        voting_end: Timestamp,
    ) -> Self {
        Self {
            registration_start,
            registration_end,
            voting_start,
            voting_end,
        }
    }

    /// Check ordering first, then that registration opens strictly after `now`.
    pub fn validate(&self, now: Timestamp) -> Result<(), ScheduleError> {
        if self.registration_start >= self.registration_end
            || self.registration_end >= self.voting_start
            || self.voting_start >= self.voting_end
        {
            return Err(ScheduleError::InvalidTimeRange);
        }
        if self.registration_start <= now {
            return Err(ScheduleError::RegistrationNotFuture {
                registration_start: self.registration_start,
                now,
            });
        }
        Ok(())
    }

    /// Phase at `now`. A pure, total, monotone function of time.
    ///
    /// The gap between `registration_end` and `voting_start` reports as
    /// `Registration`; it accepts neither registrations nor votes.
    pub fn phase_at(&self, now: Timestamp) -> Phase {
        if now < self.registration_start {
            Phase::NotStarted
        } else if now < self.voting_start {
            Phase::Registration
        } else if now <= self.voting_end {
            Phase::Voting
        } else {
            Phase::Ended
        }
    }

    /// `registration_start <= now <= registration_end`.
    pub fn accepts_registrations(&self, now: Timestamp) -> bool {
        self.registration_start <= now && now <= self.registration_end
    }

    /// `voting_start <= now <= voting_end`.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        self.voting_start <= now && now <= self.voting_end
    }

    pub fn time_remaining(&self, now: Timestamp) -> TimeRemaining {
        let phase = self.phase_at(now);
        let (registration_secs, voting_secs) = match phase {
            Phase::NotStarted | Phase::Registration => (
                self.registration_end.secs_until(now),
                self.voting_end.secs_until(now),
            ),
            Phase::Voting => (0, self.voting_end.secs_until(now)),
            Phase::Ended => (0, 0),
        };
        TimeRemaining {
            registration_secs,
            voting_secs,
            phase,
        }
    }
}
