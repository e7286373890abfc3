use ballot_types::{Address, ElectionId, ScheduleError, Timestamp, VotingType};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("election {0} not found")]
    ElectionNotFound(ElectionId),

    #[error("invalid time range: timestamps must be strictly increasing")]
    InvalidTimeRange,

    #[error("registration must start in the future: starts {registration_start}, now {now}")]
    RegistrationNotFuture {
        registration_start: Timestamp,
        now: Timestamp,
    },

    #[error("{0} elections require a token")]
    TokenRequired(VotingType),

    #[error("{candidate} is already registered in election {election}")]
    AlreadyRegistered {
        election: ElectionId,
        candidate: Address,
    },

    #[error("{candidate} is not a candidate in election {election}")]
    CandidateNotFound {
        election: ElectionId,
        candidate: Address,
    },

    #[error("{voter} has already voted in election {election}")]
    AlreadyVoted {
        election: ElectionId,
        voter: Address,
    },

    #[error("insufficient stake: need {needed}, have {available}")]
    InsufficientStake { needed: u128, available: u128 },

    #[error("arithmetic overflow")]
    Overflow,
}

impl From<ScheduleError> for StoreError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::InvalidTimeRange => Self::InvalidTimeRange,
            ScheduleError::RegistrationNotFuture {
                registration_start,
                now,
            } => Self::RegistrationNotFuture {
                registration_start,
                now,
            },
        }
    }
}
