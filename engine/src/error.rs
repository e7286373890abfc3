use ballot_store::StoreError;
use ballot_token::LedgerError;
use ballot_types::{ElectionId, TokenId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("election {0} is not accepting candidate registrations")]
    NotInRegistrationPeriod(ElectionId),

    #[error("election {0} is not accepting votes")]
    NotInVotingPeriod(ElectionId),

    #[error("one-vote-per-address elections take no weight, got {0}")]
    UnexpectedWeight(u128),

    #[error("vote weight {weight} is below the required minimum {minimum}")]
    InsufficientTokenAmount { weight: u128, minimum: u128 },

    #[error("insufficient token balance: need {needed}, have {available}")]
    InsufficientTokenBalance { needed: u128, available: u128 },

    #[error("insufficient stake for vote weight: need {needed}, have {available}")]
    InsufficientStake { needed: u128, available: u128 },

    #[error("insufficient staked amount: need {needed}, have {available}")]
    InsufficientStakedAmount { needed: u128, available: u128 },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("invalid token: {0:?}")]
    InvalidToken(TokenId),

    #[error("ledger transfer failed: {0}")]
    LedgerTransferFailed(#[source] LedgerError),

    #[error("ledger query failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("a mutating operation is already in progress on this thread")]
    Reentrant,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is longer than {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("election {election} already has the maximum of {max} candidates")]
    TooManyCandidates { election: ElectionId, max: usize },
}

/// Coarse classification of failures, for callers deciding what to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The election or candidate does not exist.
    NotFound,
    /// Wrong phase or a uniqueness/ordering rule; wait or pick another action.
    Precondition,
    /// Not enough balance, stake or weight; acquire more first.
    Resource,
    /// The token ledger rejected a call.
    Ledger,
    /// Re-entered from a ledger callback.
    Reentrancy,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::ElectionNotFound(_))
            | Self::Store(StoreError::CandidateNotFound { .. }) => ErrorKind::NotFound,
            Self::Store(StoreError::InsufficientStake { .. })
            | Self::InsufficientTokenAmount { .. }
            | Self::InsufficientTokenBalance { .. }
            | Self::InsufficientStake { .. }
            | Self::InsufficientStakedAmount { .. }
            | Self::InvalidAmount
            | Self::InvalidToken(_) => ErrorKind::Resource,
            Self::LedgerTransferFailed(_) | Self::Ledger(_) => ErrorKind::Ledger,
            Self::Reentrant => ErrorKind::Reentrancy,
            _ => ErrorKind::Precondition,
        }
    }
}
