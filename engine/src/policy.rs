//! Vote-weight rules for each voting type.

use ballot_store::Election;
use ballot_types::{TokenId, VotingType};

use crate::error::EngineError;

/// What has to back a vote's weight once the weight itself is acceptable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WeightBacking {
    /// Unweighted vote; nothing to check.
    Unweighted,
    /// The voter's live ledger balance must cover the weight. Nothing moves.
    Balance(TokenId),
    /// The voter's stake must cover the weight, and is debited by it.
    Stake(TokenId),
}

/// Validate `weight` against the election's policy and minimum.
///
/// Token-based policies require a non-zero weight of at least
/// `min_token_required`.
pub fn check_weight(election: &Election, weight: u128) -> Result<WeightBacking, EngineError> {
    let token = || {
        election
            .token
            .clone()
            .ok_or_else(|| EngineError::InvalidToken(TokenId::new("")))
    };
    match election.voting_type {
        VotingType::OneVotePerAddress => {
            if weight != 0 {
                return Err(EngineError::UnexpectedWeight(weight));
            }
            Ok(WeightBacking::Unweighted)
        }
        VotingType::TokenWeighted => {
            check_minimum(weight, election.min_token_required)?;
            Ok(WeightBacking::Balance(token()?))
        }
        VotingType::StakedVoting => {
            check_minimum(weight, election.min_token_required)?;
            Ok(WeightBacking::Stake(token()?))
        }
    }
}

fn check_minimum(weight: u128, minimum: u128) -> Result<(), EngineError> {
    if weight == 0 || weight < minimum {
        return Err(EngineError::InsufficientTokenAmount { weight, minimum });
    }
    Ok(())
}
