//! Election lifecycle engine.
//!
//! Elections move through Not Started → Registration → Voting → Ended purely
//! as a function of time. Candidates register during the registration window;
//! voters cast one ballot each during the voting window under one of three
//! policies:
//!
//! - `OneVotePerAddress`: every ballot counts once, weight must be zero.
//! - `TokenWeighted`: weight backed by the voter's live ledger balance.
//! - `StakedVoting`: weight paid out of tokens staked with the engine.
//!
//! Tokens are staked into and withdrawn from a custody account on an
//! external [`TokenLedger`](ballot_token::TokenLedger).

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
mod gate;
pub mod policy;
pub mod results;
pub mod spans;

pub use config::{ConfigError, EngineConfig};
pub use engine::ElectionEngine;
pub use error::{EngineError, ErrorKind};
pub use events::{ElectionEvent, EventBus, EventLog, EventRecord, Listener};
pub use policy::WeightBacking;
pub use results::{CandidateResult, VoteTotals};
