//! Fundamental types for the ballot engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, token ids, timestamps and the clock, voting policies, and the
//! time-derived election phase machine.

pub mod address;
pub mod election;
pub mod time;

pub use address::{Address, TokenId};
pub use election::{ElectionId, Phase, Schedule, ScheduleError, TimeRemaining, VotingType};
pub use time::{Clock, SystemClock, Timestamp};
