//! Domain events emitted by mutating operations.

use std::sync::Arc;

use ballot_types::{Address, ElectionId, Timestamp, TokenId, VotingType};
use serde::{Deserialize, Serialize};

/// What happened. Each variant carries the key fields of its operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElectionEvent {
    ElectionCreated {
        election: ElectionId,
        creator: Address,
        title: String,
        voting_type: VotingType,
    },
    CandidateRegistered {
        election: ElectionId,
        candidate: Address,
        name: String,
    },
    VoteCast {
        election: ElectionId,
        voter: Address,
        candidate: Address,
        weight: u128,
    },
    TokensStaked {
        voter: Address,
        token: TokenId,
        amount: u128,
        /// Stake after the operation.
        total: u128,
    },
    TokensUnstaked {
        voter: Address,
        token: TokenId,
        amount: u128,
        /// Stake after the operation.
        remaining: u128,
    },
}

/// An event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1; strictly increasing in completion order.
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event: ElectionEvent,
}

/// Append-only event log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ElectionEvent, timestamp: Timestamp) -> EventRecord {
        let record = EventRecord {
            sequence: self.records.len() as u64 + 1,
            timestamp,
            event,
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence > after`.
    pub fn since(&self, after: u64) -> &[EventRecord] {
        let start = usize::try_from(after)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Listener callback registered on an [`EventBus`].
pub type Listener = Arc<dyn Fn(&EventRecord) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the emitting thread after the state change is
/// committed, while the engine's writer gate is still held; keep handlers fast.
/// A listener that calls back into a mutating engine operation gets
/// [`EngineError::Reentrant`](crate::EngineError::Reentrant).
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&EventRecord) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn emit(&self, record: &EventRecord) {
        for listener in &self.listeners {
            listener(record);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
