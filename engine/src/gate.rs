//! Single-writer gate with re-entry detection.
//!
//! Every mutating operation holds the gate for its whole duration, including
//! calls out to the token ledger, so mutations are linearizable. A thread that
//! already holds the gate (a ledger callback or event listener calling back in)
//! is turned away with [`EngineError::Reentrant`] instead of deadlocking.
//!
//! Re-entry is keyed on the calling thread. A callback that hands a mutation
//! to another thread and waits for it will block on the gate instead.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::error::EngineError;

#[derive(Default)]
pub(crate) struct WriterGate {
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

pub(crate) struct WriterGuard<'a> {
    gate: &'a WriterGate,
    _held: MutexGuard<'a, ()>,
}

impl WriterGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn enter(&self) -> Result<WriterGuard<'_>, EngineError> {
        let me = thread::current().id();
        if *self.owner() == Some(me) {
            return Err(EngineError::Reentrant);
        }
        let held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.owner() = Some(me);
        Ok(WriterGuard { gate: self, _held: held })
    }
}

impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        // Runs before `_held` is released.
        *self.gate.owner() = None;
    }
}
