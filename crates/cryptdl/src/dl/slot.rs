//! Init-once storage for process-wide bindings
//!
//! A slot is opened at most once. Opening is serialized by a mutex; once a
//! value is stored every later read is lock-free. Failures are not sticky:
//! a caller that arrives after an attempt failed tries again, while callers
//! that were already waiting on that attempt share its error.

use crate::error::CryptResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Lifecycle of a slot as seen by an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No attempt has been made yet
    Unopened,
    /// The most recent attempt failed
    Failed,
    /// A value is stored and will never be replaced
    Opened,
}

#[derive(Default)]
struct Gate {
    last_failure: Option<(u64, crate::CryptError)>,
}

/// Process-wide init-once cell
pub struct InitSlot<T> {
    ready: OnceLock<Arc<T>>,
    gate: Mutex<Gate>,
    /// Number of finished open attempts
    attempts: AtomicU64,
}

impl<T> InitSlot<T> {
    pub const fn new() -> Self {
        Self {
            ready: OnceLock::new(),
            gate: Mutex::new(Gate { last_failure: None }),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the stored value, opening it with `open` if needed.
    pub fn get_or_open<F>(&self, open: F) -> CryptResult<Arc<T>>
    where
        F: FnOnce() -> CryptResult<T>,
    {
        if let Some(value) = self.ready.get() {
            return Ok(Arc::clone(value));
        }

        let observed = self.attempts.load(Ordering::Acquire);
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = self.ready.get() {
            return Ok(Arc::clone(value));
        }

        // An attempt finished while we were waiting: report its outcome.
        if let Some((attempt, error)) = &gate.last_failure {
            if *attempt > observed {
                return Err(error.clone());
            }
        }

        let attempt = self.attempts.load(Ordering::Acquire) + 1;
        let result = open();
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                let stored = Arc::clone(self.ready.get_or_init(|| value));
                gate.last_failure = None;
                self.attempts.store(attempt, Ordering::Release);
                Ok(stored)
            }
            Err(error) => {
                gate.last_failure = Some((attempt, error.clone()));
                self.attempts.store(attempt, Ordering::Release);
                Err(error)
            }
        }
    }

    /// Stored value, if the slot is open
    pub fn get(&self) -> Option<Arc<T>> {
        self.ready.get().cloned()
    }

    pub fn state(&self) -> SlotState {
        if self.ready.get().is_some() {
            return SlotState::Opened;
        }
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if gate.last_failure.is_some() {
            SlotState::Failed
        } else {
            SlotState::Unopened
        }
    }
}

impl<T> Default for InitSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
