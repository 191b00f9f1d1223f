//! Bounded admission of concurrent game sessions.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const MIN_SESSIONS: usize = 1;
pub const MAX_SESSIONS: usize = 20;
pub const DEFAULT_MAX_SESSIONS: usize = 5;

/// Hands out at most `capacity` session slots at a time. Admission never
/// waits: when every slot is taken the caller is turned away at once.
#[derive(Clone, Debug)]
pub struct AdmissionController {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionController {
    /// Capacity is clamped to `[MIN_SESSIONS, MAX_SESSIONS]`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_SESSIONS, MAX_SESSIONS);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    pub fn try_admit(&self) -> Option<AdmissionSlot> {
        Arc::clone(&self.slots)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionSlot { _permit: permit })
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

/// A held session slot, released on drop however the session ends.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}
