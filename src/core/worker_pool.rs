//! Fixed-size pool of worker identities.
//!
//! The pool behaves like a counting semaphore whose permits carry a payload:
//! [`WorkerPool::checkout`] blocks until a worker is free and hands out that
//! worker's identity, [`WorkerPool::release`] gives it back. At every instant
//! the number of free workers plus the number of checked-out workers equals
//! the pool capacity.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::core::FacilityError;

/// Worker identity. Unique within a pool and stable for the pool's lifetime.
pub type WorkerId = usize;

/// A checked-out worker.
///
/// Not `Clone`: holding a `Worker` is holding exclusive use of it, and
/// [`WorkerPool::release`] consumes it.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Worker {
    id: WorkerId,
}

impl Worker {
    /// The worker's identity.
    #[must_use]
    pub const fn id(&self) -> WorkerId {
        self.id
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker #{}", self.id)
    }
}

struct PoolState {
    /// Free identities, handed out in FIFO order.
    free: VecDeque<WorkerId>,
    /// `held[id]` is true while worker `id` is checked out.
    held: Vec<bool>,
}

/// Blocking pool of `capacity` interchangeable workers.
pub struct WorkerPool {
    capacity: usize,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl WorkerPool {
    /// Create a pool with workers `0..capacity`, all free.
    ///
    /// # Errors
    ///
    /// Returns `FacilityError::InvalidConfig` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, FacilityError> {
        if capacity == 0 {
            return Err(FacilityError::InvalidConfig(
                "worker pool capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            state: Mutex::new(PoolState {
                free: (0..capacity).collect(),
                held: vec![false; capacity],
            }),
            available: Condvar::new(),
        })
    }

    /// Block until a worker is free, then take it.
    ///
    /// No ordering is guaranteed among concurrent waiters.
    pub fn checkout(&self) -> Worker {
        let mut state = self.state.lock();
        loop {
            if let Some(id) = state.free.pop_front() {
                state.held[id] = true;
                return Worker { id };
            }
            self.available.wait(&mut state);
        }
    }

    /// Take a worker if one is free right now.
    pub fn try_checkout(&self) -> Option<Worker> {
        let mut state = self.state.lock();
        let id = state.free.pop_front()?;
        state.held[id] = true;
        Some(Worker { id })
    }

    /// Return a worker to the pool. Never blocks.
    ///
    /// # Panics
    ///
    /// Panics if `worker` is not currently checked out of this pool, which
    /// can only happen when a worker from another pool is released here.
    pub fn release(&self, worker: Worker) {
        let mut state = self.state.lock();
        match state.held.get_mut(worker.id) {
            Some(held) if *held => *held = false,
            _ => panic!("released {worker}, which is not checked out of this pool"),
        }
        state.free.push_back(worker.id);
        drop(state);
        self.available.notify_one();
    }

    /// Total number of workers.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of workers free right now.
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Number of workers checked out right now.
    pub fn checked_out_count(&self) -> usize {
        self.state.lock().held.iter().filter(|held| **held).count()
    }

    /// Free and checked-out counts read under one lock.
    pub(crate) fn occupancy(&self) -> (usize, usize) {
        let state = self.state.lock();
        let busy = state.held.iter().filter(|held| **held).count();
        (state.free.len(), busy)
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (free, busy) = self.occupancy();
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("free", &free)
            .field("checked_out", &busy)
            .finish()
    }
}
