//! Countdown latch tracking outstanding dispatchers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Completion barrier: opens once `participants` calls to [`done`](Self::done)
/// have been made.
///
/// The count itself is atomic; the mutex only orders the final notification
/// against a waiter checking the count, so no wakeup is lost.
#[derive(Debug)]
pub struct Supervisor {
    outstanding: AtomicUsize,
    lock: Mutex<()>,
    drained: Condvar,
}

impl Supervisor {
    /// Create a barrier expecting `participants` completions.
    #[must_use]
    pub fn new(participants: usize) -> Self {
        Self {
            outstanding: AtomicUsize::new(participants),
            lock: Mutex::new(()),
            drained: Condvar::new(),
        }
    }

    /// Signal that one participant has finished.
    ///
    /// # Panics
    ///
    /// Panics if called more times than there are participants.
    pub fn done(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or_else(|_| panic!("supervisor signalled more times than it has participants"));
        if previous == 1 {
            let _guard = self.lock.lock();
            self.drained.notify_all();
        }
    }

    /// Block until every participant has signalled.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while self.outstanding.load(Ordering::Acquire) > 0 {
            self.drained.wait(&mut guard);
        }
    }

    /// Block until every participant has signalled or `timeout` elapses.
    /// Returns `true` if the barrier opened.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while self.outstanding.load(Ordering::Acquire) > 0 {
            if self.drained.wait_until(&mut guard, deadline).timed_out() {
                return self.outstanding.load(Ordering::Acquire) == 0;
            }
        }
        true
    }

    /// Participants that have not signalled yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}
