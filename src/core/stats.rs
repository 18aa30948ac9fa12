//! Facility statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of facility utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacilityStats {
    /// Pool capacity.
    pub worker_count: usize,
    /// Workers free right now.
    pub free_workers: usize,
    /// Workers checked out right now.
    pub busy_workers: usize,
    /// Tasks handed to a dispatcher.
    pub admitted_tasks: u64,
    /// Tasks whose service interval has ended.
    pub serviced_tasks: u64,
    /// Tasks refused because the queue had closed.
    pub turned_away_tasks: u64,
}

/// Lock-free counters shared by intake and dispatchers.
///
/// `admitted` and `serviced` are both bumped by dispatchers, so once every
/// dispatcher has drained they agree.
#[derive(Debug, Default)]
pub(crate) struct FacilityCounters {
    pub admitted: AtomicU64,
    pub serviced: AtomicU64,
    pub turned_away: AtomicU64,
}

impl FacilityCounters {
    /// Combine the counters with pool occupancy.
    pub fn snapshot(&self, worker_count: usize, free: usize, busy: usize) -> FacilityStats {
        FacilityStats {
            worker_count,
            free_workers: free,
            busy_workers: busy,
            admitted_tasks: self.admitted.load(Ordering::Relaxed),
            serviced_tasks: self.serviced.load(Ordering::Relaxed),
            turned_away_tasks: self.turned_away.load(Ordering::Relaxed),
        }
    }
}
