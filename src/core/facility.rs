//! A running facility: `K` dispatchers, one intake, one shutdown path.

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::core::dispatcher::{spawn_dispatcher, Dispatcher};
use crate::core::events::EventSink;
use crate::core::intake::{spawn_intake, IntakeLoop};
use crate::core::service::{ServiceDuration, TaskIdSource};
use crate::core::stats::{FacilityCounters, FacilityStats};
use crate::core::{
    FacilityError, ShutdownController, ShutdownReport, ShutdownSignal, Supervisor, TaskQueue,
    WorkerPool,
};

/// Owns the threads and shared primitives of one facility.
///
/// Dropping a facility without calling [`shutdown`](Self::shutdown) closes
/// the queue but does not wait; the threads drain and exit on their own.
pub struct Facility {
    pool: Arc<WorkerPool>,
    queue: Arc<TaskQueue>,
    signal: ShutdownSignal,
    controller: ShutdownController,
    counters: Arc<FacilityCounters>,
    dispatchers: Vec<JoinHandle<()>>,
    intake: Option<JoinHandle<u64>>,
}

impl Facility {
    /// Start `worker_count` dispatchers over a pool of `worker_count`
    /// workers, then start the intake drawing identities from `ids`.
    ///
    /// # Errors
    ///
    /// - `FacilityError::InvalidConfig` if `worker_count` is zero
    /// - `FacilityError::Spawn` if a thread cannot be created; any threads
    ///   already started are released by closing the queue
    pub fn open<S: TaskIdSource>(
        worker_count: usize,
        durations: Arc<dyn ServiceDuration>,
        events: Arc<dyn EventSink>,
        ids: S,
    ) -> Result<Self, FacilityError> {
        let pool = Arc::new(WorkerPool::new(worker_count)?);
        let queue = Arc::new(TaskQueue::new());
        let supervisor = Arc::new(Supervisor::new(worker_count));
        let signal = ShutdownSignal::new();
        let counters = Arc::new(FacilityCounters::default());

        let mut dispatchers = Vec::with_capacity(worker_count);
        for slot in 0..worker_count {
            let dispatcher = Dispatcher::new(
                slot,
                Arc::clone(&queue),
                Arc::clone(&pool),
                Arc::clone(&supervisor),
                Arc::clone(&durations),
                Arc::clone(&events),
            )
            .with_counters(Arc::clone(&counters));
            match spawn_dispatcher(dispatcher) {
                Ok(handle) => dispatchers.push(handle),
                Err(err) => {
                    queue.close();
                    return Err(err);
                }
            }
        }

        let intake = IntakeLoop::new(ids, Arc::clone(&queue), signal.clone(), Arc::clone(&events))
            .with_counters(Arc::clone(&counters));
        let intake = match spawn_intake(intake) {
            Ok(handle) => handle,
            Err(err) => {
                queue.close();
                return Err(err);
            }
        };

        let controller =
            ShutdownController::new(signal.clone(), Arc::clone(&queue), supervisor, events)
                .with_counters(Arc::clone(&counters));

        info!(worker_count, "Facility open");

        Ok(Self {
            pool,
            queue,
            signal,
            controller,
            counters,
            dispatchers,
            intake: Some(intake),
        })
    }

    /// Stop intake and block until every admitted task has been serviced and
    /// every dispatcher has exited.
    pub fn shutdown(mut self) -> ShutdownReport {
        let report = self.controller.shutdown();

        for (slot, handle) in self.dispatchers.drain(..).enumerate() {
            if handle.join().is_err() {
                warn!(dispatcher = slot, "Dispatcher thread panicked");
            }
        }
        if let Some(intake) = self.intake.take() {
            match intake.join() {
                Ok(admitted) => debug!(admitted, "Intake thread joined"),
                Err(_) => warn!("Intake thread panicked"),
            }
        }

        info!(
            admitted = report.admitted_tasks,
            serviced = report.serviced_tasks,
            drain_ms = u64::try_from(report.drain_time.as_millis()).unwrap_or(u64::MAX),
            "Facility shut down"
        );
        report
    }

    /// Current utilization.
    pub fn stats(&self) -> FacilityStats {
        let (free, busy) = self.pool.occupancy();
        self.counters.snapshot(self.pool.capacity(), free, busy)
    }

    /// Pool capacity.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.capacity()
    }

    /// Whether shutdown has begun.
    pub fn is_closing(&self) -> bool {
        self.controller.is_started()
    }
}

impl Drop for Facility {
    fn drop(&mut self) {
        if !self.controller.is_started() && self.signal.request() {
            self.queue.close();
            debug!("Facility dropped without shutdown, threads will drain detached");
        }
    }
}

impl fmt::Debug for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facility")
            .field("pool", &self.pool)
            .field("queue", &self.queue)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
