//! Dispatcher: takes tasks off the queue and services each with a pooled worker.
//!
//! Each dispatcher is an explicit state machine:
//!
//! ```text
//! AwaitingTask --recv task--> ServicingTask --release--> AwaitingTask
//! AwaitingTask --queue closed and empty--> Drained
//! ```
//!
//! Entering `Drained` signals the [`Supervisor`] exactly once.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::core::events::{EventSink, FacilityEvent};
use crate::core::service::ServiceDuration;
use crate::core::stats::FacilityCounters;
use crate::core::{FacilityError, Supervisor, Task, TaskQueue, WorkerPool};

/// Where a dispatcher is in its lifecycle.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatcherState {
    /// Blocked on the queue.
    AwaitingTask,
    /// Holding a task that still needs a worker and a service interval.
    ServicingTask(Task),
    /// The queue closed and drained. Terminal.
    Drained,
}

/// One consumer of the task queue.
pub struct Dispatcher {
    slot: usize,
    queue: Arc<TaskQueue>,
    pool: Arc<WorkerPool>,
    supervisor: Arc<Supervisor>,
    durations: Arc<dyn ServiceDuration>,
    events: Arc<dyn EventSink>,
    counters: Arc<FacilityCounters>,
}

impl Dispatcher {
    /// Create dispatcher number `slot` over the shared primitives.
    #[must_use]
    pub fn new(
        slot: usize,
        queue: Arc<TaskQueue>,
        pool: Arc<WorkerPool>,
        supervisor: Arc<Supervisor>,
        durations: Arc<dyn ServiceDuration>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            slot,
            queue,
            pool,
            supervisor,
            durations,
            events,
            counters: Arc::default(),
        }
    }

    pub(crate) fn with_counters(mut self, counters: Arc<FacilityCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Perform one transition.
    pub fn step(&self, state: DispatcherState) -> DispatcherState {
        match state {
            DispatcherState::AwaitingTask => match self.queue.recv() {
                Some(task) => {
                    // Admission is counted at handoff, before this dispatcher can drain.
                    self.counters.admitted.fetch_add(1, Ordering::Relaxed);
                    DispatcherState::ServicingTask(task)
                }
                None => {
                    debug!(dispatcher = self.slot, "Queue closed and drained");
                    self.supervisor.done();
                    DispatcherState::Drained
                }
            },
            DispatcherState::ServicingTask(task) => {
                self.service(task);
                DispatcherState::AwaitingTask
            }
            DispatcherState::Drained => DispatcherState::Drained,
        }
    }

    /// Run until drained.
    pub fn run(self) {
        let mut state = DispatcherState::AwaitingTask;
        while state != DispatcherState::Drained {
            state = self.step(state);
        }
    }

    /// Check out a worker, hold it for the supplied interval, release it.
    fn service(&self, task: Task) {
        let worker = self.pool.checkout();
        self.events.record(FacilityEvent::TaskMatched {
            task: task.id(),
            worker: worker.id(),
        });

        // The worker stays held for the whole interval.
        let interval = self.durations.duration(&task, &worker);
        thread::sleep(interval);

        self.events.record(FacilityEvent::ServiceCompleted {
            task: task.id(),
            worker: worker.id(),
        });
        self.counters.serviced.fetch_add(1, Ordering::Relaxed);
        self.pool.release(worker);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("slot", &self.slot)
            .field("queue", &self.queue)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

/// Run `dispatcher` on its own named thread.
///
/// # Errors
///
/// Returns `FacilityError::Spawn` if the thread cannot be created.
pub fn spawn_dispatcher(dispatcher: Dispatcher) -> Result<JoinHandle<()>, FacilityError> {
    let name = format!("tq-dispatcher-{}", dispatcher.slot);
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            debug!(dispatcher = dispatcher.slot, "Dispatcher thread started");
            dispatcher.run();
        })
        .map_err(|source| FacilityError::Spawn { name, source })
}
