//! Intake: creates tasks and offers them to the queue until shutdown.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::core::events::{EventSink, FacilityEvent};
use crate::core::service::TaskIdSource;
use crate::core::stats::FacilityCounters;
use crate::core::{FacilityError, QueueClosed, ShutdownSignal, Task, TaskQueue};

/// Producer side of the facility.
///
/// Before creating each task the loop polls the shutdown signal without
/// blocking. The send itself blocks until a dispatcher takes the task; if the
/// queue closes first the task is turned away and the loop ends.
pub struct IntakeLoop<S> {
    ids: S,
    queue: Arc<TaskQueue>,
    signal: ShutdownSignal,
    events: Arc<dyn EventSink>,
    counters: Arc<FacilityCounters>,
}

impl<S: TaskIdSource> IntakeLoop<S> {
    /// Create an intake drawing identities from `ids`.
    #[must_use]
    pub fn new(
        ids: S,
        queue: Arc<TaskQueue>,
        signal: ShutdownSignal,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            ids,
            queue,
            signal,
            events,
            counters: Arc::default(),
        }
    }

    pub(crate) fn with_counters(mut self, counters: Arc<FacilityCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Produce tasks until shutdown. Returns how many were handed off.
    pub fn run(mut self) -> u64 {
        let mut admitted = 0;
        while !self.signal.is_requested() {
            let task = Task::new(self.ids.next_id());
            let id = task.id();
            self.events.record(FacilityEvent::TaskWaiting { task: id });

            match self.queue.send(task) {
                Ok(()) => admitted += 1,
                Err(QueueClosed(_)) => {
                    self.events.record(FacilityEvent::TaskTurnedAway { task: id });
                    self.counters.turned_away.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        }
        debug!(admitted, "Intake stopped");
        admitted
    }
}

impl<S> fmt::Debug for IntakeLoop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakeLoop")
            .field("queue", &self.queue)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

/// Run `intake` on its own named thread. The handle yields the number of
/// tasks handed off.
///
/// # Errors
///
/// Returns `FacilityError::Spawn` if the thread cannot be created.
pub fn spawn_intake<S: TaskIdSource>(intake: IntakeLoop<S>) -> Result<JoinHandle<u64>, FacilityError> {
    let name = "tq-intake".to_string();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || intake.run())
        .map_err(|source| FacilityError::Spawn { name, source })
}
