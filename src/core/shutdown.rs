//! Graceful shutdown: stop intake, close the queue, wait for every dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::core::events::{EventSink, FacilityEvent};
use crate::core::stats::FacilityCounters;
use crate::core::{Supervisor, TaskQueue};

/// Shared "stop producing" flag, polled by the intake without blocking.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// A signal that has not been requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` for the call that raised it first.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::AcqRel)
    }

    /// Whether the signal has been raised.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// What a completed shutdown observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Tasks handed to dispatchers over the facility's lifetime.
    pub admitted_tasks: u64,
    /// Tasks fully serviced. Equals `admitted_tasks` once drained.
    pub serviced_tasks: u64,
    /// Tasks refused because the queue had closed.
    pub turned_away_tasks: u64,
    /// Time from closing the queue to the last dispatcher draining.
    pub drain_time: Duration,
}

/// Performs the one-time shutdown sequence.
pub struct ShutdownController {
    signal: ShutdownSignal,
    queue: Arc<TaskQueue>,
    supervisor: Arc<Supervisor>,
    events: Arc<dyn EventSink>,
    counters: Arc<FacilityCounters>,
    started: AtomicBool,
}

impl ShutdownController {
    /// Create a controller over the shared primitives.
    #[must_use]
    pub fn new(
        signal: ShutdownSignal,
        queue: Arc<TaskQueue>,
        supervisor: Arc<Supervisor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            signal,
            queue,
            supervisor,
            events,
            counters: Arc::default(),
            started: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_counters(mut self, counters: Arc<FacilityCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Stop intake, close the queue and block until every dispatcher has
    /// drained. Tasks already in service, and a task already in the handoff
    /// slot, run to completion first.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn shutdown(&self) -> ShutdownReport {
        assert!(
            !self.started.swap(true, Ordering::AcqRel),
            "shutdown invoked more than once"
        );

        self.events.record(FacilityEvent::ShutdownStarted);
        self.signal.request();
        self.queue.close();
        let closed_at = Instant::now();
        debug!(outstanding = self.supervisor.outstanding(), "Queue closed, waiting for dispatchers");

        self.supervisor.wait();
        let drain_time = closed_at.elapsed();
        self.events.record(FacilityEvent::ShutdownCompleted);

        ShutdownReport {
            admitted_tasks: self.counters.admitted.load(Ordering::Relaxed),
            serviced_tasks: self.counters.serviced.load(Ordering::Relaxed),
            turned_away_tasks: self.counters.turned_away.load(Ordering::Relaxed),
            drain_time,
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been entered.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ShutdownController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownController")
            .field("signal", &self.signal)
            .field("supervisor", &self.supervisor)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::InMemoryEventSink;
    use std::thread;

    fn controller(participants: usize) -> (ShutdownController, Arc<Supervisor>, Arc<InMemoryEventSink>) {
        let supervisor = Arc::new(Supervisor::new(participants));
        let events = Arc::new(InMemoryEventSink::new(16));
        let controller = ShutdownController::new(
            ShutdownSignal::new(),
            Arc::new(TaskQueue::new()),
            Arc::clone(&supervisor),
            events.clone(),
        );
        (controller, supervisor, events)
    }

    #[test]
    fn test_signal_first_request_wins() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_requested());
        assert!(signal.request());
        assert!(!clone.request());
        assert!(clone.is_requested());
    }

    #[test]
    fn test_shutdown_waits_for_supervisor() {
        let (controller, supervisor, events) = controller(2);

        let finisher = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            supervisor.done();
            thread::sleep(Duration::from_millis(50));
            supervisor.done();
        });

        let started = Instant::now();
        let report = controller.shutdown();
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(report.drain_time >= Duration::from_millis(100));
        assert_eq!(
            events.events(),
            vec![FacilityEvent::ShutdownStarted, FacilityEvent::ShutdownCompleted]
        );
        finisher.join().unwrap();
    }

    #[test]
    fn test_shutdown_closes_queue_and_raises_signal() {
        let supervisor = Arc::new(Supervisor::new(0));
        let queue = Arc::new(TaskQueue::new());
        let signal = ShutdownSignal::new();
        let controller = ShutdownController::new(
            signal.clone(),
            Arc::clone(&queue),
            supervisor,
            Arc::new(InMemoryEventSink::new(4)),
        );

        let report = controller.shutdown();
        assert!(queue.is_closed());
        assert!(signal.is_requested());
        assert!(controller.is_started());
        assert_eq!(report.admitted_tasks, 0);
        assert_eq!(report.serviced_tasks, 0);
    }

    #[test]
    #[should_panic(expected = "shutdown invoked more than once")]
    fn test_second_shutdown_panics() {
        let (controller, _supervisor, _events) = controller(0);
        controller.shutdown();
        controller.shutdown();
    }
}
