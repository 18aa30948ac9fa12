//! Lifecycle events and the sinks that report them.
//!
//! Every lifecycle event is recorded exactly once per occurrence. The default
//! sink writes one `tracing` line per event; the in-memory sink keeps a
//! bounded history for tests and inspection.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::core::{TaskId, WorkerId};

/// Something observable happened in the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FacilityEvent {
    /// A task was created and is about to be offered to the queue.
    ///
    /// If shutdown closes the queue before the offer lands, the same task is
    /// followed by [`TaskTurnedAway`](Self::TaskTurnedAway) and never serviced.
    TaskWaiting {
        /// Task identity.
        task: TaskId,
    },
    /// A dispatcher matched a task with a worker; service begins.
    TaskMatched {
        /// Task identity.
        task: TaskId,
        /// Worker identity.
        worker: WorkerId,
    },
    /// The service interval ended and the worker is about to be released.
    ServiceCompleted {
        /// Task identity.
        task: TaskId,
        /// Worker identity.
        worker: WorkerId,
    },
    /// The queue closed before the task could be handed off.
    TaskTurnedAway {
        /// Task identity.
        task: TaskId,
    },
    /// Intake is stopping and the queue is about to close.
    ShutdownStarted,
    /// Every dispatcher has drained.
    ShutdownCompleted,
}

impl FacilityEvent {
    /// The task this event concerns, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskId> {
        match self {
            Self::TaskWaiting { task }
            | Self::TaskMatched { task, .. }
            | Self::ServiceCompleted { task, .. }
            | Self::TaskTurnedAway { task } => Some(*task),
            Self::ShutdownStarted | Self::ShutdownCompleted => None,
        }
    }

    /// The worker this event concerns, if any.
    #[must_use]
    pub const fn worker(&self) -> Option<WorkerId> {
        match self {
            Self::TaskMatched { worker, .. } | Self::ServiceCompleted { worker, .. } => {
                Some(*worker)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FacilityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskWaiting { task } => write!(f, "Task #{task} is waiting..."),
            Self::TaskMatched { task, worker } => {
                write!(f, "Task #{task} is served by worker #{worker}")
            }
            Self::ServiceCompleted { task, worker } => {
                write!(f, "Task #{task} is done by worker #{worker}")
            }
            Self::TaskTurnedAway { task } => {
                write!(f, "Task #{task} was turned away, the queue is closed")
            }
            Self::ShutdownStarted => {
                f.write_str("The facility is preparing to close. Stopping the queue...")
            }
            Self::ShutdownCompleted => f.write_str("Thank you, the facility is now closed."),
        }
    }
}

/// Receives lifecycle events. Called from dispatcher, intake and shutdown
/// threads concurrently.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: FacilityEvent);
}

/// Writes each event as one `tracing` info line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: FacilityEvent) {
        info!(
            task = event.task(),
            worker = event.worker(),
            "{event}"
        );
    }
}

/// An event together with when it was recorded.
#[derive(Debug, Clone, Copy)]
pub struct RecordedEvent {
    /// The event.
    pub event: FacilityEvent,
    /// When the sink received it.
    pub at: Instant,
}

/// In-memory sink with a bounded buffer; the oldest events are dropped first.
#[derive(Debug)]
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<RecordedEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events` events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(4096))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<FacilityEvent> {
        self.events.lock().iter().map(|r| r.event).collect()
    }

    /// Snapshot of stored events with their timestamps.
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().iter().copied().collect()
    }

    /// Position of the first stored event equal to `event`.
    pub fn position(&self, event: FacilityEvent) -> Option<usize> {
        self.events.lock().iter().position(|r| r.event == event)
    }

    /// Whether `event` has been recorded.
    pub fn contains(&self, event: FacilityEvent) -> bool {
        self.position(event).is_some()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: FacilityEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(RecordedEvent {
            event,
            at: Instant::now(),
        });
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn record(&self, event: FacilityEvent) {
        (**self).record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lines() {
        assert_eq!(
            FacilityEvent::TaskWaiting { task: 3 }.to_string(),
            "Task #3 is waiting..."
        );
        assert_eq!(
            FacilityEvent::TaskMatched { task: 3, worker: 1 }.to_string(),
            "Task #3 is served by worker #1"
        );
        assert_eq!(
            FacilityEvent::ServiceCompleted { task: 3, worker: 1 }.to_string(),
            "Task #3 is done by worker #1"
        );
        assert_eq!(
            FacilityEvent::ShutdownCompleted.to_string(),
            "Thank you, the facility is now closed."
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&FacilityEvent::TaskMatched { task: 5, worker: 2 }).unwrap();
        assert_eq!(json, r#"{"event":"task_matched","task":5,"worker":2}"#);

        let json = serde_json::to_string(&FacilityEvent::ShutdownStarted).unwrap();
        assert_eq!(json, r#"{"event":"shutdown_started"}"#);
    }

    #[test]
    fn test_task_and_worker_accessors() {
        let event = FacilityEvent::ServiceCompleted { task: 8, worker: 0 };
        assert_eq!(event.task(), Some(8));
        assert_eq!(event.worker(), Some(0));
        assert_eq!(FacilityEvent::TaskTurnedAway { task: 2 }.worker(), None);
        assert_eq!(FacilityEvent::ShutdownStarted.task(), None);
    }

    #[test]
    fn test_in_memory_sink_is_bounded() {
        let sink = InMemoryEventSink::new(2);
        sink.record(FacilityEvent::TaskWaiting { task: 0 });
        sink.record(FacilityEvent::TaskWaiting { task: 1 });
        sink.record(FacilityEvent::TaskWaiting { task: 2 });

        assert_eq!(
            sink.events(),
            vec![
                FacilityEvent::TaskWaiting { task: 1 },
                FacilityEvent::TaskWaiting { task: 2 },
            ]
        );
        assert!(!sink.contains(FacilityEvent::TaskWaiting { task: 0 }));
        assert_eq!(sink.position(FacilityEvent::TaskWaiting { task: 2 }), Some(1));
    }

    #[test]
    fn test_recorded_timestamps_are_ordered() {
        let sink = InMemoryEventSink::new(8);
        sink.record(FacilityEvent::ShutdownStarted);
        sink.record(FacilityEvent::ShutdownCompleted);
        let recorded = sink.recorded();
        assert!(recorded[0].at <= recorded[1].at);
    }
}
