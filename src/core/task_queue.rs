//! Zero-capacity handoff queue between intake and dispatchers.
//!
//! A send completes only once some receiver has taken the task, so at most
//! one task is ever "in transit". Closing the queue stops new sends; a task
//! already sitting in the handoff slot is still delivered before receivers
//! observe closure.

use std::fmt;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::core::QueueClosed;

/// Task identity, assigned in increasing order by the intake.
pub type TaskId = u64;

/// A unit of arriving work. Not `Clone`: a task is consumed exactly once.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Task {
    id: TaskId,
}

impl Task {
    /// Create a task with the given identity.
    #[must_use]
    pub const fn new(id: TaskId) -> Self {
        Self { id }
    }

    /// The task's identity.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{}", self.id)
    }
}

struct QueueState {
    /// The single in-transit task, if any.
    slot: Option<Task>,
    closed: bool,
    /// Number of tasks taken out of the slot so far.
    delivered: u64,
}

/// Rendezvous queue of [`Task`]s.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    /// Signalled when a task lands in the slot or the queue closes.
    offered: Condvar,
    /// Signalled when the slot is emptied or the queue closes.
    taken: Condvar,
}

impl TaskQueue {
    /// Create an open, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                slot: None,
                closed: false,
                delivered: 0,
            }),
            offered: Condvar::new(),
            taken: Condvar::new(),
        }
    }

    /// Hand `task` to a receiver, blocking until one takes it.
    ///
    /// # Errors
    ///
    /// Returns the task inside [`QueueClosed`] if the queue was closed before
    /// the task reached the handoff slot. Once in the slot, the task is
    /// delivered even if the queue closes meanwhile.
    pub fn send(&self, task: Task) -> Result<(), QueueClosed<Task>> {
        let mut state = self.state.lock();
        while state.slot.is_some() && !state.closed {
            self.taken.wait(&mut state);
        }
        if state.closed {
            return Err(QueueClosed(task));
        }

        let ticket = state.delivered;
        state.slot = Some(task);
        self.offered.notify_one();

        while state.delivered == ticket {
            self.taken.wait(&mut state);
        }
        Ok(())
    }

    /// Take the next task, blocking until one is offered.
    ///
    /// Returns `None` once the queue is closed and the slot is empty.
    pub fn recv(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.slot.take() {
                state.delivered += 1;
                drop(state);
                self.taken.notify_all();
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.offered.wait(&mut state);
        }
    }

    /// Stop accepting sends and wake every blocked receiver.
    ///
    /// # Panics
    ///
    /// Panics if the queue is already closed.
    pub fn close(&self) {
        let mut state = self.state.lock();
        assert!(!state.closed, "task queue closed twice");
        state.closed = true;
        drop(state);
        self.offered.notify_all();
        self.taken.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether a task is sitting in the handoff slot.
    pub fn in_transit(&self) -> bool {
        self.state.lock().slot.is_some()
    }

    /// Total tasks handed to receivers.
    pub fn delivered(&self) -> u64 {
        self.state.lock().delivered
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TaskQueue")
            .field("in_transit", &state.slot.as_ref().map(Task::id))
            .field("closed", &state.closed)
            .field("delivered", &state.delivered)
            .finish()
    }
}
