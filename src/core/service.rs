//! External collaborators: service-duration suppliers and task-id sources.

use std::time::Duration;

use rand::Rng;

use crate::core::{Task, TaskId, Worker};

/// Supplies how long `worker` spends servicing `task`.
///
/// Implementations are treated as infallible.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use teller_queue::core::{ServiceDuration, Task, Worker};
///
/// // Closures are suppliers too.
/// let by_id = |task: &Task, _worker: &Worker| Duration::from_millis(task.id() * 10);
/// # fn assert_supplier<S: ServiceDuration>(_: &S) {}
/// # assert_supplier(&by_id);
/// ```
pub trait ServiceDuration: Send + Sync + 'static {
    /// Duration of the service interval for this pairing.
    fn duration(&self, task: &Task, worker: &Worker) -> Duration;
}

impl<F> ServiceDuration for F
where
    F: Fn(&Task, &Worker) -> Duration + Send + Sync + 'static,
{
    fn duration(&self, task: &Task, worker: &Worker) -> Duration {
        self(task, worker)
    }
}

/// Uniformly random duration in an inclusive millisecond range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformServiceDuration {
    min_ms: u64,
    max_ms: u64,
    step_ms: u64,
}

impl UniformServiceDuration {
    /// Random duration in `min_ms..=max_ms`, millisecond granularity.
    /// The bounds are swapped if given in the wrong order.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms, step_ms: 1 }
        } else {
            Self { min_ms: max_ms, max_ms: min_ms, step_ms: 1 }
        }
    }

    /// Whole seconds in `0..=max_secs`.
    #[must_use]
    pub const fn whole_seconds(max_secs: u64) -> Self {
        Self {
            min_ms: 0,
            max_ms: max_secs * 1000,
            step_ms: 1000,
        }
    }

    /// Inclusive lower bound in milliseconds.
    #[must_use]
    pub const fn min_ms(&self) -> u64 {
        self.min_ms
    }

    /// Inclusive upper bound in milliseconds.
    #[must_use]
    pub const fn max_ms(&self) -> u64 {
        self.max_ms
    }

    fn sample_ms<R: Rng>(&self, rng: &mut R) -> u64 {
        let steps = rng.random_range(self.min_ms / self.step_ms..=self.max_ms / self.step_ms);
        steps * self.step_ms
    }
}

impl ServiceDuration for UniformServiceDuration {
    fn duration(&self, _task: &Task, _worker: &Worker) -> Duration {
        Duration::from_millis(self.sample_ms(&mut rand::rng()))
    }
}

/// The same duration for every pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedServiceDuration(pub Duration);

impl ServiceDuration for FixedServiceDuration {
    fn duration(&self, _task: &Task, _worker: &Worker) -> Duration {
        self.0
    }
}

/// Infinite, non-restartable sequence of task identities.
pub trait TaskIdSource: Send + 'static {
    /// The next identity. Must be strictly greater than every earlier one.
    fn next_id(&mut self) -> TaskId;
}

/// Counts up from a starting identity.
#[derive(Debug, Default)]
pub struct SequentialTaskIds {
    next: TaskId,
}

impl SequentialTaskIds {
    /// Sequence starting at 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Sequence starting at `first`.
    #[must_use]
    pub const fn starting_at(first: TaskId) -> Self {
        Self { next: first }
    }
}

impl TaskIdSource for SequentialTaskIds {
    fn next_id(&mut self) -> TaskId {
        let id = self.next;
        self.next += 1;
        id
    }
}
