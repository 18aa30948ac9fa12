//! Error types for facility setup and queue operations.

use std::fmt;

use thiserror::Error;

/// Errors produced while assembling or running a facility.
///
/// Usage violations (releasing a worker that is not checked out, closing the
/// queue twice, shutting down twice) are not represented here: they panic.
#[derive(Debug, Error)]
pub enum FacilityError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An OS thread could not be spawned.
    #[error("failed to spawn thread `{name}`: {source}")]
    Spawn {
        /// Name of the thread that failed to start.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The termination signal handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Returned by [`TaskQueue::send`](crate::core::TaskQueue::send) when the
/// queue was closed before the value could be handed off. The refused value
/// is given back to the caller.
#[derive(PartialEq, Eq, Error)]
#[error("task queue is closed")]
pub struct QueueClosed<T>(pub T);

impl<T> QueueClosed<T> {
    /// Recover the value that was refused.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = FacilityError::InvalidConfig("worker_count must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: worker_count must be greater than 0"
        );
    }

    #[test]
    fn test_spawn_error_display() {
        let err = FacilityError::Spawn {
            name: "tq-dispatcher-3".into(),
            source: std::io::Error::other("out of threads"),
        };
        assert_eq!(
            err.to_string(),
            "failed to spawn thread `tq-dispatcher-3`: out of threads"
        );
    }

    #[test]
    fn test_queue_closed_returns_value() {
        let err = QueueClosed(7_u64);
        assert_eq!(err.to_string(), "task queue is closed");
        assert_eq!(format!("{err:?}"), "QueueClosed(..)");
        assert_eq!(err.into_inner(), 7);
    }
}
