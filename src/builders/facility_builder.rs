//! Builder to assemble a running facility from configuration.

use std::sync::Arc;

use crate::config::FacilityConfig;
use crate::core::{
    EventSink, Facility, FacilityError, SequentialTaskIds, ServiceDuration, TaskIdSource,
    TracingEventSink, UniformServiceDuration,
};

/// Collects configuration and collaborators, then opens a [`Facility`].
///
/// Without overrides, service intervals are drawn uniformly from the
/// configured range and events are written to `tracing`.
pub struct FacilityBuilder {
    config: FacilityConfig,
    durations: Option<Arc<dyn ServiceDuration>>,
    events: Option<Arc<dyn EventSink>>,
}

impl FacilityBuilder {
    /// Start from `config`.
    #[must_use]
    pub fn new(config: FacilityConfig) -> Self {
        Self {
            config,
            durations: None,
            events: None,
        }
    }

    /// Supply service intervals from `durations` instead of the configured range.
    #[must_use]
    pub fn service_duration(mut self, durations: impl ServiceDuration) -> Self {
        self.durations = Some(Arc::new(durations));
        self
    }

    /// Report lifecycle events to `events`.
    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate and open, numbering tasks from 0.
    ///
    /// # Errors
    ///
    /// Returns `FacilityError::InvalidConfig` if the configuration is invalid,
    /// or `FacilityError::Spawn` if a thread cannot be started.
    pub fn open(self) -> Result<Facility, FacilityError> {
        self.open_with_ids(SequentialTaskIds::new())
    }

    /// Validate and open, drawing task identities from `ids`.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_ids<S: TaskIdSource>(self, ids: S) -> Result<Facility, FacilityError> {
        self.config
            .validate()
            .map_err(|e| FacilityError::InvalidConfig(format!("config invalid: {e}")))?;

        let durations: Arc<dyn ServiceDuration> = match self.durations {
            Some(durations) => durations,
            None => Arc::new(UniformServiceDuration::new(
                self.config.min_service_ms,
                self.config.max_service_ms,
            )),
        };
        let events: Arc<dyn EventSink> = match self.events {
            Some(events) => events,
            None => Arc::new(TracingEventSink),
        };

        Facility::open(self.config.worker_count, durations, events, ids)
    }
}
