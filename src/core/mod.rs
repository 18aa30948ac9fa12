//! Core coordination: worker pool, rendezvous queue, dispatchers and shutdown.

pub mod error;
pub mod worker_pool;
pub mod task_queue;
pub mod supervisor;
pub mod service;
pub mod events;
pub mod stats;
pub mod dispatcher;
pub mod intake;
pub mod shutdown;
pub mod facility;

pub use error::{AppResult, FacilityError, QueueClosed};
pub use worker_pool::{Worker, WorkerId, WorkerPool};
pub use task_queue::{Task, TaskId, TaskQueue};
pub use supervisor::Supervisor;
pub use service::{
    FixedServiceDuration, SequentialTaskIds, ServiceDuration, TaskIdSource, UniformServiceDuration,
};
pub use events::{EventSink, FacilityEvent, InMemoryEventSink, RecordedEvent, TracingEventSink};
pub use stats::FacilityStats;
pub use dispatcher::{spawn_dispatcher, Dispatcher, DispatcherState};
pub use intake::{spawn_intake, IntakeLoop};
pub use shutdown::{ShutdownController, ShutdownReport, ShutdownSignal};
pub use facility::Facility;
