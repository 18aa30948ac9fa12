//! # Teller Queue
//!
//! A bounded-capacity service facility: a fixed pool of interchangeable
//! workers services an unbounded stream of arriving tasks, and the facility
//! shuts down gracefully, refusing new arrivals while letting in-flight and
//! already-handed-off work finish.
//!
//! ## Moving Parts
//!
//! - **`WorkerPool`**: counting semaphore whose permits are worker identities
//! - **`TaskQueue`**: zero-capacity rendezvous channel; at most one task in transit
//! - **`Dispatcher`**: one per pool slot; receive, check out, service, release
//! - **`Supervisor`**: countdown latch signalled by each dispatcher on exit
//! - **`IntakeLoop`**: creates tasks and offers them until shutdown is requested
//! - **`ShutdownController`**: closes the queue and waits for the drain
//!
//! ```text
//! IntakeLoop -> TaskQueue -> N x Dispatcher <-> WorkerPool
//! ShutdownController -> close(TaskQueue), wait(Supervisor) <- Dispatcher exit
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use teller_queue::builders::FacilityBuilder;
//! use teller_queue::config::FacilityConfig;
//! use teller_queue::core::{FixedServiceDuration, InMemoryEventSink};
//!
//! let events = Arc::new(InMemoryEventSink::new(1024));
//! let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(2))
//!     .service_duration(FixedServiceDuration(Duration::from_millis(20)))
//!     .event_sink(events.clone())
//!     .open()?;
//!
//! std::thread::sleep(Duration::from_millis(100));
//! let report = facility.shutdown();
//! assert_eq!(report.admitted_tasks, report.serviced_tasks);
//! # Ok::<(), teller_queue::core::FacilityError>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core coordination primitives and the facility that wires them.
pub mod core;
/// Configuration models.
pub mod config;
/// Builders to construct facilities from configuration.
pub mod builders;
/// Runtime adapters for environment termination signals.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
