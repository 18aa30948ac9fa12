//! Configuration models for the facility.

pub mod facility;

pub use facility::{FacilityConfig, ENV_MAX_SERVICE_MS, ENV_MIN_SERVICE_MS, ENV_WORKER_COUNT};
