//! Facility configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// Environment variable holding the worker count.
pub const ENV_WORKER_COUNT: &str = "TELLER_QUEUE_WORKER_COUNT";
/// Environment variable holding the shortest service interval in milliseconds.
pub const ENV_MIN_SERVICE_MS: &str = "TELLER_QUEUE_MIN_SERVICE_MS";
/// Environment variable holding the longest service interval in milliseconds.
pub const ENV_MAX_SERVICE_MS: &str = "TELLER_QUEUE_MAX_SERVICE_MS";

const DEFAULT_WORKER_COUNT: usize = 10;
const DEFAULT_MAX_SERVICE_MS: u64 = 15_000;

/// Startup parameters. Fixed for the facility's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    /// Pool capacity; also the number of dispatchers.
    pub worker_count: usize,
    /// Shortest service interval (inclusive), in milliseconds.
    pub min_service_ms: u64,
    /// Longest service interval (inclusive), in milliseconds.
    pub max_service_ms: u64,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            min_service_ms: 0,
            max_service_ms: DEFAULT_MAX_SERVICE_MS,
        }
    }
}

impl FacilityConfig {
    /// Default configuration: 10 workers, service intervals of 0 to 15 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the service interval range in milliseconds.
    #[must_use]
    pub const fn with_service_range_ms(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_service_ms = min_ms;
        self.max_service_ms = max_ms;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.min_service_ms > self.max_service_ms {
            return Err(format!(
                "min_service_ms ({}) must not exceed max_service_ms ({})",
                self.min_service_ms, self.max_service_ms
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading `.env` first if
    /// present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            cfg.worker_count = parse_var(ENV_WORKER_COUNT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIN_SERVICE_MS) {
            cfg.min_service_ms = parse_var(ENV_MIN_SERVICE_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_SERVICE_MS) {
            cfg.max_service_ms = parse_var(ENV_MAX_SERVICE_MS, &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("`{key}` is not valid ({raw:?}): {e}"))
}
