//! Run a facility until Ctrl+C or SIGTERM, then drain and exit.
//!
//! Configuration comes from the environment (and `.env`):
//! `TELLER_QUEUE_WORKER_COUNT`, `TELLER_QUEUE_MIN_SERVICE_MS`,
//! `TELLER_QUEUE_MAX_SERVICE_MS`. Log verbosity follows `RUST_LOG`.

use anyhow::anyhow;
use tracing::info;

use teller_queue::builders::FacilityBuilder;
use teller_queue::config::FacilityConfig;
use teller_queue::core::AppResult;
use teller_queue::runtime::TerminationListener;
use teller_queue::util::init_tracing;

fn main() -> AppResult<()> {
    init_tracing();

    let config = FacilityConfig::from_env().map_err(|e| anyhow!("loading configuration: {e}"))?;
    info!(
        worker_count = config.worker_count,
        min_service_ms = config.min_service_ms,
        max_service_ms = config.max_service_ms,
        "Starting facility"
    );

    // Handlers go in before any work starts so an early Ctrl+C still drains.
    let listener = TerminationListener::install()?;
    let facility = FacilityBuilder::new(config).open()?;

    let request = listener.wait();
    info!(?request, "Stopping intake");

    let report = facility.shutdown();
    info!(
        admitted = report.admitted_tasks,
        serviced = report.serviced_tasks,
        turned_away = report.turned_away_tasks,
        "Exiting"
    );
    Ok(())
}
