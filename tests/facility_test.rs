//! End-to-end tests for a running facility.
//!
//! These tests drive real threads with deterministic service durations and
//! check the observable event log:
//! - Two workers, three tasks, shutdown while the third is still waiting
//! - One worker never services two tasks at once
//! - Capacity and exactly-once service under sustained load
//! - Report counts agree even when shutdown follows open immediately

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use teller_queue::builders::FacilityBuilder;
use teller_queue::config::FacilityConfig;
use teller_queue::core::{
    FacilityEvent, FixedServiceDuration, InMemoryEventSink, Task, TaskId, Worker,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn wait_for(events: &InMemoryEventSink, event: FacilityEvent, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !events.contains(event) {
        assert!(Instant::now() < deadline, "timed out waiting for {event:?}");
        thread::sleep(Duration::from_millis(2));
    }
}

fn position(events: &[FacilityEvent], wanted: impl Fn(&FacilityEvent) -> bool) -> usize {
    events
        .iter()
        .position(wanted)
        .unwrap_or_else(|| panic!("event not found in {events:?}"))
}

fn matched_counts(events: &[FacilityEvent]) -> HashMap<TaskId, usize> {
    let mut counts = HashMap::new();
    for event in events {
        if let FacilityEvent::TaskMatched { task, .. } = event {
            *counts.entry(*task).or_insert(0) += 1;
        }
    }
    counts
}

/// Walk the log and return the largest number of tasks in service at once.
fn max_in_service(events: &[FacilityEvent]) -> usize {
    let mut current = 0_usize;
    let mut max = 0;
    for event in events {
        match event {
            FacilityEvent::TaskMatched { .. } => {
                current += 1;
                max = max.max(current);
            }
            FacilityEvent::ServiceCompleted { .. } => current -= 1,
            _ => {}
        }
    }
    max
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_two_workers_third_task_served_during_shutdown() {
    let events = Arc::new(InMemoryEventSink::new(1024));
    let durations = |task: &Task, _: &Worker| match task.id() {
        0 | 1 => Duration::from_millis(300),
        _ => Duration::from_millis(100),
    };

    let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(2))
        .service_duration(durations)
        .event_sink(events.clone())
        .open()
        .unwrap();

    wait_for(&events, FacilityEvent::TaskWaiting { task: 2 }, Duration::from_secs(2));
    thread::sleep(Duration::from_millis(30));

    // Both workers are busy; task 2 is in the handoff slot, unmatched.
    let snapshot = events.events();
    assert!(!matched_counts(&snapshot).contains_key(&2));
    assert_eq!(facility.stats().busy_workers, 2);

    let started = Instant::now();
    let report = facility.shutdown();
    let waited = started.elapsed();

    let log = events.events();
    assert_eq!(matched_counts(&log).get(&2), Some(&1));

    let first_free = position(&log, |e| {
        matches!(e, FacilityEvent::ServiceCompleted { task: 0 | 1, .. })
    });
    let t2_matched = position(&log, |e| matches!(e, FacilityEvent::TaskMatched { task: 2, .. }));
    let t2_done = position(&log, |e| matches!(e, FacilityEvent::ServiceCompleted { task: 2, .. }));
    let completed = position(&log, |e| *e == FacilityEvent::ShutdownCompleted);

    assert!(first_free < t2_matched, "task 2 waited for a free worker");
    assert!(t2_done < completed, "completion only after task 2's service");
    assert_eq!(completed, log.len() - 1, "completion is the last event");
    assert!(log.iter().all(|e| e.task() != Some(3)), "no fourth task: {log:?}");

    assert_eq!(report.admitted_tasks, 3);
    assert_eq!(report.serviced_tasks, 3);
    assert_eq!(report.turned_away_tasks, 0);
    assert!(waited >= Duration::from_millis(200), "shutdown returned after {waited:?}");
}

#[test]
fn test_single_worker_never_overlaps() {
    let events = Arc::new(InMemoryEventSink::new(1024));
    let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(1))
        .service_duration(FixedServiceDuration(Duration::from_millis(80)))
        .event_sink(events.clone())
        .open()
        .unwrap();

    wait_for(
        &events,
        FacilityEvent::TaskMatched { task: 1, worker: 0 },
        Duration::from_secs(2),
    );
    let report = facility.shutdown();

    let recorded = events.recorded();
    let at = |wanted: FacilityEvent| {
        recorded
            .iter()
            .find(|r| r.event == wanted)
            .map(|r| r.at)
            .unwrap_or_else(|| panic!("{wanted:?} not recorded"))
    };

    let t0_start = at(FacilityEvent::TaskMatched { task: 0, worker: 0 });
    let t0_end = at(FacilityEvent::ServiceCompleted { task: 0, worker: 0 });
    let t1_start = at(FacilityEvent::TaskMatched { task: 1, worker: 0 });

    assert!(t0_end <= t1_start);
    assert!(t1_start.duration_since(t0_start) >= Duration::from_millis(80));
    assert_eq!(max_in_service(&events.events()), 1);
    assert_eq!(report.admitted_tasks, report.serviced_tasks);
}

#[test]
fn test_sustained_load_keeps_capacity_and_serves_once() {
    let events = Arc::new(InMemoryEventSink::new(100_000));
    let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(3))
        .service_duration(FixedServiceDuration(Duration::from_millis(3)))
        .event_sink(events.clone())
        .open()
        .unwrap();

    let deadline = Instant::now() + Duration::from_millis(200);
    while Instant::now() < deadline {
        let stats = facility.stats();
        assert_eq!(stats.worker_count, 3);
        assert_eq!(stats.free_workers + stats.busy_workers, 3);
        thread::sleep(Duration::from_millis(1));
    }

    let report = facility.shutdown();
    let log = events.events();

    assert!(report.admitted_tasks > 0);
    assert_eq!(report.admitted_tasks, report.serviced_tasks);
    assert!(max_in_service(&log) <= 3);

    let counts = matched_counts(&log);
    assert!(counts.values().all(|&n| n == 1), "a task was served twice");

    // Identities are handed out in order with no gaps.
    let admitted: Vec<TaskId> = (0..report.admitted_tasks).collect();
    let mut served: Vec<TaskId> = counts.keys().copied().collect();
    served.sort_unstable();
    assert_eq!(served, admitted);
}

#[test]
fn test_report_counts_agree_after_quick_shutdowns() {
    let mismatches: Vec<_> = (0..400)
        .filter_map(|round| {
            let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(1))
                .service_duration(FixedServiceDuration(Duration::ZERO))
                .event_sink(Arc::new(InMemoryEventSink::new(16)))
                .open()
                .unwrap();
            thread::sleep(Duration::from_micros(200));
            let report = facility.shutdown();
            (report.admitted_tasks != report.serviced_tasks).then_some((
                round,
                report.admitted_tasks,
                report.serviced_tasks,
            ))
        })
        .collect();
    assert!(mismatches.is_empty(), "admitted != serviced: {mismatches:?}");
}

#[test]
fn test_accessors_and_first_event() {
    let events = Arc::new(InMemoryEventSink::new(256));
    let facility = FacilityBuilder::new(FacilityConfig::new().with_worker_count(4))
        .service_duration(FixedServiceDuration(Duration::from_millis(10)))
        .event_sink(events.clone())
        .open()
        .unwrap();

    assert_eq!(facility.worker_count(), 4);
    assert!(!facility.is_closing());
    wait_for(
        &events,
        FacilityEvent::TaskWaiting { task: 4 },
        Duration::from_secs(2),
    );

    let report = facility.shutdown();
    assert!(report.serviced_tasks >= 4);
    assert_eq!(
        events.events().first(),
        Some(&FacilityEvent::TaskWaiting { task: 0 })
    );
}
