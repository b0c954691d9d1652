//! End-to-end tests for the attendance pipeline.
//!
//! This suite runs the whole flow over the in-memory store: badge scans
//! become clock events, the shared change feed broadcasts them to multiple
//! observers, and the payroll engine reduces the resulting history into
//! salary shifts with cutoff grouping and running totals.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use attendance_engine::config::EngineConfig;
use attendance_engine::feed::{FeedOptions, FeedRegistry, FeedSubscription, FeedUpdate};
use attendance_engine::models::{
    ClockEvent, ClockLogView, CutoffLabel, DutyStatus, derive_status,
};
use attendance_engine::payroll::{PayrollOptions, compute_salary_shifts};
use attendance_engine::scan::{ScanIngestor, ScanOutcome, ScanRejection};
use attendance_engine::store::{AttendanceStore, MemoryCache, MemoryStore};

// =============================================================================
// Test Helpers
// =============================================================================

fn at(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, h, m, s).unwrap()
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        "staff",
        "stf_001",
        json!({
            "name": "Maria Santos",
            "classification": "housekeeping",
            "badge": "AB12AB12AB"
        }),
    );
    store.seed(
        "staff",
        "stf_002",
        json!({
            "name": "Jun Reyes",
            "classification": "maintenance",
            "badge": "CD34CD34CD"
        }),
    );
    store
}

fn ingestor(store: &MemoryStore) -> ScanIngestor {
    ScanIngestor::new(Arc::new(store.clone()), EngineConfig::default().scan)
}

fn registry(store: &MemoryStore) -> FeedRegistry {
    FeedRegistry::new(Arc::new(store.clone()), Arc::new(MemoryCache::new()))
}

async fn attendance_events(store: &MemoryStore, staff_id: &str) -> Vec<ClockEvent> {
    store
        .get_by_field("attendance", "staffId", staff_id)
        .await
        .unwrap()
        .iter()
        .map(|doc| ClockEvent::from_document(doc).unwrap())
        .collect()
}

async fn recv(subscription: &mut FeedSubscription) -> FeedUpdate {
    tokio::time::timeout(std::time::Duration::from_secs(1), subscription.updates.recv())
        .await
        .expect("timed out waiting for feed update")
        .expect("feed channel closed")
}

// =============================================================================
// Scan → store → payroll scenarios
// =============================================================================

/// A full working day: clock in at 09:00, out at 17:00 — 8.00 hours, the
/// unit wage, off duty afterwards.
#[tokio::test]
async fn test_full_day_shift() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    let morning = ingestor.process_token("AB12AB12AB", at(26, 9, 0, 0)).await.unwrap();
    assert!(matches!(morning, ScanOutcome::ClockedIn { .. }));

    let evening = ingestor.process_token("AB12AB12AB", at(26, 17, 0, 0)).await.unwrap();
    assert!(matches!(evening, ScanOutcome::ClockedOut { .. }));

    let events = attendance_events(&store, "stf_001").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].worked_hours(), Decimal::new(800, 2));

    let config = EngineConfig::default();
    let view = ClockLogView::project(
        &events[0],
        at(26, 17, 0, 1),
        config.attendance.abandoned_after(),
    );
    assert_eq!(view.status, DutyStatus::OffDuty);
    assert_eq!(view.name, "Maria Santos");

    let shifts = compute_salary_shifts(&events, &PayrollOptions::default());
    assert_eq!(shifts[0].hours_worked, Decimal::new(800, 2));
    assert_eq!(shifts[0].eligible_amount, config.payroll.shift_wage);
}

/// A rescan two seconds after clock-in is rejected; no second event exists.
#[tokio::test]
async fn test_duplicate_scan_creates_no_second_event() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    ingestor.process_token("AB12AB12AB", at(26, 9, 0, 0)).await.unwrap();
    let rescan = ingestor.process_token("AB12AB12AB", at(26, 9, 0, 2)).await.unwrap();
    assert_eq!(
        rescan,
        ScanOutcome::Rejected(ScanRejection::DuplicateScan {
            badge: "AB12AB12AB".to_string()
        })
    );

    assert_eq!(attendance_events(&store, "stf_001").await.len(), 1);
}

/// A forgotten clock-out: queried 25 hours later the shift shows off duty
/// and earns nothing.
#[tokio::test]
async fn test_forgotten_clock_out() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    ingestor.process_token("CD34CD34CD", at(26, 8, 0, 0)).await.unwrap();

    let events = attendance_events(&store, "stf_002").await;
    let config = EngineConfig::default();
    let next_morning = at(27, 9, 0, 0);
    assert_eq!(
        derive_status(
            events[0].time_in_instant(),
            events[0].time_out_instant(),
            next_morning,
            config.attendance.abandoned_after(),
        ),
        DutyStatus::OffDuty
    );

    let shifts = compute_salary_shifts(&events, &PayrollOptions::default());
    assert_eq!(shifts[0].eligible_amount, Decimal::ZERO);
    assert_eq!(shifts[0].running_total, Decimal::ZERO);
}

/// An unknown badge is rejected and writes nothing.
#[tokio::test]
async fn test_unknown_badge_leaves_store_untouched() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    let outcome = ingestor.process_token("ZZ99ZZ99ZZ", at(26, 9, 0, 0)).await.unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Rejected(ScanRejection::BadgeNotRegistered {
            badge: "ZZ99ZZ99ZZ".to_string()
        })
    );

    assert!(attendance_events(&store, "stf_001").await.is_empty());
    assert!(attendance_events(&store, "stf_002").await.is_empty());
}

/// The toggle keeps at most one open event per staff member within a day.
#[tokio::test]
async fn test_at_most_one_open_event_per_staff() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    for (hour, minute) in [(8, 0), (12, 0), (12, 30), (17, 0)] {
        ingestor
            .process_token("AB12AB12AB", at(26, hour, minute, 0))
            .await
            .unwrap();
    }

    let events = attendance_events(&store, "stf_001").await;
    let open_count = events.iter().filter(|event| event.is_open()).count();
    assert!(open_count <= 1);
    // Four accepted scans toggled twice: two completed shifts.
    assert_eq!(events.len(), 2);
    assert_eq!(open_count, 0);
}

// =============================================================================
// Live feed over real scans
// =============================================================================

/// Two observers of the clock-event feed both see the scan-produced deltas,
/// through a single underlying subscription.
#[tokio::test]
async fn test_feed_observers_see_scans_live() {
    let store = seeded_store();
    let registry = registry(&store);
    let mut ingestor = ingestor(&store);

    let mut dashboard = registry.subscribe("attendance", FeedOptions::default());
    let mut wall_display = registry.subscribe("attendance", FeedOptions::default());
    assert_eq!(store.subscriber_count("attendance"), 1);

    assert!(matches!(recv(&mut dashboard).await, FeedUpdate::Snapshot { .. }));
    assert!(matches!(recv(&mut wall_display).await, FeedUpdate::Snapshot { .. }));

    ingestor.process_token("AB12AB12AB", at(26, 9, 0, 0)).await.unwrap();

    for surface in [&mut dashboard, &mut wall_display] {
        loop {
            match recv(surface).await {
                FeedUpdate::Delta { added, items, .. } if !added.is_empty() => {
                    assert_eq!(items.len(), 1);
                    let event = ClockEvent::from_document(&items[0]).unwrap();
                    assert_eq!(event.staff_id, "stf_001");
                    assert!(event.is_open());
                    break;
                }
                _ => continue,
            }
        }
    }

    dashboard.handle.close();
    assert_eq!(store.subscriber_count("attendance"), 1);
    wall_display.handle.close();
    assert_eq!(store.subscriber_count("attendance"), 0);
}

/// Clock-log rows regenerate from the feed's materialized list.
#[tokio::test]
async fn test_clock_log_projection_from_feed() {
    let store = seeded_store();
    let registry = registry(&store);
    let mut ingestor = ingestor(&store);

    ingestor.process_token("AB12AB12AB", at(26, 9, 0, 0)).await.unwrap();
    ingestor.process_token("CD34CD34CD", at(26, 10, 0, 0)).await.unwrap();

    let mut subscription = registry.subscribe("attendance", FeedOptions::default());
    let _snapshot = recv(&mut subscription).await;
    let update = recv(&mut subscription).await;

    let config = EngineConfig::default();
    let now = at(26, 10, 30, 0);
    let rows: Vec<ClockLogView> = update
        .items()
        .iter()
        .filter_map(|doc| ClockEvent::from_document(doc).ok())
        .map(|event| ClockLogView::project(&event, now, config.attendance.abandoned_after()))
        .collect();

    // Most recent clock-in first.
    assert_eq!(rows[0].name, "Jun Reyes");
    assert_eq!(rows[1].name, "Maria Santos");
    assert!(rows.iter().all(|row| row.status == DutyStatus::OnDuty));
}

// =============================================================================
// Payroll over a multi-week history
// =============================================================================

/// A two-cutoff month: totals accumulate within each payout period and
/// reset at the boundary.
#[tokio::test]
async fn test_payroll_over_scanned_month() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    // Three shifts in cutoff A, two in cutoff B.
    for day in [12, 13, 14, 18, 19] {
        ingestor.process_token("AB12AB12AB", at(day, 9, 0, 0)).await.unwrap();
        ingestor.process_token("AB12AB12AB", at(day, 17, 0, 0)).await.unwrap();
    }

    let events = attendance_events(&store, "stf_001").await;
    assert_eq!(events.len(), 5);

    let options = PayrollOptions::default();
    let shifts = compute_salary_shifts(&events, &options);
    let wage = options.shift_wage;

    assert_eq!(shifts[0].cutoff, Some(CutoffLabel::A));
    assert_eq!(shifts[2].cutoff, Some(CutoffLabel::A));
    assert_eq!(shifts[2].running_total, wage * Decimal::from(3));
    assert_eq!(shifts[3].cutoff, Some(CutoffLabel::B));
    assert_eq!(shifts[3].running_total, wage);
    assert_eq!(shifts[4].running_total, wage * Decimal::TWO);

    // Cutoff A of March 2024 pays on Saturday the 16th, cutoff B on April 6th.
    assert_eq!(shifts[0].payout_date, NaiveDate::from_ymd_opt(2024, 3, 16));
    assert_eq!(shifts[4].payout_date, NaiveDate::from_ymd_opt(2024, 4, 6));
}

/// The date-range filter narrows payroll to one cutoff.
#[tokio::test]
async fn test_payroll_range_filter() {
    let store = seeded_store();
    let mut ingestor = ingestor(&store);

    for day in [10, 20] {
        ingestor.process_token("AB12AB12AB", at(day, 9, 0, 0)).await.unwrap();
        ingestor.process_token("AB12AB12AB", at(day, 17, 0, 0)).await.unwrap();
    }

    let events = attendance_events(&store, "stf_001").await;
    let options = PayrollOptions {
        range: Some((
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )),
        ..PayrollOptions::default()
    };
    let shifts = compute_salary_shifts(&events, &options);

    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].cutoff, Some(CutoffLabel::A));
}

// =============================================================================
// Degradation paths
// =============================================================================

/// During a store outage, live surfaces keep their last snapshot and the
/// scan session reports the failure without corrupting state.
#[tokio::test]
async fn test_outage_degrades_gracefully() {
    let store = seeded_store();
    let registry = registry(&store);
    let mut ingestor = ingestor(&store);

    ingestor.process_token("AB12AB12AB", at(26, 9, 0, 0)).await.unwrap();

    let mut subscription = registry.subscribe("attendance", FeedOptions::default());
    let _snapshot = recv(&mut subscription).await;
    let delta = recv(&mut subscription).await;
    assert_eq!(delta.items().len(), 1);

    store.set_offline(true);
    assert!(ingestor.process_token("CD34CD34CD", at(26, 9, 5, 0)).await.is_err());

    // Back online, the same session keeps working.
    store.set_offline(false);
    let outcome = ingestor.process_token("CD34CD34CD", at(26, 9, 10, 0)).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::ClockedIn { .. }));
}

/// Status derivation is total across a sweep of nows and field shapes.
#[test]
fn test_status_total_over_field_combinations() {
    let window = Duration::hours(12);
    let time_in = Utc.with_ymd_and_hms(2024, 3, 26, 9, 0, 0).unwrap();
    let time_out = Utc.with_ymd_and_hms(2024, 3, 26, 17, 0, 0).unwrap();

    for hours_later in 0..48 {
        let now = time_in + Duration::hours(hours_later);
        for (t_in, t_out) in [
            (Some(time_in), Some(time_out)),
            (Some(time_in), None),
            (None, Some(time_out)),
            (None, None),
        ] {
            let status = derive_status(t_in, t_out, now, window);
            assert!(matches!(status, DutyStatus::OnDuty | DutyStatus::OffDuty));
        }
    }
}
