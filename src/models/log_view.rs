//! Derived clock-log rows for live attendance surfaces.
//!
//! [`ClockLogView`] is not persisted: it is recomputed from a [`ClockEvent`]
//! plus "now" on every change-feed delta. The duty status derivation is a
//! pure, total function so every present/absent field combination maps to
//! exactly one status.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Classification, ClockEvent};

/// Derived presence status. Not a stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    /// Clocked in within the abandoned-shift window.
    OnDuty,
    /// Completed, abandoned, or absent.
    OffDuty,
}

impl std::fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DutyStatus::OnDuty => write!(f, "On-Duty"),
            DutyStatus::OffDuty => write!(f, "Off-Duty"),
        }
    }
}

/// Derives the duty status for a clock event.
///
/// A shift with both endpoints is complete; a shift with only a clock-in is
/// on duty until `abandoned_after` has elapsed, after which it is treated as
/// a forgotten clock-out and shown off duty. The function is total: any
/// combination of present/absent endpoints and any `now` yields a status.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{derive_status, DutyStatus};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let nine = Utc.with_ymd_and_hms(2024, 3, 26, 9, 0, 0).unwrap();
/// let noon = Utc.with_ymd_and_hms(2024, 3, 26, 12, 0, 0).unwrap();
/// let window = Duration::hours(12);
///
/// assert_eq!(derive_status(Some(nine), None, noon, window), DutyStatus::OnDuty);
/// assert_eq!(derive_status(Some(nine), Some(noon), noon, window), DutyStatus::OffDuty);
/// ```
pub fn derive_status(
    time_in: Option<DateTime<Utc>>,
    time_out: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    abandoned_after: Duration,
) -> DutyStatus {
    match (time_in, time_out) {
        (Some(_), Some(_)) => DutyStatus::OffDuty,
        (Some(time_in), None) if now - time_in <= abandoned_after => DutyStatus::OnDuty,
        _ => DutyStatus::OffDuty,
    }
}

/// One formatted row of the live clock log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockLogView {
    /// The underlying clock event id.
    pub id: String,
    /// Staff display name; falls back to the badge token when the writer
    /// recorded no name.
    pub name: String,
    /// Staff classification, when recorded.
    pub classification: Option<Classification>,
    /// Formatted shift date.
    pub date: String,
    /// Formatted clock-in time, empty when unknown.
    pub time_in: String,
    /// Formatted clock-out time, empty while the shift is open.
    pub time_out: String,
    /// Derived presence status.
    pub status: DutyStatus,
    /// Hours worked so far (zero while open).
    pub hours_worked: Decimal,
}

impl ClockLogView {
    /// Projects a clock event into a display row.
    pub fn project(event: &ClockEvent, now: DateTime<Utc>, abandoned_after: Duration) -> Self {
        let time_in = event.time_in_instant();
        let time_out = event.time_out_instant();

        let date = time_in
            .map(|t| t.format("%d %b %Y").to_string())
            .or_else(|| event.date.clone())
            .unwrap_or_default();

        ClockLogView {
            id: event.id.clone(),
            name: event.name.clone().unwrap_or_else(|| event.badge.clone()),
            classification: event.classification,
            date,
            time_in: time_in.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
            time_out: time_out.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
            status: derive_status(time_in, time_out, now, abandoned_after),
            hours_worked: event.worked_hours(),
        }
    }
}
