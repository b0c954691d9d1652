//! Clock event model.
//!
//! A [`ClockEvent`] is the one persisted attendance record: born at clock-in,
//! finalized when the matching clock-out sets its `time_out`, and immutable
//! thereafter. At most one event per staff member may have a null `time_out`
//! at any instant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::Classification;
use crate::store::Document;
use crate::timeparse::{self, TimestampValue};

/// One persisted clock-in/out pair for a staff member.
///
/// Field names mirror the store's camelCase documents. The display fields
/// (`name`, `classification`) are denormalized onto attendance records by
/// the writer; they are consumed when present and tolerated when absent.
/// `time_in` is optional only to tolerate malformed documents — a record
/// written by this engine always carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockEvent {
    /// Unique identifier (the store document id).
    #[serde(skip)]
    pub id: String,
    /// The staff member this event belongs to.
    pub staff_id: String,
    /// Badge token that produced the event.
    pub badge: String,
    /// Denormalized display name, when the writer recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Denormalized classification, when the writer recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// Derived shift date as a display string. Not authoritative; used only
    /// as a last-resort ordering and payroll reference key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Clock-in instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in: Option<TimestampValue>,
    /// Clock-out instant; `None` while the shift is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<TimestampValue>,
}

impl ClockEvent {
    /// Decodes a clock event from a store document.
    pub fn from_document(doc: &Document) -> AttendanceResult<Self> {
        let mut event: ClockEvent = serde_json::from_value(doc.fields.clone()).map_err(|e| {
            AttendanceError::InvalidRecord {
                collection: "attendance".to_string(),
                id: doc.id.clone(),
                message: e.to_string(),
            }
        })?;
        event.id = doc.id.clone();
        Ok(event)
    }

    /// Returns true while the shift has no recorded clock-out.
    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }

    /// The parsed clock-in instant, if present and parseable.
    pub fn time_in_instant(&self) -> Option<DateTime<Utc>> {
        self.time_in.as_ref().and_then(timeparse::parse)
    }

    /// The parsed clock-out instant, if present and parseable.
    pub fn time_out_instant(&self) -> Option<DateTime<Utc>> {
        self.time_out.as_ref().and_then(timeparse::parse)
    }

    /// The canonical ordering instant: time-in, else time-out, else the
    /// parsed fallback date.
    pub fn canonical_instant(&self) -> Option<DateTime<Utc>> {
        self.time_in_instant()
            .or_else(|| self.time_out_instant())
            .or_else(|| {
                self.date
                    .as_ref()
                    .and_then(|d| timeparse::parse(&TimestampValue::Text(d.clone())))
            })
    }

    /// Hours between clock-in and clock-out, rounded to 2 decimal places.
    ///
    /// Returns zero when either endpoint is missing or unparseable — an open
    /// or abandoned shift has no billable duration.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::ClockEvent;
    /// use attendance_engine::timeparse::TimestampValue;
    /// use rust_decimal::Decimal;
    ///
    /// let event = ClockEvent {
    ///     id: "evt_001".to_string(),
    ///     staff_id: "stf_001".to_string(),
    ///     badge: "0009876543".to_string(),
    ///     name: None,
    ///     classification: None,
    ///     date: None,
    ///     time_in: Some(TimestampValue::Text("2024-03-26 09:00:00".to_string())),
    ///     time_out: Some(TimestampValue::Text("2024-03-26 17:00:00".to_string())),
    /// };
    /// assert_eq!(event.worked_hours(), Decimal::new(800, 2)); // 8.00
    /// ```
    pub fn worked_hours(&self) -> Decimal {
        let (time_in, time_out) = match (self.time_in_instant(), self.time_out_instant()) {
            (Some(time_in), Some(time_out)) => (time_in, time_out),
            _ => return Decimal::ZERO,
        };

        let worked_seconds = (time_out - time_in).num_seconds();
        (Decimal::new(worked_seconds, 0) / Decimal::new(3600, 0)).round_dp(2)
    }
}
