//! The payroll fold.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::PayrollSettings;
use crate::models::{ClockEvent, SalaryShift};
use crate::timeparse::{self, TimestampValue};

use super::cutoff::{cutoff_anchor, cutoff_label, payout_date};

/// Options for one payroll computation.
#[derive(Debug, Clone)]
pub struct PayrollOptions {
    /// The fixed amount a single eligible shift earns.
    pub shift_wage: Decimal,
    /// Minimum worked hours for a shift to earn the wage.
    pub min_eligible_hours: Decimal,
    /// Inclusive reference-date range to compute over. Shifts outside the
    /// range — or with no determinable reference date — are skipped.
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl PayrollOptions {
    /// Builds options from configured payroll settings, with no range filter.
    pub fn from_settings(settings: &PayrollSettings) -> Self {
        Self {
            shift_wage: settings.shift_wage,
            min_eligible_hours: settings.min_eligible_hours,
            range: None,
        }
    }
}

impl Default for PayrollOptions {
    fn default() -> Self {
        Self::from_settings(&PayrollSettings::default())
    }
}

/// Reduces one staff member's clock events into salary shifts.
///
/// Shifts are ordered by time-in ascending and folded carrying the current
/// payout-period key and a running accumulator; the accumulator resets to
/// zero whenever a shift's payout date differs from the previous one. A
/// shift earns the fixed wage only when it has a recorded clock-out and at
/// least the minimum worked hours — an abandoned shift never pays.
///
/// The engine never fails: every surviving input shift yields exactly one
/// row, and any per-shift parsing failure degrades that row to zero hours
/// and zero amount. A shift with no determinable reference date keeps the
/// current period rather than disturbing its neighbours' totals.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{ClockEvent, CutoffLabel};
/// use attendance_engine::payroll::{PayrollOptions, compute_salary_shifts};
/// use attendance_engine::timeparse::TimestampValue;
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
///
/// let shifts = compute_salary_shifts(&[event], &PayrollOptions::default());
/// assert_eq!(shifts.len(), 1);
/// assert_eq!(shifts[0].cutoff, Some(CutoffLabel::B));
/// assert_eq!(shifts[0].eligible_amount, shifts[0].running_total);
/// ```
pub fn compute_salary_shifts(events: &[ClockEvent], options: &PayrollOptions) -> Vec<SalaryShift> {
    let mut ordered: Vec<&ClockEvent> = events
        .iter()
        .filter(|event| match options.range {
            Some((start, end)) => {
                reference_date(event).is_some_and(|date| date >= start && date <= end)
            }
            None => true,
        })
        .collect();
    ordered.sort_by(|a, b| match (a.time_in_instant(), b.time_in_instant()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut current_period: Option<NaiveDate> = None;
    let mut accumulator = Decimal::ZERO;

    ordered
        .into_iter()
        .map(|event| {
            let hours_worked = event.worked_hours();
            let shift_date = reference_date(event);

            let (cutoff, payout) = match shift_date {
                Some(date) => (
                    Some(cutoff_label(date)),
                    Some(payout_date(cutoff_anchor(date))),
                ),
                None => (None, None),
            };

            if let Some(payout) = payout {
                if current_period != Some(payout) {
                    current_period = Some(payout);
                    accumulator = Decimal::ZERO;
                }
            }

            let eligible_amount = if event.time_out.is_some()
                && hours_worked >= options.min_eligible_hours
            {
                options.shift_wage
            } else {
                Decimal::ZERO
            };
            accumulator += eligible_amount;

            SalaryShift {
                shift_date,
                time_in: event.time_in_instant(),
                time_out: event.time_out_instant(),
                hours_worked,
                eligible_amount,
                cutoff,
                payout_date: payout,
                running_total: accumulator,
            }
        })
        .collect()
}

/// The shift's reference date: the time-in date, else the parsed fallback
/// date field.
fn reference_date(event: &ClockEvent) -> Option<NaiveDate> {
    event
        .time_in_instant()
        .map(|instant| instant.date_naive())
        .or_else(|| {
            event
                .date
                .as_ref()
                .and_then(|date| timeparse::parse(&TimestampValue::Text(date.clone())))
                .map(|instant| instant.date_naive())
        })
}
