//! Cutoff period and payout date rules.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::CutoffLabel;

/// Assigns a date to its bi-monthly cutoff.
///
/// Days 1–15 fall in cutoff A, the rest of the month in cutoff B.
///
/// # Example
///
/// ```
/// use attendance_engine::models::CutoffLabel;
/// use attendance_engine::payroll::cutoff_label;
/// use chrono::NaiveDate;
///
/// let tenth = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// let twentieth = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
/// assert_eq!(cutoff_label(tenth), CutoffLabel::A);
/// assert_eq!(cutoff_label(twentieth), CutoffLabel::B);
/// ```
pub fn cutoff_label(date: NaiveDate) -> CutoffLabel {
    if date.day() <= 15 {
        CutoffLabel::A
    } else {
        CutoffLabel::B
    }
}

/// The cutoff anchor for a date: the 15th of its month for cutoff A, the
/// last calendar day of its month for cutoff B.
pub fn cutoff_anchor(date: NaiveDate) -> NaiveDate {
    match cutoff_label(date) {
        CutoffLabel::A => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 15).unwrap_or(date)
        }
        CutoffLabel::B => last_day_of_month(date),
    }
}

/// The first Saturday on or after the cutoff anchor. Payout dates double as
/// the grouping key for running period totals.
///
/// # Example
///
/// ```
/// use attendance_engine::payroll::payout_date;
/// use chrono::NaiveDate;
///
/// // 2024-03-15 is a Friday; payday is Saturday the 16th.
/// let anchor = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(payout_date(anchor), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
/// ```
pub fn payout_date(anchor: NaiveDate) -> NaiveDate {
    let saturday = Weekday::Sat.num_days_from_monday();
    let weekday = anchor.weekday().num_days_from_monday();
    let days_ahead = (saturday + 7 - weekday) % 7;
    anchor + Duration::days(days_ahead as i64)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}
