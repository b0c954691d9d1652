//! Salary shift model.
//!
//! A [`SalaryShift`] is a pure projection computed by the payroll engine
//! from one staff member's ordered clock events. It is never written back
//! to the store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The bi-monthly payroll grouping: first or second half of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CutoffLabel {
    /// Days 1–15 of the month.
    A,
    /// Day 16 through the end of the month.
    B,
}

impl std::fmt::Display for CutoffLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutoffLabel::A => write!(f, "A"),
            CutoffLabel::B => write!(f, "B"),
        }
    }
}

/// One payroll row for one clock event.
///
/// `cutoff` and `payout_date` are absent only when the shift carried no
/// usable reference date at all; such rows contribute nothing and do not
/// disturb the running period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryShift {
    /// The shift's reference date, when one could be determined.
    pub shift_date: Option<NaiveDate>,
    /// Parsed clock-in instant.
    pub time_in: Option<DateTime<Utc>>,
    /// Parsed clock-out instant.
    pub time_out: Option<DateTime<Utc>>,
    /// Hours worked, rounded to 2 decimal places.
    pub hours_worked: Decimal,
    /// The fixed unit wage if the shift was eligible, otherwise zero.
    pub eligible_amount: Decimal,
    /// Which half of the month the shift falls in.
    pub cutoff: Option<CutoffLabel>,
    /// First Saturday on or after the cutoff anchor; the payout period key.
    pub payout_date: Option<NaiveDate>,
    /// Accumulated eligible amount for the payout period, including this shift.
    pub running_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_label_display() {
        assert_eq!(CutoffLabel::A.to_string(), "A");
        assert_eq!(CutoffLabel::B.to_string(), "B");
    }

    #[test]
    fn test_salary_shift_serialization_round_trip() {
        let shift = SalaryShift {
            shift_date: NaiveDate::from_ymd_opt(2024, 3, 26),
            time_in: None,
            time_out: None,
            hours_worked: Decimal::new(800, 2),
            eligible_amount: Decimal::new(35000, 2),
            cutoff: Some(CutoffLabel::B),
            payout_date: NaiveDate::from_ymd_opt(2024, 4, 6),
            running_total: Decimal::new(35000, 2),
        };

        let json = serde_json::to_string(&shift).unwrap();
        let back: SalaryShift = serde_json::from_str(&json).unwrap();
        assert_eq!(shift, back);
    }
}
