//! Payroll reduction over clock events.
//!
//! This module turns one staff member's ordered shift history into
//! [`SalaryShift`](crate::models::SalaryShift) rows: per-shift hours and
//! eligibility, bi-monthly cutoff assignment, payout dates, and a running
//! total that resets at payout-period boundaries. The engine is a pure
//! fold — it never touches the store and never fails, degrading anomalous
//! shifts to zero-valued rows instead.

mod cutoff;
mod engine;

pub use cutoff::{cutoff_anchor, cutoff_label, payout_date};
pub use engine::{PayrollOptions, compute_salary_shifts};
