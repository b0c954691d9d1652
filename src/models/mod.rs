//! Core data models for the Attendance and Payroll Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod clock_event;
mod log_view;
mod salary_shift;
mod staff;

pub use clock_event::ClockEvent;
pub use log_view::{ClockLogView, DutyStatus, derive_status};
pub use salary_shift::{CutoffLabel, SalaryShift};
pub use staff::{Classification, StaffMember};
