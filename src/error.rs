//! Error types for the Attendance and Payroll Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the failure modes that can abort an operation. Scan rejections
//! (unregistered badge, duplicate scan) are deliberately *not* errors: they
//! are ordinary [`ScanOutcome`](crate::scan::ScanOutcome) values so the UI
//! can show a transient notice and keep the reader session alive. Timestamp
//! parse failures degrade to `None` and cache write failures are swallowed,
//! so neither appears here.

use thiserror::Error;

/// The main error type for the Attendance and Payroll Engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::AttendanceError;
///
/// let error = AttendanceError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParse {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The attendance store rejected or failed an operation.
    ///
    /// Live subscriptions simply stop delivering on outage; this variant is
    /// surfaced only from the mutating and batch-read paths.
    #[error("Attendance store unavailable: {message}")]
    StoreUnavailable {
        /// A description of the store failure.
        message: String,
    },

    /// A store document could not be decoded into the expected record shape.
    #[error("Invalid record in collection '{collection}' ({id}): {message}")]
    InvalidRecord {
        /// The collection the document came from.
        collection: String,
        /// The document id.
        id: String,
        /// A description of what made the record invalid.
        message: String,
    },
}

/// A type alias for Results that return AttendanceError.
pub type AttendanceResult<T> = Result<T, AttendanceError>;
