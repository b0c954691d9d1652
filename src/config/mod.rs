//! Engine configuration.
//!
//! Deployment-tunable thresholds for the scan, attendance, payroll, and feed
//! components, loaded from a YAML file. Every field has a default carrying
//! the engine's observed behavior, so an empty file (or no file-backed
//! config at all) yields a working engine.

mod loader;
mod types;

pub use types::{
    AttendanceSettings, EngineConfig, FeedSettings, PayrollSettings, ScanSettings,
};
