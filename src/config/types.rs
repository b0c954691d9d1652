//! Configuration types.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Badge scanner thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Maximum pause between keystrokes of one token, in milliseconds.
    #[serde(default = "default_inter_key_gap_ms")]
    pub inter_key_gap_ms: u64,
    /// Minimum accepted badge token length, in characters.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Per-badge window within which a repeat scan is rejected, in seconds.
    #[serde(default = "default_duplicate_window_secs")]
    pub duplicate_window_secs: u64,
}

impl ScanSettings {
    /// The inter-keystroke gap as a std duration, for timers.
    pub fn inter_key_gap(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.inter_key_gap_ms)
    }

    /// The duplicate-scan window as a chrono duration, for instant math.
    pub fn duplicate_window(&self) -> Duration {
        Duration::seconds(self.duplicate_window_secs as i64)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            inter_key_gap_ms: default_inter_key_gap_ms(),
            min_token_len: default_min_token_len(),
            duplicate_window_secs: default_duplicate_window_secs(),
        }
    }
}

/// Attendance status thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSettings {
    /// Hours after which an open shift is shown off duty as a forgotten
    /// clock-out. Nothing ever closes such a shift; it simply stops
    /// counting.
    #[serde(default = "default_abandoned_after_hours")]
    pub abandoned_after_hours: i64,
}

impl AttendanceSettings {
    /// The abandoned-shift window as a chrono duration.
    pub fn abandoned_after(&self) -> Duration {
        Duration::hours(self.abandoned_after_hours)
    }
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            abandoned_after_hours: default_abandoned_after_hours(),
        }
    }
}

/// Payroll amounts and eligibility thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollSettings {
    /// The fixed amount a single eligible shift earns.
    #[serde(default = "default_shift_wage")]
    pub shift_wage: Decimal,
    /// Minimum worked hours for a shift to earn the wage.
    #[serde(default = "default_min_eligible_hours")]
    pub min_eligible_hours: Decimal,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        Self {
            shift_wage: default_shift_wage(),
            min_eligible_hours: default_min_eligible_hours(),
        }
    }
}

/// Change-feed defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Default page limit for live windows and paged reads.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

/// The full engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Badge scanner thresholds.
    #[serde(default)]
    pub scan: ScanSettings,
    /// Attendance status thresholds.
    #[serde(default)]
    pub attendance: AttendanceSettings,
    /// Payroll amounts and eligibility thresholds.
    #[serde(default)]
    pub payroll: PayrollSettings,
    /// Change-feed defaults.
    #[serde(default)]
    pub feed: FeedSettings,
}

fn default_inter_key_gap_ms() -> u64 {
    100
}

fn default_min_token_len() -> usize {
    10
}

fn default_duplicate_window_secs() -> u64 {
    5
}

fn default_abandoned_after_hours() -> i64 {
    12
}

fn default_shift_wage() -> Decimal {
    Decimal::new(35000, 2) // 350.00
}

fn default_min_eligible_hours() -> Decimal {
    Decimal::ONE
}

fn default_page_limit() -> usize {
    25
}
