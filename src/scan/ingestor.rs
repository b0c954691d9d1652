//! Scan resolution: badge token → clock-in / clock-out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ScanSettings;
use crate::error::AttendanceResult;
use crate::models::{ClockEvent, StaffMember};
use crate::store::AttendanceStore;

/// Collection holding staff records.
const STAFF_COLLECTION: &str = "staff";
/// Collection holding clock events.
const ATTENDANCE_COLLECTION: &str = "attendance";

/// Why a scan was rejected. These are result values, not errors: the UI
/// shows a transient notice and the reader session keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRejection {
    /// The badge token matched no staff member.
    BadgeNotRegistered {
        /// The unmatched token.
        badge: String,
    },
    /// The same badge was accepted moments ago.
    DuplicateScan {
        /// The repeated token.
        badge: String,
    },
}

impl std::fmt::Display for ScanRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanRejection::BadgeNotRegistered { badge } => {
                write!(f, "badge {badge} is not registered")
            }
            ScanRejection::DuplicateScan { badge } => {
                write!(f, "badge {badge} scanned too fast")
            }
        }
    }
}

/// The result of resolving one badge token.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// A new shift was opened.
    ClockedIn {
        /// The staff member who clocked in.
        staff: StaffMember,
        /// Id of the created clock event.
        event_id: String,
    },
    /// The open shift was completed.
    ClockedOut {
        /// The staff member who clocked out.
        staff: StaffMember,
        /// Id of the updated clock event.
        event_id: String,
    },
    /// The scan was rejected; nothing was written.
    Rejected(ScanRejection),
}

/// Resolves badge tokens into clock events.
///
/// One ingestor serves one reader session. Scans are processed strictly one
/// at a time — [`process_token`](Self::process_token) holds the session
/// between its open-shift lookup and the write, so a scan arriving mid-flight
/// queues behind it rather than racing it. Scans for different staff members
/// on different sessions may interleave freely.
pub struct ScanIngestor {
    store: Arc<dyn AttendanceStore>,
    settings: ScanSettings,
    assembler: super::TokenAssembler,
    /// Per-badge instant of the last accepted scan.
    recent_scans: HashMap<String, DateTime<Utc>>,
}

impl ScanIngestor {
    /// Creates an ingestor for one reader session.
    pub fn new(store: Arc<dyn AttendanceStore>, settings: ScanSettings) -> Self {
        let assembler = super::TokenAssembler::new(
            chrono::Duration::milliseconds(settings.inter_key_gap_ms as i64),
            settings.min_token_len,
        );
        Self {
            store,
            settings,
            assembler,
            recent_scans: HashMap::new(),
        }
    }

    /// Feeds one keystroke. Returns an outcome when the keystroke completed
    /// a valid token and the token resolved.
    pub async fn push_key(
        &mut self,
        key: super::ScanKey,
        at: DateTime<Utc>,
    ) -> AttendanceResult<Option<ScanOutcome>> {
        match self.assembler.push_key(key, at) {
            Some(token) => self.process_token(&token, at).await.map(Some),
            None => Ok(None),
        }
    }

    /// Closes a pause-terminated token. Returns an outcome if a valid token
    /// was pending.
    pub async fn flush(&mut self, at: DateTime<Utc>) -> AttendanceResult<Option<ScanOutcome>> {
        match self.assembler.flush() {
            Some(token) => self.process_token(&token, at).await.map(Some),
            None => Ok(None),
        }
    }

    /// Resolves one badge token at the given instant.
    ///
    /// Rejections come back as [`ScanOutcome::Rejected`]; only store
    /// failures are errors, and they leave no partial state behind.
    pub async fn process_token(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<ScanOutcome> {
        // Duplicate guard, keyed per badge. Only accepted scans arm it.
        let window = self.settings.duplicate_window();
        self.recent_scans.retain(|_, accepted| now - *accepted < window);
        if self.recent_scans.contains_key(token) {
            warn!(badge = token, "duplicate scan rejected");
            return Ok(ScanOutcome::Rejected(ScanRejection::DuplicateScan {
                badge: token.to_string(),
            }));
        }

        let staff_docs = self
            .store
            .get_by_field(STAFF_COLLECTION, "badge", token)
            .await?;
        let Some(staff) = staff_docs.first().map(StaffMember::from_document).transpose()? else {
            warn!(badge = token, "unregistered badge rejected");
            return Ok(ScanOutcome::Rejected(ScanRejection::BadgeNotRegistered {
                badge: token.to_string(),
            }));
        };

        let outcome = match self.open_event_today(&staff.id, now).await? {
            None => {
                let fields = json!({
                    "staffId": staff.id.clone(),
                    "badge": staff.badge.clone(),
                    "name": staff.name.clone(),
                    "classification": staff.classification,
                    "date": now.format("%d %B %Y").to_string(),
                    "timeIn": {
                        "seconds": now.timestamp(),
                        "nanos": now.timestamp_subsec_nanos(),
                    },
                });
                let event_id = self.store.create(ATTENDANCE_COLLECTION, fields).await?;
                info!(staff = %staff.name, event_id, "clocked in");
                ScanOutcome::ClockedIn { staff, event_id }
            }
            Some(open) => {
                let patch = json!({
                    "timeOut": {
                        "seconds": now.timestamp(),
                        "nanos": now.timestamp_subsec_nanos(),
                    },
                });
                self.store
                    .update(ATTENDANCE_COLLECTION, &open.id, patch)
                    .await?;
                info!(staff = %staff.name, event_id = %open.id, "clocked out");
                ScanOutcome::ClockedOut {
                    staff,
                    event_id: open.id,
                }
            }
        };

        self.recent_scans.insert(token.to_string(), now);
        Ok(outcome)
    }

    /// Today's open clock event for a staff member, if any.
    ///
    /// "Today" is the calendar date of `now`; an abandoned open event from a
    /// previous day does not count and is left untouched.
    async fn open_event_today(
        &self,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Option<ClockEvent>> {
        let today = now.date_naive();
        let docs = self
            .store
            .get_by_field(ATTENDANCE_COLLECTION, "staffId", staff_id)
            .await?;
        Ok(docs
            .iter()
            .filter_map(|doc| ClockEvent::from_document(doc).ok())
            .find(|event| {
                event.is_open()
                    && event
                        .canonical_instant()
                        .map(|instant| instant.date_naive() == today)
                        .unwrap_or(false)
            }))
    }

    /// Drives a live reader session.
    ///
    /// Keystrokes arrive on `keys`; outcomes (and store errors) go out on
    /// `outcomes`. While a token is accumulating, the inter-key gap doubles
    /// as the debounce timer — each keystroke implicitly resets it, and its
    /// expiry closes the token. The loop processes one scan at a time;
    /// keystrokes arriving mid-resolution queue in the channel.
    pub async fn run(
        mut self,
        mut keys: mpsc::Receiver<super::ScanKey>,
        outcomes: mpsc::Sender<AttendanceResult<ScanOutcome>>,
    ) {
        let gap = self.settings.inter_key_gap();
        loop {
            let key = if self.assembler.is_accumulating() {
                match tokio::time::timeout(gap, keys.recv()).await {
                    Ok(Some(key)) => Some(key),
                    Ok(None) => {
                        // Reader disconnected; close out any pending token.
                        if let Some(result) = self.flush(Utc::now()).await.transpose() {
                            let _ = outcomes.send(result).await;
                        }
                        return;
                    }
                    Err(_) => None, // pause fired
                }
            } else {
                match keys.recv().await {
                    Some(key) => Some(key),
                    None => return,
                }
            };

            let now = Utc::now();
            let result = match key {
                Some(key) => self.push_key(key, now).await,
                None => self.flush(now).await,
            };
            if let Some(result) = result.transpose() {
                if outcomes.send(result).await.is_err() {
                    return;
                }
            }
        }
    }
}
