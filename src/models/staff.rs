//! Staff member model and related types.
//!
//! Staff records are created and edited by the administrative CRUD surface,
//! which is outside this core; the engine only ever reads them, keyed by
//! badge token during scan processing.

use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, AttendanceResult};
use crate::store::Document;

/// The staff classification used for rostering and payroll grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Room attendants and laundry staff.
    Housekeeping,
    /// Engineering and repair staff.
    Maintenance,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Housekeeping => write!(f, "Housekeeping"),
            Classification::Maintenance => write!(f, "Maintenance"),
        }
    }
}

/// A staff member as stored by the administrative module.
///
/// Store documents use camelCase field names; the document id is carried
/// separately from the persisted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    /// Unique identifier (the store document id).
    #[serde(skip)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Staff classification.
    pub classification: Classification,
    /// RFID badge token assigned to this staff member.
    pub badge: String,
}

impl StaffMember {
    /// Decodes a staff member from a store document.
    pub fn from_document(doc: &Document) -> AttendanceResult<Self> {
        let mut staff: StaffMember = serde_json::from_value(doc.fields.clone()).map_err(|e| {
            AttendanceError::InvalidRecord {
                collection: "staff".to_string(),
                id: doc.id.clone(),
                message: e.to_string(),
            }
        })?;
        staff.id = doc.id.clone();
        Ok(staff)
    }
}
