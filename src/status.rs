//! Tagged status sum, converted at the ingestion boundary.
//!
//! The raw corpus encodes status as a free-form string ("active", "inactive",
//! and occasionally other values that must be dropped). Every downstream
//! module works on this enum instead of comparing strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    /// Parses a raw corpus string, case-insensitively. Returns `None` for
    /// anything other than "active"/"inactive" — the caller drops the sample.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Status::Active),
            "inactive" => Some(Status::Inactive),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }
}
