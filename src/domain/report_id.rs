//! Type-safe report identifiers.
//!
//! [`ReportId`] and [`SpamReportId`] are newtype wrappers around
//! [`uuid::Uuid`] (v4) so the two report row identities cannot be confused
//! with each other or with chat-event UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a livestream report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ReportId(uuid::Uuid);

impl ReportId {
    /// Creates a new random `ReportId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `ReportId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ReportId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ReportId> for uuid::Uuid {
    fn from(id: ReportId) -> Self {
        id.0
    }
}

/// Unique identifier for a spam report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SpamReportId(uuid::Uuid);

impl SpamReportId {
    /// Creates a new random `SpamReportId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `SpamReportId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SpamReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpamReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for SpamReportId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SpamReportId> for uuid::Uuid {
    fn from(id: SpamReportId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(ReportId::new(), ReportId::new());
        assert_ne!(SpamReportId::new(), SpamReportId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let id = ReportId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn serde_round_trip() {
        let id = ReportId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: ReportId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }

    #[test]
    fn from_uuid_round_trip() {
        let uuid = uuid::Uuid::new_v4();
        let id = SpamReportId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }
}
