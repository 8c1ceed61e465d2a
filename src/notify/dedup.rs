use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::notify::NotificationRecord;
use crate::types::{NotificationKind, ObligationId};

/// persisted notification log, the engine's only shared resource
///
/// `has_sent_today` filters to successful rows for the given calendar day;
/// the `today` argument always comes from the engine's time provider, never a
/// caller clock, so a skewed client cannot defeat dedup. `record` is
/// append-only; rows are never mutated or deleted here.
///
/// Two overlapping ticks can both observe "not sent" and both record a send.
/// That duplicate is accepted: ticks are minutes apart, overlap is
/// exceptional, and a doubled reminder is low-severity. No lock is taken.
pub trait NotificationLogStore {
    fn has_sent_today(
        &self,
        obligation_id: ObligationId,
        kind: NotificationKind,
        today: NaiveDate,
    ) -> Result<bool>;

    fn record(&mut self, record: NotificationRecord) -> Result<()>;
}

/// in-memory notification log with a JSON snapshot for persistence
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InMemoryNotificationLog {
    records: Vec<NotificationRecord>,
}

impl InMemoryNotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    /// rows for one obligation and kind, all days
    pub fn records_for(
        &self,
        obligation_id: ObligationId,
        kind: NotificationKind,
    ) -> Vec<&NotificationRecord> {
        self.records
            .iter()
            .filter(|r| r.obligation_id == obligation_id && r.kind == kind)
            .collect()
    }

    /// serialize the log for persistence
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EngineError::DedupStore {
            message: format!("log serialization failed: {e}"),
        })
    }

    /// restore a previously persisted log
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::DedupStore {
            message: format!("log deserialization failed: {e}"),
        })
    }
}

impl NotificationLogStore for InMemoryNotificationLog {
    fn has_sent_today(
        &self,
        obligation_id: ObligationId,
        kind: NotificationKind,
        today: NaiveDate,
    ) -> Result<bool> {
        Ok(self.records.iter().any(|r| {
            r.success && r.obligation_id == obligation_id && r.kind == kind && r.sent_at_date == today
        }))
    }

    fn record(&mut self, record: NotificationRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_has_sent_today_matches_day_and_kind() {
        let mut log = InMemoryNotificationLog::new();
        let id = Uuid::new_v4();
        let today = date(2024, 1, 15);

        log.record(NotificationRecord::success(
            id,
            NotificationKind::Reminder,
            "a@b.c",
            today,
        ))
        .unwrap();

        assert!(log.has_sent_today(id, NotificationKind::Reminder, today).unwrap());
        // different kind, different day, different obligation all miss
        assert!(!log.has_sent_today(id, NotificationKind::Dunning, today).unwrap());
        assert!(!log
            .has_sent_today(id, NotificationKind::Reminder, date(2024, 1, 16))
            .unwrap());
        assert!(!log
            .has_sent_today(Uuid::new_v4(), NotificationKind::Reminder, today)
            .unwrap());
    }

    #[test]
    fn test_failed_sends_do_not_count() {
        let mut log = InMemoryNotificationLog::new();
        let id = Uuid::new_v4();
        let today = date(2024, 1, 15);

        log.record(NotificationRecord::failure(
            id,
            NotificationKind::Reminder,
            "a@b.c",
            today,
            "timeout",
        ))
        .unwrap();

        assert!(!log.has_sent_today(id, NotificationKind::Reminder, today).unwrap());
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn test_append_only_duplicates_kept() {
        let mut log = InMemoryNotificationLog::new();
        let id = Uuid::new_v4();
        let today = date(2024, 1, 15);
        let record = NotificationRecord::success(id, NotificationKind::Dunning, "a@b.c", today);

        log.record(record.clone()).unwrap();
        log.record(record).unwrap();
        assert_eq!(log.records_for(id, NotificationKind::Dunning).len(), 2);
    }

    #[test]
    fn test_json_snapshot_roundtrip() {
        let mut log = InMemoryNotificationLog::new();
        let id = Uuid::new_v4();
        log.record(NotificationRecord::success(
            id,
            NotificationKind::Confirmation,
            "a@b.c",
            date(2024, 1, 15),
        ))
        .unwrap();

        let json = log.to_json().unwrap();
        let restored = InMemoryNotificationLog::from_json(&json).unwrap();
        assert!(restored
            .has_sent_today(id, NotificationKind::Confirmation, date(2024, 1, 15))
            .unwrap());
    }
}
