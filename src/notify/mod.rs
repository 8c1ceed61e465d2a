pub mod dedup;
pub mod scheduler;
pub mod templates;
pub mod watcher;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{NotificationKind, ObligationId};

pub use dedup::{InMemoryNotificationLog, NotificationLogStore};
pub use scheduler::{NotificationScheduler, TickSummary};
pub use templates::EmailContent;
pub use watcher::{PaymentTransitionWatcher, WatcherSummary};

/// outbound email capability, provided by the host
///
/// The engine treats delivery as fire-and-forget; the synchronous result only
/// decides whether the send is recorded as a success. The implementation is
/// expected to enforce its own timeout.
pub trait Notifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// one row per send attempt, appended on both success and failure
///
/// Only successful rows count for same-day dedup; a failed send is retried
/// naturally on the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub obligation_id: ObligationId,
    pub kind: NotificationKind,
    pub recipient: String,
    pub sent_at_date: NaiveDate,
    pub success: bool,
    pub error: Option<String>,
}

impl NotificationRecord {
    pub fn success(
        obligation_id: ObligationId,
        kind: NotificationKind,
        recipient: impl Into<String>,
        sent_at_date: NaiveDate,
    ) -> Self {
        Self {
            obligation_id,
            kind,
            recipient: recipient.into(),
            sent_at_date,
            success: true,
            error: None,
        }
    }

    pub fn failure(
        obligation_id: ObligationId,
        kind: NotificationKind,
        recipient: impl Into<String>,
        sent_at_date: NaiveDate,
        error: impl Into<String>,
    ) -> Self {
        Self {
            obligation_id,
            kind,
            recipient: recipient.into(),
            sent_at_date,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::errors::EngineError;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// notifier double that records every send and can be told to fail
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<SentMail>>,
        pub fail: Mutex<bool>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        pub fn sent_mails(&self) -> Vec<SentMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(EngineError::Notifier {
                    message: "smtp relay refused connection".to_string(),
                });
            }
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_record_constructors() {
        let id = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let ok = NotificationRecord::success(id, NotificationKind::Reminder, "a@b.c", day);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed =
            NotificationRecord::failure(id, NotificationKind::Dunning, "a@b.c", day, "timeout");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("timeout"));
    }
}
