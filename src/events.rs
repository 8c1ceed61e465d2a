use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{NotificationKind, ObligationId};

/// all events the engine can emit during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    ReminderSent {
        obligation_id: ObligationId,
        recipient: String,
        due_date: NaiveDate,
        days_until_due: i64,
    },
    DunningSent {
        obligation_id: ObligationId,
        recipient: String,
        due_date: NaiveDate,
        days_late: i64,
        interest: Money,
        total_due: Money,
    },
    ConfirmationSent {
        obligation_id: ObligationId,
        recipient: String,
    },
    NotificationFailed {
        obligation_id: ObligationId,
        kind: NotificationKind,
        recipient: String,
        error: String,
    },
    /// obligation could not be scheduled this tick (missing configuration)
    ObligationSkipped {
        obligation_id: ObligationId,
        reason: String,
    },
    /// dedup store unreachable; send suppressed rather than risked
    DedupUnavailable {
        obligation_id: ObligationId,
        kind: NotificationKind,
        error: String,
    },
}

/// event store for collecting events during ticks
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<EngineEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_emit_and_take() {
        let mut store = EventStore::new();
        let id = Uuid::new_v4();
        store.emit(EngineEvent::ConfirmationSent {
            obligation_id: id,
            recipient: "bidder@example.com".to_string(),
        });
        assert_eq!(store.events().len(), 1);

        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }
}
