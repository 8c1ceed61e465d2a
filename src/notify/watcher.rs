use std::collections::HashSet;

use hourglass_rs::SafeTimeProvider;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::events::{EngineEvent, EventStore};
use crate::notify::templates;
use crate::notify::{NotificationLogStore, NotificationRecord, Notifier};
use crate::obligation::ObligationSource;
use crate::types::{NotificationKind, ObligationId};

/// outcome counts for one watcher tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatcherSummary {
    pub newly_paid: usize,
    pub confirmations_sent: usize,
    pub send_failures: usize,
}

/// edge detector for pending -> paid transitions
///
/// The previous paid-set is process-local and not persisted: a restart
/// re-derives it from empty, so obligations paid before the restart do not
/// re-trigger confirmations. Confirmations are a courtesy, not a ledger
/// entry, and the set is advanced even when a send fails so a permanently
/// failing address cannot re-trigger forever.
#[derive(Debug, Default)]
pub struct PaymentTransitionWatcher {
    previous_paid: HashSet<ObligationId>,
}

impl PaymentTransitionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// compare the current paid-set against the previous tick's and confirm
    /// each fresh transition at most once
    pub fn tick<S, N, L>(
        &mut self,
        source: &S,
        notifier: &N,
        log: &mut L,
        events: &mut EventStore,
        time: &SafeTimeProvider,
    ) -> Result<WatcherSummary>
    where
        S: ObligationSource,
        N: Notifier,
        L: NotificationLogStore,
    {
        let today = time.now().date_naive();
        let mut summary = WatcherSummary::default();

        let obligations = source.list_active()?;
        let current_paid: HashSet<ObligationId> = obligations
            .iter()
            .filter(|o| o.is_fully_paid)
            .map(|o| o.id)
            .collect();

        for obligation in &obligations {
            if !obligation.is_fully_paid || self.previous_paid.contains(&obligation.id) {
                continue;
            }
            summary.newly_paid += 1;

            let Some(email) = obligation.contact_email.clone() else {
                continue;
            };

            // duplicate guard on top of edge detection
            match log.has_sent_today(obligation.id, NotificationKind::Confirmation, today) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    events.emit(EngineEvent::DedupUnavailable {
                        obligation_id: obligation.id,
                        kind: NotificationKind::Confirmation,
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            let content = templates::confirmation_email(obligation);
            match notifier.send(&email, &content.subject, &content.body) {
                Ok(()) => {
                    summary.confirmations_sent += 1;
                    events.emit(EngineEvent::ConfirmationSent {
                        obligation_id: obligation.id,
                        recipient: email.clone(),
                    });
                    let record = NotificationRecord::success(
                        obligation.id,
                        NotificationKind::Confirmation,
                        &email,
                        today,
                    );
                    if let Err(e) = log.record(record) {
                        warn!(
                            obligation_id = %obligation.id,
                            error = %e,
                            "failed to record confirmation send"
                        );
                    }
                }
                Err(e) => {
                    summary.send_failures += 1;
                    warn!(
                        obligation_id = %obligation.id,
                        error = %e,
                        "confirmation send failed"
                    );
                    events.emit(EngineEvent::NotificationFailed {
                        obligation_id: obligation.id,
                        kind: NotificationKind::Confirmation,
                        recipient: email.clone(),
                        error: e.to_string(),
                    });
                    let record = NotificationRecord::failure(
                        obligation.id,
                        NotificationKind::Confirmation,
                        &email,
                        today,
                        e.to_string(),
                    );
                    if let Err(e) = log.record(record) {
                        warn!(
                            obligation_id = %obligation.id,
                            error = %e,
                            "failed to record failed confirmation"
                        );
                    }
                }
            }
        }

        // the edge has passed regardless of delivery success
        self.previous_paid = current_paid;

        debug!(
            newly_paid = summary.newly_paid,
            confirmations = summary.confirmations_sent,
            "watcher tick complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::notify::testing::RecordingNotifier;
    use crate::notify::InMemoryNotificationLog;
    use crate::obligation::{Obligation, StaticObligationSource};
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn obligation() -> Obligation {
        Obligation::cash(
            "Auction",
            "Bidder",
            "lot-1",
            Money::from_major(500),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
        .unwrap()
        .with_contact_email("bidder@example.com")
    }

    #[test]
    fn test_confirmation_fires_on_transition() {
        let mut o = obligation();
        let mut source = StaticObligationSource::new(vec![o.clone()]);
        let notifier = RecordingNotifier::new();
        let mut log = InMemoryNotificationLog::new();
        let mut events = EventStore::new();
        let time = time_at(2024, 1, 15);
        let mut watcher = PaymentTransitionWatcher::new();

        // unpaid: nothing happens
        let s1 = watcher.tick(&source, &notifier, &mut log, &mut events, &time).unwrap();
        assert_eq!(s1.confirmations_sent, 0);

        // paid: one confirmation
        o.is_fully_paid = true;
        source.obligations_mut()[0] = o.clone();
        let s2 = watcher.tick(&source, &notifier, &mut log, &mut events, &time).unwrap();
        assert_eq!(s2.newly_paid, 1);
        assert_eq!(s2.confirmations_sent, 1);

        // still paid: no re-trigger
        let s3 = watcher.tick(&source, &notifier, &mut log, &mut events, &time).unwrap();
        assert_eq!(s3.confirmations_sent, 0);
        assert_eq!(notifier.sent_mails().len(), 1);
    }

    #[test]
    fn test_each_rising_edge_fires_once() {
        // false -> true -> false -> true produces exactly two confirmations
        let mut o = obligation();
        let mut source = StaticObligationSource::new(vec![o.clone()]);
        let notifier = RecordingNotifier::new();
        let mut log = InMemoryNotificationLog::new();
        let mut events = EventStore::new();
        let mut watcher = PaymentTransitionWatcher::new();

        o.is_fully_paid = true;
        source.obligations_mut()[0] = o.clone();
        watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 15))
            .unwrap();

        o.is_fully_paid = false;
        source.obligations_mut()[0] = o.clone();
        watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 16))
            .unwrap();

        o.is_fully_paid = true;
        source.obligations_mut()[0] = o.clone();
        watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 17))
            .unwrap();

        assert_eq!(notifier.sent_mails().len(), 2);
    }

    #[test]
    fn test_missing_email_counts_edge_but_sends_nothing() {
        let mut o = obligation();
        o.contact_email = None;
        o.is_fully_paid = true;
        let source = StaticObligationSource::new(vec![o]);
        let notifier = RecordingNotifier::new();
        let mut log = InMemoryNotificationLog::new();
        let mut events = EventStore::new();
        let mut watcher = PaymentTransitionWatcher::new();

        let summary = watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 15))
            .unwrap();
        assert_eq!(summary.newly_paid, 1);
        assert_eq!(summary.confirmations_sent, 0);
    }

    #[test]
    fn test_failed_send_does_not_retrigger() {
        let mut o = obligation();
        o.is_fully_paid = true;
        let source = StaticObligationSource::new(vec![o]);
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);
        let mut log = InMemoryNotificationLog::new();
        let mut events = EventStore::new();
        let mut watcher = PaymentTransitionWatcher::new();

        let s1 = watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 15))
            .unwrap();
        assert_eq!(s1.send_failures, 1);

        // the edge has passed; recovery of the notifier does not re-send
        notifier.set_failing(false);
        let s2 = watcher
            .tick(&source, &notifier, &mut log, &mut events, &time_at(2024, 1, 15))
            .unwrap();
        assert_eq!(s2.confirmations_sent, 0);
        assert!(notifier.sent_mails().is_empty());
    }

    #[test]
    fn test_same_day_dedup_guard() {
        let mut o = obligation();
        o.is_fully_paid = true;
        let source = StaticObligationSource::new(vec![o.clone()]);
        let notifier = RecordingNotifier::new();
        let mut log = InMemoryNotificationLog::new();
        let mut events = EventStore::new();
        let time = time_at(2024, 1, 15);

        // a confirmation already went out today (e.g. before a process restart)
        log.record(NotificationRecord::success(
            o.id,
            NotificationKind::Confirmation,
            "bidder@example.com",
            time.now().date_naive(),
        ))
        .unwrap();

        // fresh watcher, empty previous set: the edge fires but dedup holds
        let mut watcher = PaymentTransitionWatcher::new();
        let summary = watcher
            .tick(&source, &notifier, &mut log, &mut events, &time)
            .unwrap();
        assert_eq!(summary.newly_paid, 1);
        assert_eq!(summary.confirmations_sent, 0);
        assert!(notifier.sent_mails().is_empty());
    }
}
