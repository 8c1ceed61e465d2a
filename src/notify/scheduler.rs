use hourglass_rs::SafeTimeProvider;
use tracing::{debug, warn};

use crate::arrears::calculate_arrears;
use crate::config::EngineConfig;
use crate::due_date::resolve_due_date;
use crate::errors::Result;
use crate::events::{EngineEvent, EventStore};
use crate::notify::templates;
use crate::notify::{NotificationLogStore, NotificationRecord, Notifier};
use crate::obligation::{Obligation, ObligationSource};
use crate::types::NotificationKind;

/// outcome counts for one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// obligations that were eligible for evaluation
    pub processed: usize,
    pub reminders_sent: usize,
    pub dunnings_sent: usize,
    pub send_failures: usize,
    /// obligations skipped for missing configuration
    pub skipped_unresolvable: usize,
    /// sends suppressed because the dedup store was unreachable
    pub dedup_unavailable: usize,
}

/// reminder and dunning pass over the active obligation set
///
/// Each tick is a short-lived unit of sequential work; per-obligation
/// failures are contained and never abort the tick.
pub struct NotificationScheduler {
    reminder_window_days: i64,
    dunning_threshold_days: i64,
}

impl NotificationScheduler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            reminder_window_days: config.reminder_window_days,
            dunning_threshold_days: config.dunning_threshold_days,
        }
    }

    /// evaluate every active obligation once
    pub fn tick<S, N, L>(
        &self,
        source: &S,
        notifier: &N,
        log: &mut L,
        events: &mut EventStore,
        time: &SafeTimeProvider,
    ) -> Result<TickSummary>
    where
        S: ObligationSource,
        N: Notifier,
        L: NotificationLogStore,
    {
        let today = time.now().date_naive();
        let mut summary = TickSummary::default();

        for obligation in source.list_active()? {
            if obligation.archived || obligation.is_fully_paid {
                continue;
            }
            let Some(email) = obligation.contact_email.clone() else {
                continue;
            };
            summary.processed += 1;

            let due_date = match resolve_due_date(&obligation, today) {
                Ok(date) => date,
                Err(e) => {
                    summary.skipped_unresolvable += 1;
                    events.emit(EngineEvent::ObligationSkipped {
                        obligation_id: obligation.id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let days_until_due = (due_date - today).num_days();

            // a due date is either ahead or behind, but both windows are
            // checked every tick rather than assuming exclusivity
            if days_until_due > 0 && days_until_due <= self.reminder_window_days {
                let content = templates::reminder_email(&obligation, due_date, days_until_due);
                match self.send_once(
                    &obligation,
                    NotificationKind::Reminder,
                    &email,
                    &content.subject,
                    &content.body,
                    notifier,
                    log,
                    events,
                    today,
                ) {
                    SendOutcome::Sent => {
                        summary.reminders_sent += 1;
                        events.emit(EngineEvent::ReminderSent {
                            obligation_id: obligation.id,
                            recipient: email.clone(),
                            due_date,
                            days_until_due,
                        });
                    }
                    SendOutcome::Failed => summary.send_failures += 1,
                    SendOutcome::AlreadySentToday => {}
                    SendOutcome::DedupUnavailable => summary.dedup_unavailable += 1,
                }
            }

            if days_until_due < 0 && -days_until_due >= self.dunning_threshold_days {
                let days_late = -days_until_due;
                let arrears = calculate_arrears(
                    obligation.currently_due_amount(today),
                    days_late,
                    obligation.arrears_rate,
                    obligation.arrears_kind,
                );
                let content =
                    templates::dunning_email(&obligation, due_date, days_late, &arrears);
                match self.send_once(
                    &obligation,
                    NotificationKind::Dunning,
                    &email,
                    &content.subject,
                    &content.body,
                    notifier,
                    log,
                    events,
                    today,
                ) {
                    SendOutcome::Sent => {
                        summary.dunnings_sent += 1;
                        events.emit(EngineEvent::DunningSent {
                            obligation_id: obligation.id,
                            recipient: email.clone(),
                            due_date,
                            days_late,
                            interest: arrears.interest,
                            total_due: arrears.total,
                        });
                    }
                    SendOutcome::Failed => summary.send_failures += 1,
                    SendOutcome::AlreadySentToday => {}
                    SendOutcome::DedupUnavailable => summary.dedup_unavailable += 1,
                }
            }
        }

        // once per tick, not per obligation
        if summary.skipped_unresolvable > 0 {
            warn!(
                skipped = summary.skipped_unresolvable,
                "obligations skipped for missing due date configuration"
            );
        }
        if summary.dedup_unavailable > 0 {
            warn!(
                suppressed = summary.dedup_unavailable,
                "notification log store unavailable, sends suppressed"
            );
        }
        debug!(
            processed = summary.processed,
            reminders = summary.reminders_sent,
            dunnings = summary.dunnings_sent,
            failures = summary.send_failures,
            "scheduler tick complete"
        );

        Ok(summary)
    }

    /// send one notification unless already sent today
    ///
    /// A dedup read failure fails closed: better to skip a day than to risk a
    /// duplicate by assuming "not sent".
    #[allow(clippy::too_many_arguments)]
    fn send_once<N, L>(
        &self,
        obligation: &Obligation,
        kind: NotificationKind,
        email: &str,
        subject: &str,
        body: &str,
        notifier: &N,
        log: &mut L,
        events: &mut EventStore,
        today: chrono::NaiveDate,
    ) -> SendOutcome
    where
        N: Notifier,
        L: NotificationLogStore,
    {
        match log.has_sent_today(obligation.id, kind, today) {
            Ok(true) => return SendOutcome::AlreadySentToday,
            Ok(false) => {}
            Err(e) => {
                events.emit(EngineEvent::DedupUnavailable {
                    obligation_id: obligation.id,
                    kind,
                    error: e.to_string(),
                });
                return SendOutcome::DedupUnavailable;
            }
        }

        match notifier.send(email, subject, body) {
            Ok(()) => {
                let record = NotificationRecord::success(obligation.id, kind, email, today);
                if let Err(e) = log.record(record) {
                    warn!(
                        obligation_id = %obligation.id,
                        kind = kind.as_str(),
                        error = %e,
                        "failed to record successful send"
                    );
                }
                SendOutcome::Sent
            }
            Err(e) => {
                warn!(
                    obligation_id = %obligation.id,
                    kind = kind.as_str(),
                    error = %e,
                    "notification send failed"
                );
                events.emit(EngineEvent::NotificationFailed {
                    obligation_id: obligation.id,
                    kind,
                    recipient: email.to_string(),
                    error: e.to_string(),
                });
                // a failed send must not count as sent today
                let record =
                    NotificationRecord::failure(obligation.id, kind, email, today, e.to_string());
                if let Err(e) = log.record(record) {
                    warn!(
                        obligation_id = %obligation.id,
                        kind = kind.as_str(),
                        error = %e,
                        "failed to record failed send"
                    );
                }
                SendOutcome::Failed
            }
        }
    }
}

enum SendOutcome {
    Sent,
    Failed,
    AlreadySentToday,
    DedupUnavailable,
}
