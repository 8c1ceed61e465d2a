use chrono::{Datelike, NaiveDate};

use crate::errors::{EngineError, Result};
use crate::obligation::Obligation;
use crate::types::PaymentMode;

/// resolve the next relevant due date for an obligation
///
/// - cash: the single cash due date
/// - down payment + installments: the down payment date until it has passed
///   (paid or not), then the first unpaid installment date
/// - installments: the first unpaid installment date
///
/// Missing mode-specific fields yield `UnresolvableDueDate`; callers skip the
/// obligation instead of guessing.
pub fn resolve_due_date(obligation: &Obligation, today: NaiveDate) -> Result<NaiveDate> {
    match obligation.payment_mode {
        PaymentMode::Cash => {
            obligation
                .cash_due_date
                .ok_or_else(|| EngineError::UnresolvableDueDate {
                    obligation_id: obligation.id,
                    reason: "cash due date missing".to_string(),
                })
        }
        PaymentMode::Installments => first_unpaid_installment_date(obligation),
        PaymentMode::DownPaymentPlusInstallments => {
            let down_due = obligation.down_payment_due_date.ok_or_else(|| {
                EngineError::UnresolvableDueDate {
                    obligation_id: obligation.id,
                    reason: "down payment due date missing".to_string(),
                }
            })?;
            // the down payment date governs until it has passed, whether or
            // not the payment actually arrived
            if today <= down_due {
                Ok(down_due)
            } else {
                first_unpaid_installment_date(obligation)
            }
        }
    }
}

/// due date of the first unpaid installment: the plan's start advanced by
/// the number of installments already paid, day pinned to the plan's due day
pub fn first_unpaid_installment_date(obligation: &Obligation) -> Result<NaiveDate> {
    let plan = obligation
        .installment_plan
        .ok_or_else(|| EngineError::UnresolvableDueDate {
            obligation_id: obligation.id,
            reason: "installment plan missing".to_string(),
        })?;
    Ok(add_months_clamped(
        plan.first_due(),
        obligation.installments_paid,
        plan.due_day(),
    ))
}

/// advance a date by whole months, pinning the day of month to `due_day`
/// clamped to the target month's last valid day
pub(crate) fn add_months_clamped(start: NaiveDate, months: u32, due_day: u32) -> NaiveDate {
    let zero_based = start.year() as i64 * 12 + (start.month0() as i64) + months as i64;
    let year = zero_based.div_euclid(12) as i32;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    // months and day are in range by construction
    date_with_clamped_day(year, month, due_day)
        .unwrap_or(start)
}

/// concrete date for (year, month, day) with the day clamped to the month's
/// last valid day; None only for an invalid month
pub(crate) fn date_with_clamped_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let clamped = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, clamped)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
