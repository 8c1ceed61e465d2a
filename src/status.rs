use chrono::NaiveDate;

use crate::types::PaymentStatus;

/// derive the payment status, recomputed fresh on every call
///
/// Fully paid wins over everything. A resolvable due date strictly before
/// today means overdue. No resolvable due date means pending by convention;
/// such obligations are excluded from dunning because there is nothing to be
/// late on yet.
pub fn derive_status(
    is_fully_paid: bool,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaymentStatus {
    if is_fully_paid {
        return PaymentStatus::Paid;
    }
    match due_date {
        Some(due) if due < today => PaymentStatus::Overdue,
        _ => PaymentStatus::Pending,
    }
}
