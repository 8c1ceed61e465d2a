use chrono::NaiveDate;

use crate::arrears::ArrearsCalculation;
use crate::decimal::Money;
use crate::obligation::Obligation;
use crate::types::PaymentMode;

/// rendered subject and body for one outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// upcoming payment reminder
pub fn reminder_email(
    obligation: &Obligation,
    due_date: NaiveDate,
    days_until_due: i64,
) -> EmailContent {
    let amount = obligation.currently_due_amount(due_date);
    let subject = format!(
        "Payment reminder: {} - lot {}",
        obligation.auction_name, obligation.lot_reference
    );
    let mut body = format!(
        "Dear {},\n\nThis is a reminder that your payment of {} for lot {} in \
         auction \"{}\" is due on {} ({} day(s) from now).\n",
        obligation.bidder_name,
        amount,
        obligation.lot_reference,
        obligation.auction_name,
        due_date.format("%Y-%m-%d"),
        days_until_due,
    );
    if let Some(position) = installment_position(obligation, due_date) {
        body.push_str(&position);
        body.push('\n');
    }
    EmailContent { subject, body }
}

/// overdue payment notice, including arrears interest when any accrued
pub fn dunning_email(
    obligation: &Obligation,
    due_date: NaiveDate,
    days_late: i64,
    arrears: &ArrearsCalculation,
) -> EmailContent {
    let subject = format!(
        "Overdue payment: {} - lot {}",
        obligation.auction_name, obligation.lot_reference
    );
    let mut body = format!(
        "Dear {},\n\nYour payment of {} for lot {} in auction \"{}\" was due \
         on {} and is now {} day(s) overdue.\n",
        obligation.bidder_name,
        arrears.total - arrears.interest,
        obligation.lot_reference,
        obligation.auction_name,
        due_date.format("%Y-%m-%d"),
        days_late,
    );
    if arrears.interest.is_positive() {
        body.push_str(&format!(
            "Arrears interest of {} has accrued, bringing the amount due to {}.\n",
            arrears.interest, arrears.total,
        ));
    }
    if let Some(position) = installment_position(obligation, due_date) {
        body.push_str(&position);
        body.push('\n');
    }
    body.push_str("\nPlease settle the outstanding amount as soon as possible.\n");
    EmailContent { subject, body }
}

/// payment confirmation after an obligation became fully paid
pub fn confirmation_email(obligation: &Obligation) -> EmailContent {
    let subject = format!(
        "Payment received: {} - lot {}",
        obligation.auction_name, obligation.lot_reference
    );
    let body = format!(
        "Dear {},\n\nWe confirm receipt of your payment of {} for lot {} in \
         auction \"{}\". The total of {} is settled in full; no balance \
         remains.\n\nThank you.\n",
        obligation.bidder_name,
        settled_amount(obligation),
        obligation.lot_reference,
        obligation.auction_name,
        obligation.total_payable(),
    );
    EmailContent { subject, body }
}

/// amount of the payment that closed the obligation: the cash sum, the last
/// installment paid, or the down payment when no installment was recorded
fn settled_amount(obligation: &Obligation) -> Money {
    match obligation.payment_mode {
        PaymentMode::Cash => obligation.bid_amount,
        PaymentMode::DownPaymentPlusInstallments if obligation.installments_paid == 0 => {
            obligation.down_payment_amount.unwrap_or(obligation.bid_amount)
        }
        _ if obligation.installments_paid > 0 => {
            obligation.amount_for_installment(obligation.installments_paid)
        }
        _ => obligation.total_payable(),
    }
}

fn installment_position(obligation: &Obligation, today: NaiveDate) -> Option<String> {
    if obligation.payment_mode == PaymentMode::Cash {
        return None;
    }
    if obligation.payment_mode == PaymentMode::DownPaymentPlusInstallments {
        let in_down_payment_phase = obligation
            .down_payment_due_date
            .map(|due| today <= due)
            .unwrap_or(false);
        if in_down_payment_phase {
            return Some("This concerns the down payment.".to_string());
        }
    }
    let total = obligation.total_installments();
    if total == 0 {
        return None;
    }
    Some(format!(
        "This is installment {} of {}.",
        obligation.next_installment_number(),
        total
    ))
}
