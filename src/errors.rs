use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::ObligationId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("schedule mismatch: weighted installment sum {actual} does not equal multiplier factor {expected}")]
    ScheduleMismatch {
        expected: Decimal,
        actual: Decimal,
    },

    #[error("unresolvable due date for obligation {obligation_id}: {reason}")]
    UnresolvableDueDate {
        obligation_id: ObligationId,
        reason: String,
    },

    #[error("invalid obligation: {message}")]
    InvalidObligation {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("notifier error: {message}")]
    Notifier {
        message: String,
    },

    #[error("notification log store error: {message}")]
    DedupStore {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
