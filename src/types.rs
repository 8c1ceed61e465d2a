use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for an obligation (one bidder's commitment for one lot)
pub type ObligationId = Uuid;

/// how the bidder settles the obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    /// single payment on a fixed date
    Cash,
    /// monthly installments only
    Installments,
    /// a down payment followed by monthly installments
    DownPaymentPlusInstallments,
}

/// how arrears interest accrues on late payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrearsKind {
    Simple,
    Compound,
}

/// derived payment status, recomputed on every evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// due date in the future, or no due date resolvable
    Pending,
    /// due date strictly in the past and not fully paid
    Overdue,
    /// fully paid, terminal for display purposes
    Paid,
}

/// notification categories, deduplicated per calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Reminder,
    Dunning,
    Confirmation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reminder => "reminder",
            NotificationKind::Dunning => "dunning",
            NotificationKind::Confirmation => "confirmation",
        }
    }
}

/// installment weight within an uneven schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentKind {
    /// worth 3x the bid amount
    Triple,
    /// worth 2x the bid amount
    Double,
    /// worth 1x the bid amount
    Simple,
}

impl InstallmentKind {
    pub fn multiplier(&self) -> u32 {
        match self {
            InstallmentKind::Triple => 3,
            InstallmentKind::Double => 2,
            InstallmentKind::Simple => 1,
        }
    }
}

/// counts of each installment weight making up a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InstallmentCounts {
    pub triple: u32,
    pub double: u32,
    pub simple: u32,
}

impl InstallmentCounts {
    pub fn new(triple: u32, double: u32, simple: u32) -> Self {
        Self { triple, double, simple }
    }

    /// number of installments in the schedule; widened so store-loaded
    /// records with absurd counts cannot overflow
    pub fn total(&self) -> u64 {
        u64::from(self.triple) + u64::from(self.double) + u64::from(self.simple)
    }

    /// weighted sum, expected to equal the multiplier factor
    pub fn weighted_sum(&self) -> u64 {
        u64::from(self.triple) * 3 + u64::from(self.double) * 2 + u64::from(self.simple)
    }

    /// no counts configured yet
    pub fn is_unconfigured(&self) -> bool {
        self.total() == 0
    }

    /// installment kind at a 1-based position: triples first, then doubles,
    /// then simples
    pub fn kind_at(&self, sequence_number: u32) -> Option<InstallmentKind> {
        let n = u64::from(sequence_number);
        if n == 0 || n > self.total() {
            return None;
        }
        if n <= u64::from(self.triple) {
            Some(InstallmentKind::Triple)
        } else if n <= u64::from(self.triple) + u64::from(self.double) {
            Some(InstallmentKind::Double)
        } else {
            Some(InstallmentKind::Simple)
        }
    }
}
