use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::due_date::date_with_clamped_day;
use crate::errors::{EngineError, Result};
use crate::types::{ArrearsKind, InstallmentCounts, ObligationId, PaymentMode};

/// monthly installment plan
///
/// The day of month encoded in `first_due` always equals `due_day` (clamped
/// to the month's last valid day at construction). The two fields are kept in
/// lockstep here instead of being patched up at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    first_due: NaiveDate,
    due_day: u32,
}

impl InstallmentPlan {
    /// build a plan from a start year-month and a due day (1-31)
    pub fn new(year: i32, month: u32, due_day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidDate {
                message: format!("month {month} out of range"),
            });
        }
        if !(1..=31).contains(&due_day) {
            return Err(EngineError::InvalidDate {
                message: format!("due day {due_day} out of range"),
            });
        }
        let first_due =
            date_with_clamped_day(year, month, due_day).ok_or(EngineError::InvalidDate {
                message: format!("invalid start month {year}-{month:02}"),
            })?;
        Ok(Self { first_due, due_day })
    }

    /// normalize a concrete start date and due day into a consistent plan
    pub fn from_start_date(start: NaiveDate, due_day: u32) -> Result<Self> {
        Self::new(start.year(), start.month(), due_day)
    }

    /// first installment due date
    pub fn first_due(&self) -> NaiveDate {
        self.first_due
    }

    /// configured day of month (before per-month clamping)
    pub fn due_day(&self) -> u32 {
        self.due_day
    }
}

/// one bidder's payment commitment for one lot in one auction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub auction_name: String,
    pub bidder_name: String,
    pub lot_reference: String,

    pub payment_mode: PaymentMode,
    pub bid_amount: Money,
    /// unit count the total payable is divided into; unused for cash
    pub multiplier_factor: Decimal,
    pub installment_counts: InstallmentCounts,

    pub cash_due_date: Option<NaiveDate>,
    pub down_payment_due_date: Option<NaiveDate>,
    pub down_payment_amount: Option<Money>,
    pub down_payment_paid: bool,

    pub installment_plan: Option<InstallmentPlan>,
    /// legacy records carry a stored count instead of installment counts
    pub total_installments_override: Option<u32>,
    pub installments_paid: u32,

    pub arrears_rate: Rate,
    pub arrears_kind: ArrearsKind,

    pub is_fully_paid: bool,
    pub contact_email: Option<String>,
    pub archived: bool,
}

impl Obligation {
    /// create a cash obligation
    pub fn cash(
        auction_name: impl Into<String>,
        bidder_name: impl Into<String>,
        lot_reference: impl Into<String>,
        bid_amount: Money,
        cash_due_date: NaiveDate,
    ) -> Result<Self> {
        let obligation = Self {
            id: Uuid::new_v4(),
            auction_name: auction_name.into(),
            bidder_name: bidder_name.into(),
            lot_reference: lot_reference.into(),
            payment_mode: PaymentMode::Cash,
            bid_amount,
            multiplier_factor: Decimal::ONE,
            installment_counts: InstallmentCounts::default(),
            cash_due_date: Some(cash_due_date),
            down_payment_due_date: None,
            down_payment_amount: None,
            down_payment_paid: false,
            installment_plan: None,
            total_installments_override: None,
            installments_paid: 0,
            arrears_rate: Rate::ZERO,
            arrears_kind: ArrearsKind::Simple,
            is_fully_paid: false,
            contact_email: None,
            archived: false,
        };
        obligation.validate()?;
        Ok(obligation)
    }

    /// create an installments-only obligation
    pub fn installments(
        auction_name: impl Into<String>,
        bidder_name: impl Into<String>,
        lot_reference: impl Into<String>,
        bid_amount: Money,
        multiplier_factor: Decimal,
        counts: InstallmentCounts,
        plan: InstallmentPlan,
    ) -> Result<Self> {
        let obligation = Self {
            id: Uuid::new_v4(),
            auction_name: auction_name.into(),
            bidder_name: bidder_name.into(),
            lot_reference: lot_reference.into(),
            payment_mode: PaymentMode::Installments,
            bid_amount,
            multiplier_factor,
            installment_counts: counts,
            cash_due_date: None,
            down_payment_due_date: None,
            down_payment_amount: None,
            down_payment_paid: false,
            installment_plan: Some(plan),
            total_installments_override: None,
            installments_paid: 0,
            arrears_rate: Rate::ZERO,
            arrears_kind: ArrearsKind::Simple,
            is_fully_paid: false,
            contact_email: None,
            archived: false,
        };
        obligation.validate()?;
        Ok(obligation)
    }

    /// create a down-payment-plus-installments obligation
    #[allow(clippy::too_many_arguments)]
    pub fn down_payment_plus_installments(
        auction_name: impl Into<String>,
        bidder_name: impl Into<String>,
        lot_reference: impl Into<String>,
        bid_amount: Money,
        multiplier_factor: Decimal,
        counts: InstallmentCounts,
        down_payment_amount: Money,
        down_payment_due_date: NaiveDate,
        plan: InstallmentPlan,
    ) -> Result<Self> {
        let obligation = Self {
            id: Uuid::new_v4(),
            auction_name: auction_name.into(),
            bidder_name: bidder_name.into(),
            lot_reference: lot_reference.into(),
            payment_mode: PaymentMode::DownPaymentPlusInstallments,
            bid_amount,
            multiplier_factor,
            installment_counts: counts,
            cash_due_date: None,
            down_payment_due_date: Some(down_payment_due_date),
            down_payment_amount: Some(down_payment_amount),
            down_payment_paid: false,
            installment_plan: Some(plan),
            total_installments_override: None,
            installments_paid: 0,
            arrears_rate: Rate::ZERO,
            arrears_kind: ArrearsKind::Simple,
            is_fully_paid: false,
            contact_email: None,
            archived: false,
        };
        obligation.validate()?;
        Ok(obligation)
    }

    /// validate internal consistency
    ///
    /// Store-loaded records that fail validation are skipped by the
    /// scheduler, never a reason to abort a tick.
    pub fn validate(&self) -> Result<()> {
        if !self.bid_amount.is_positive() {
            return Err(EngineError::InvalidObligation {
                message: format!("bid amount must be positive, got {}", self.bid_amount),
            });
        }
        if self.payment_mode != PaymentMode::Cash && self.multiplier_factor <= Decimal::ZERO {
            return Err(EngineError::InvalidObligation {
                message: format!(
                    "multiplier factor must be positive, got {}",
                    self.multiplier_factor
                ),
            });
        }
        match self.payment_mode {
            PaymentMode::Cash => {
                if self.cash_due_date.is_none() {
                    return Err(EngineError::InvalidObligation {
                        message: "cash obligation requires a cash due date".to_string(),
                    });
                }
            }
            PaymentMode::Installments => {
                if self.installment_plan.is_none() {
                    return Err(EngineError::InvalidObligation {
                        message: "installment obligation requires an installment plan".to_string(),
                    });
                }
            }
            PaymentMode::DownPaymentPlusInstallments => {
                if self.down_payment_due_date.is_none() || self.down_payment_amount.is_none() {
                    return Err(EngineError::InvalidObligation {
                        message: "down payment obligation requires a down payment amount and due date"
                            .to_string(),
                    });
                }
                if self.installment_plan.is_none() {
                    return Err(EngineError::InvalidObligation {
                        message: "down payment obligation requires an installment plan".to_string(),
                    });
                }
            }
        }
        let total = self.total_installments();
        if total > 0 && u64::from(self.installments_paid) > total {
            return Err(EngineError::InvalidObligation {
                message: format!(
                    "installments paid {} exceeds total {}",
                    self.installments_paid, total
                ),
            });
        }
        Ok(())
    }

    /// total amount the bidder owes
    pub fn total_payable(&self) -> Money {
        match self.payment_mode {
            PaymentMode::Cash => self.bid_amount,
            _ => self.bid_amount * self.multiplier_factor,
        }
    }

    /// installment count, derived from counts with a legacy fallback
    pub fn total_installments(&self) -> u64 {
        if !self.installment_counts.is_unconfigured() {
            self.installment_counts.total()
        } else {
            self.total_installments_override.map(u64::from).unwrap_or(0)
        }
    }

    /// 1-based number of the next unpaid installment
    pub fn next_installment_number(&self) -> u32 {
        self.installments_paid.saturating_add(1)
    }

    /// amount of a specific installment; legacy records without counts fall
    /// back to the plain bid amount
    pub fn amount_for_installment(&self, sequence_number: u32) -> Money {
        match self.installment_counts.kind_at(sequence_number) {
            Some(kind) => self.bid_amount * Decimal::from(kind.multiplier()),
            None => self.bid_amount,
        }
    }

    /// amount the bidder currently owes against the next relevant due date
    pub fn currently_due_amount(&self, today: NaiveDate) -> Money {
        match self.payment_mode {
            PaymentMode::Cash => self.bid_amount,
            PaymentMode::DownPaymentPlusInstallments => {
                let in_down_payment_phase = self
                    .down_payment_due_date
                    .map(|due| today <= due)
                    .unwrap_or(false);
                if in_down_payment_phase {
                    self.down_payment_amount.unwrap_or(self.bid_amount)
                } else {
                    self.amount_for_installment(self.next_installment_number())
                }
            }
            PaymentMode::Installments => {
                self.amount_for_installment(self.next_installment_number())
            }
        }
    }

    /// set the contact email
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// set the arrears terms
    pub fn with_arrears(mut self, rate: Rate, kind: ArrearsKind) -> Self {
        self.arrears_rate = rate;
        self.arrears_kind = kind;
        self
    }
}

/// read side of the external record store
pub trait ObligationSource {
    /// all non-archived obligations; partial records are returned as-is and
    /// tolerated downstream by skipping
    fn list_active(&self) -> Result<Vec<Obligation>>;
}

/// fixed obligation set, for hosts with small data and for tests
#[derive(Debug, Default)]
pub struct StaticObligationSource {
    obligations: Vec<Obligation>,
}

impl StaticObligationSource {
    pub fn new(obligations: Vec<Obligation>) -> Self {
        Self { obligations }
    }

    pub fn obligations_mut(&mut self) -> &mut Vec<Obligation> {
        &mut self.obligations
    }
}

impl ObligationSource for StaticObligationSource {
    fn list_active(&self) -> Result<Vec<Obligation>> {
        Ok(self
            .obligations
            .iter()
            .filter(|o| !o.archived)
            .cloned()
            .collect())
    }
}
