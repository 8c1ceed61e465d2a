use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::types::{InstallmentCounts, InstallmentKind};

/// one entry in a generated installment schedule, derived and never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentEntry {
    /// 1-based position in the schedule
    pub sequence_number: u32,
    pub kind: InstallmentKind,
    pub multiplier: u32,
    pub amount: Money,
}

/// ordered installment schedule for one obligation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentSchedule {
    pub bid_amount: Money,
    pub multiplier_factor: Decimal,
    pub counts: InstallmentCounts,
    pub entries: Vec<InstallmentEntry>,
    /// bid amount x multiplier factor, not re-derived from entries
    pub total_payable: Money,
    /// entry sum minus total payable; a pure rounding artifact for display
    pub rounding_delta: Money,
}

impl InstallmentSchedule {
    /// generate the schedule: triples first, then doubles, then simples,
    /// numbered sequentially from 1
    ///
    /// Zero counts produce an empty schedule, meaning "not yet configured",
    /// not "nothing owed". Non-zero counts whose weighted sum does not match
    /// the multiplier factor fail with `ScheduleMismatch`; the mismatch is
    /// surfaced to the user, never truncated or padded away.
    pub fn generate(
        bid_amount: Money,
        multiplier_factor: Decimal,
        counts: InstallmentCounts,
    ) -> Result<Self> {
        if !bid_amount.is_positive() {
            return Err(EngineError::InvalidObligation {
                message: format!("bid amount must be positive, got {bid_amount}"),
            });
        }
        if multiplier_factor <= Decimal::ZERO {
            return Err(EngineError::InvalidObligation {
                message: format!("multiplier factor must be positive, got {multiplier_factor}"),
            });
        }

        let total_payable = bid_amount * multiplier_factor;

        if counts.is_unconfigured() {
            return Ok(Self {
                bid_amount,
                multiplier_factor,
                counts,
                entries: Vec::new(),
                total_payable,
                rounding_delta: Money::ZERO,
            });
        }

        let weighted = Decimal::from(counts.weighted_sum());
        if weighted != multiplier_factor {
            return Err(EngineError::ScheduleMismatch {
                expected: multiplier_factor,
                actual: weighted,
            });
        }

        let mut entries = Vec::with_capacity(counts.total() as usize);
        let mut sequence_number = 0;
        for (kind, count) in [
            (InstallmentKind::Triple, counts.triple),
            (InstallmentKind::Double, counts.double),
            (InstallmentKind::Simple, counts.simple),
        ] {
            for _ in 0..count {
                sequence_number += 1;
                entries.push(InstallmentEntry {
                    sequence_number,
                    kind,
                    multiplier: kind.multiplier(),
                    amount: bid_amount * Decimal::from(kind.multiplier()),
                });
            }
        }

        let entry_sum = entries
            .iter()
            .map(|e| e.amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            bid_amount,
            multiplier_factor,
            counts,
            entries,
            total_payable,
            rounding_delta: entry_sum - total_payable,
        })
    }

    /// entry for a specific 1-based sequence number
    pub fn entry(&self, sequence_number: u32) -> Option<&InstallmentEntry> {
        self.entries.get(sequence_number.saturating_sub(1) as usize)
    }

    /// schedule has no configured entries yet
    pub fn is_unconfigured(&self) -> bool {
        self.entries.is_empty()
    }
}
