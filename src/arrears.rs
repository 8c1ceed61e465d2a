use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::ArrearsKind;

/// upper bound on days late before computing, 10 years
///
/// Corrupted or mistyped dates must not produce absurd interest figures;
/// anything later is treated as exactly 10 years late.
pub const MAX_DAYS_LATE: i64 = 3650;

/// interest never exceeds this multiple of the original amount
pub const INTEREST_CAP_MULTIPLE: Decimal = dec!(10);

/// days-to-months divisor; months are fixed at 30 days here, fractional
/// results allowed, independent of the calendar arithmetic in due dates
const DAYS_PER_MONTH: Decimal = dec!(30);

/// arrears interest calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrearsCalculation {
    pub interest: Money,
    pub total: Money,
    /// fractional elapsed months after clamping
    pub months_late: Decimal,
    /// days actually charged, after the 10-year clamp
    pub days_charged: i64,
    /// the 10x interest cap kicked in
    pub capped: bool,
}

impl ArrearsCalculation {
    fn none(original_amount: Money) -> Self {
        Self {
            interest: Money::ZERO,
            total: original_amount,
            months_late: Decimal::ZERO,
            days_charged: 0,
            capped: false,
        }
    }
}

/// compute arrears interest on a late amount
///
/// No interest accrues for zero/negative days late or a zero/negative rate.
pub fn calculate_arrears(
    original_amount: Money,
    days_late: i64,
    monthly_rate: Rate,
    kind: ArrearsKind,
) -> ArrearsCalculation {
    if days_late <= 0 || monthly_rate.is_effectively_zero() || !original_amount.is_positive() {
        return ArrearsCalculation::none(original_amount);
    }

    let days_charged = days_late.min(MAX_DAYS_LATE);
    let months_late = Decimal::from(days_charged) / DAYS_PER_MONTH;
    let rate_fraction = monthly_rate.as_fraction();
    let principal = original_amount.as_decimal();

    let raw_interest = match kind {
        ArrearsKind::Simple => principal * rate_fraction * months_late,
        ArrearsKind::Compound => {
            let base = Decimal::ONE + rate_fraction;
            let whole_months = months_late.trunc().to_i64().unwrap_or(0);
            let frac_months = months_late.fract();
            let mut factor = if frac_months.is_zero() {
                Decimal::ONE
            } else {
                base.powd(frac_months)
            };
            // growth past this factor is already beyond the cap; stopping
            // early keeps high rates from overflowing Decimal
            let runaway = INTEREST_CAP_MULTIPLE + dec!(2);
            for _ in 0..whole_months {
                factor *= base;
                if factor > runaway {
                    break;
                }
            }
            principal * factor.min(runaway) - principal
        }
    };

    let cap = principal * INTEREST_CAP_MULTIPLE;
    let capped = raw_interest > cap;
    let interest = Money::from_decimal(raw_interest.min(cap));

    ArrearsCalculation {
        interest,
        total: original_amount + interest,
        months_late,
        days_charged,
        capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_interest_two_months() {
        // 10000 at 2% monthly, 60 days late -> 2 months -> 400
        let result = calculate_arrears(
            Money::from_major(10_000),
            60,
            Rate::from_percentage(2),
            ArrearsKind::Simple,
        );
        assert_eq!(result.interest, Money::from_major(400));
        assert_eq!(result.total, Money::from_major(10_400));
        assert_eq!(result.months_late, dec!(2));
        assert!(!result.capped);
    }

    #[test]
    fn test_compound_interest_two_months() {
        // 10000 x 1.02^2 = 10404
        let result = calculate_arrears(
            Money::from_major(10_000),
            60,
            Rate::from_percentage(2),
            ArrearsKind::Compound,
        );
        assert_eq!(result.interest, Money::from_major(404));
        assert_eq!(result.total, Money::from_major(10_404));
    }

    #[test]
    fn test_fractional_months() {
        // 45 days -> 1.5 months simple: 10000 * 0.02 * 1.5 = 300
        let result = calculate_arrears(
            Money::from_major(10_000),
            45,
            Rate::from_percentage(2),
            ArrearsKind::Simple,
        );
        assert_eq!(result.interest, Money::from_major(300));
        assert_eq!(result.months_late, dec!(1.5));
    }

    #[test]
    fn test_no_interest_when_not_late() {
        for days in [0, -1, -365] {
            let result = calculate_arrears(
                Money::from_major(10_000),
                days,
                Rate::from_percentage(2),
                ArrearsKind::Simple,
            );
            assert_eq!(result.interest, Money::ZERO);
            assert_eq!(result.total, Money::from_major(10_000));
        }
    }

    #[test]
    fn test_no_interest_at_zero_rate() {
        let result = calculate_arrears(
            Money::from_major(10_000),
            60,
            Rate::ZERO,
            ArrearsKind::Compound,
        );
        assert_eq!(result.interest, Money::ZERO);
    }

    #[test]
    fn test_days_late_clamped_to_ten_years() {
        let clamped = calculate_arrears(
            Money::from_major(100),
            1_000_000,
            Rate::from_percentage(1),
            ArrearsKind::Simple,
        );
        let at_limit = calculate_arrears(
            Money::from_major(100),
            MAX_DAYS_LATE,
            Rate::from_percentage(1),
            ArrearsKind::Simple,
        );
        assert_eq!(clamped.interest, at_limit.interest);
        assert_eq!(clamped.days_charged, MAX_DAYS_LATE);
    }

    #[test]
    fn test_interest_capped_at_ten_times_principal() {
        // 50% monthly compounding over 10 years would dwarf the principal
        let result = calculate_arrears(
            Money::from_major(1_000),
            MAX_DAYS_LATE,
            Rate::from_percentage(50),
            ArrearsKind::Compound,
        );
        assert!(result.capped);
        assert_eq!(result.interest, Money::from_major(10_000));
        assert_eq!(result.total, Money::from_major(11_000));
    }

    #[test]
    fn test_simple_hits_cap_too() {
        // 10% monthly simple over 120 months = 12x principal, capped to 10x
        let result = calculate_arrears(
            Money::from_major(1_000),
            MAX_DAYS_LATE,
            Rate::from_percentage(10),
            ArrearsKind::Simple,
        );
        assert!(result.capped);
        assert_eq!(result.interest, Money::from_major(10_000));
    }

    proptest! {
        #[test]
        fn prop_interest_monotonic_in_days_late(
            cents in 1i64..=100_000_000,
            d1 in 0i64..=MAX_DAYS_LATE,
            d2 in 0i64..=MAX_DAYS_LATE,
            rate in 0u32..=100,
            compound in proptest::bool::ANY,
        ) {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let kind = if compound { ArrearsKind::Compound } else { ArrearsKind::Simple };
            let amount = Money::from_cents(cents);
            let a = calculate_arrears(amount, lo, Rate::from_percentage(rate), kind);
            let b = calculate_arrears(amount, hi, Rate::from_percentage(rate), kind);
            prop_assert!(a.interest <= b.interest);
        }

        #[test]
        fn prop_interest_never_exceeds_cap(
            cents in 1i64..=100_000_000,
            days in -100i64..=100_000,
            rate in 0u32..=1_000,
            compound in proptest::bool::ANY,
        ) {
            let kind = if compound { ArrearsKind::Compound } else { ArrearsKind::Simple };
            let amount = Money::from_cents(cents);
            let result = calculate_arrears(amount, days, Rate::from_percentage(rate), kind);
            prop_assert!(result.interest <= amount * INTEREST_CAP_MULTIPLE);
            prop_assert!(result.interest >= Money::ZERO);
            prop_assert_eq!(result.total, amount + result.interest);
        }

        #[test]
        fn prop_not_late_means_no_interest(
            cents in 1i64..=100_000_000,
            days in -10_000i64..=0,
            rate in 0u32..=1_000,
        ) {
            let amount = Money::from_cents(cents);
            let result = calculate_arrears(amount, days, Rate::from_percentage(rate), ArrearsKind::Compound);
            prop_assert_eq!(result.interest, Money::ZERO);
            prop_assert_eq!(result.total, amount);
        }
    }
}
