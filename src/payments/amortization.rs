use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{round_half_up, Money, Rate, CURRENCY_DP};
use crate::errors::{RegistryError, Result};

/// derived repayment figures stored on a credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTerms {
    pub monthly_installment: Money,
    pub total_payable: Money,
}

/// Level monthly installment for `principal` at `annual_rate`, rounded half-up to cents.
///
/// A zero rate degrades to straight-line repayment (`principal / term_months`).
pub fn compute_installment(principal: Money, annual_rate: Rate, term_months: i32) -> Result<Money> {
    if !principal.is_positive() {
        return Err(RegistryError::InvalidInput {
            field: "principal",
            message: format!("must be greater than 0, got {}", principal),
        });
    }
    if annual_rate.as_percent() < Decimal::ZERO {
        return Err(RegistryError::InvalidInput {
            field: "annual_rate",
            message: format!("must not be negative, got {}", annual_rate),
        });
    }
    if term_months < 1 {
        return Err(RegistryError::InvalidInput {
            field: "term_months",
            message: format!("must be at least 1, got {}", term_months),
        });
    }

    let r = annual_rate.monthly_rate();
    let n = Decimal::from(term_months);

    if r.is_zero() {
        return Ok(Money::from_decimal(round_half_up(principal.as_decimal() / n, CURRENCY_DP)));
    }

    // installment = P * r * (1 + r)^n / ((1 + r)^n - 1)
    let compound = checked_powu(Decimal::ONE + r, term_months as u64).ok_or_else(overflow)?;
    let numerator = principal
        .as_decimal()
        .checked_mul(r)
        .and_then(|v| v.checked_mul(compound))
        .ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;
    let installment = numerator.checked_div(denominator).ok_or_else(overflow)?;

    Ok(Money::from_decimal(round_half_up(installment, CURRENCY_DP)))
}

/// total payable over the whole term; exact product of the already rounded installment
pub fn compute_total_payable(installment: Money, term_months: i32) -> Result<Money> {
    installment
        .as_decimal()
        .checked_mul(Decimal::from(term_months))
        .map(Money::from_decimal)
        .ok_or_else(|| RegistryError::CalculationError {
            message: "total payable exceeds decimal range".to_string(),
        })
}

/// Derive installment and total payable, or `None` when any input is absent.
///
/// Callers must treat `None` as "leave the derived fields empty".
pub fn derive_terms(
    principal: Option<Money>,
    annual_rate: Option<Rate>,
    term_months: Option<i32>,
) -> Result<Option<CreditTerms>> {
    let (Some(principal), Some(rate), Some(term)) = (principal, annual_rate, term_months) else {
        return Ok(None);
    };

    let monthly_installment = compute_installment(principal, rate, term)?;
    Ok(Some(CreditTerms {
        monthly_installment,
        total_payable: compute_total_payable(monthly_installment, term)?,
    }))
}

fn overflow() -> RegistryError {
    RegistryError::CalculationError {
        message: "installment exceeds decimal range".to_string(),
    }
}

/// exponentiation by squaring with overflow detection
fn checked_powu(base: Decimal, mut exp: u64) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut factor = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(factor)?;
        }
        exp >>= 1;
        if exp > 0 {
            factor = factor.checked_mul(factor)?;
        }
    }
    Some(result)
}

/// scheduled payment in amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub payment_date: DateTime<Utc>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// month-by-month repayment plan for a credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: i32,
    pub start_date: DateTime<Utc>,
    pub monthly_installment: Money,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate equal-installment schedule, first payment one month after `start_date`
    pub fn generate(
        principal: Money,
        interest_rate: Rate,
        term_months: i32,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        let installment = compute_installment(principal, interest_rate, term_months)?;
        let monthly_rate = interest_rate.monthly_rate();

        // the final payment date bounds the whole plan
        if start_date.checked_add_months(Months::new(term_months as u32)).is_none() {
            return Err(RegistryError::CalculationError {
                message: format!("a {}-month schedule runs past the supported date range", term_months),
            });
        }

        let mut payments = Vec::new();
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;

        for i in 1..=term_months as u32 {
            let payment_date = start_date
                .checked_add_months(Months::new(i))
                .ok_or_else(|| RegistryError::CalculationError {
                    message: format!("payment date {} out of range", i),
                })?;
            let interest_portion = (balance * monthly_rate).round_currency();

            // last payment absorbs rounding residue
            let (payment_amount, principal_portion) = if i == term_months as u32 {
                (balance + interest_portion, balance)
            } else {
                (installment, installment - interest_portion)
            };

            cumulative_interest += interest_portion;
            let ending_balance = (balance - principal_portion).max(Money::ZERO);

            payments.push(ScheduledPayment {
                payment_number: i,
                payment_date,
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        let total_payment = payments.iter().map(|p| p.payment_amount).sum();

        Ok(Self {
            principal,
            interest_rate,
            term_months,
            start_date,
            monthly_installment: installment,
            payments,
            total_interest: cumulative_interest,
            total_payment,
        })
    }

    /// get payment for specific period (1-based)
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_installment_twelve_percent_one_year() {
        let installment =
            compute_installment(Money::from_major(50_000), Rate::from_percentage(12), 12).unwrap();
        assert_eq!(installment, Money::from_decimal(dec!(4442.44)));

        let total = compute_total_payable(installment, 12).unwrap();
        assert_eq!(total, Money::from_decimal(dec!(53309.28)));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let installment = compute_installment(Money::from_major(12_000), Rate::ZERO, 12).unwrap();
        assert_eq!(installment, Money::from_decimal(dec!(1000.00)));
        assert_eq!(compute_total_payable(installment, 12).unwrap(), Money::from_major(12_000));
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let rate = Rate::from_percentage(10);
        assert!(matches!(
            compute_installment(Money::ZERO, rate, 12),
            Err(RegistryError::InvalidInput { field: "principal", .. })
        ));
        assert!(matches!(
            compute_installment(Money::from_major(100), rate, 0),
            Err(RegistryError::InvalidInput { field: "term_months", .. })
        ));
        assert!(matches!(
            compute_installment(Money::from_major(100), rate, -3),
            Err(RegistryError::InvalidInput { field: "term_months", .. })
        ));
        assert!(matches!(
            compute_installment(Money::from_major(100), Rate::from_percent(dec!(-1)), 12),
            Err(RegistryError::InvalidInput { field: "annual_rate", .. })
        ));
    }

    #[test]
    fn test_missing_inputs_are_not_computable() {
        let rate = Some(Rate::from_percentage(12));
        assert_eq!(derive_terms(None, rate, Some(12)).unwrap(), None);
        assert_eq!(derive_terms(Some(Money::from_major(100)), None, Some(12)).unwrap(), None);
        assert_eq!(derive_terms(Some(Money::from_major(100)), rate, None).unwrap(), None);

        let terms = derive_terms(Some(Money::from_major(50_000)), rate, Some(12))
            .unwrap()
            .unwrap();
        assert_eq!(terms.monthly_installment, Money::from_decimal(dec!(4442.44)));
        assert_eq!(terms.total_payable, Money::from_decimal(dec!(53309.28)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = compute_installment(Money::from_major(1_000), Rate::from_percentage(999), 3_600);
        assert!(matches!(result, Err(RegistryError::CalculationError { .. })));
    }

    #[test]
    fn test_total_payable_overflow_is_reported() {
        let installment = compute_installment(Money::from_decimal(Decimal::MAX / dec!(2)), Rate::ZERO, 1).unwrap();
        assert!(matches!(
            compute_total_payable(installment, 3),
            Err(RegistryError::CalculationError { .. })
        ));
    }

    #[test]
    fn test_schedule_past_date_range_is_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let result = AmortizationSchedule::generate(Money::from_major(1_000), Rate::ZERO, 200_000_000, start);
        assert!(matches!(result, Err(RegistryError::CalculationError { .. })));
    }

    #[test]
    fn test_schedule_pays_off_principal() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let schedule =
            AmortizationSchedule::generate(Money::from_major(50_000), Rate::from_percentage(12), 12, start)
                .unwrap();

        assert_eq!(schedule.payments.len(), 12);
        assert_eq!(schedule.monthly_installment, Money::from_decimal(dec!(4442.44)));

        let first = schedule.get_payment(1).unwrap();
        assert_eq!(first.interest_portion, Money::from_major(500));
        assert_eq!(first.principal_portion, Money::from_decimal(dec!(3942.44)));
        // month-end clipping
        assert_eq!(first.payment_date, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());

        let last = schedule.get_payment(12).unwrap();
        assert_eq!(last.ending_balance, Money::ZERO);
        assert!((last.payment_amount - schedule.monthly_installment).abs() < Money::from_major(1));

        let principal_paid: Money = schedule.payments.iter().map(|p| p.principal_portion).sum();
        assert_eq!(principal_paid, Money::from_major(50_000));
        assert_eq!(schedule.total_payment, principal_paid + schedule.total_interest);
        assert!(schedule.get_payment(0).is_none());
        assert!(schedule.get_payment(13).is_none());
    }

    #[test]
    fn test_interest_declines_each_month() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let schedule =
            AmortizationSchedule::generate(Money::from_major(100_000), Rate::from_percentage(18), 24, start)
                .unwrap();

        for i in 1..schedule.payments.len() {
            assert!(schedule.payments[i].interest_portion < schedule.payments[i - 1].interest_portion);
        }
    }

    proptest! {
        #[test]
        fn prop_total_payable_matches_schedule(
            cents in 100_000i64..1_000_000_000,
            rate_bp in 1i64..2_400,
            term in 1i32..=120,
        ) {
            let principal = Money::from_minor(cents);
            let rate = Rate::from_percent(Decimal::new(rate_bp, 2));
            let installment = compute_installment(principal, rate, term).unwrap();
            let total = compute_total_payable(installment, term).unwrap();

            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let schedule = AmortizationSchedule::generate(principal, rate, term, start).unwrap();

            // up to a cent of rounding per month, compounded at the monthly rate
            let r = rate.monthly_rate();
            let growth = checked_powu(Decimal::ONE + r, term as u64).unwrap();
            let tolerance = Money::from_minor(1) * ((growth - Decimal::ONE) / r) + Money::from_minor(1);
            prop_assert!(
                (total - schedule.total_payment).abs() <= tolerance,
                "total {} schedule {} tolerance {}",
                total,
                schedule.total_payment,
                tolerance
            );
            prop_assert!(total >= principal - Money::from_minor(term as i64));
        }

        #[test]
        fn prop_installment_grows_with_rate(
            cents in 100i64..1_000_000_000,
            low_bp in 1i64..5_000,
            step_bp in 1i64..5_000,
            term in 1i32..=360,
        ) {
            let principal = Money::from_minor(cents);
            let low = compute_installment(principal, Rate::from_percent(Decimal::new(low_bp, 2)), term).unwrap();
            let high = compute_installment(
                principal,
                Rate::from_percent(Decimal::new(low_bp + step_bp, 2)),
                term,
            ).unwrap();
            prop_assert!(high >= low);
        }
    }
}
