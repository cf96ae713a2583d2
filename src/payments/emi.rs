use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::decimal::{round_currency, Money, Rate};
use crate::errors::{LoanError, Result};

/// monthly installment and total repayable for a set of terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub monthly_emi: Money,
    pub total_amount: Money,
}

impl FinancialSummary {
    /// total is the rounded EMI times the term
    pub fn compute(principal: Money, annual_rate: Rate, months: u32) -> Result<Self> {
        let monthly_emi = calculate_emi(principal, annual_rate, months)?;

        let total_amount = monthly_emi.checked_times(months).ok_or_else(|| {
            LoanError::computation(format!(
                "total amount overflows for emi {} over {} months",
                monthly_emi, months
            ))
        })?;

        Ok(Self {
            monthly_emi,
            total_amount,
        })
    }

    pub fn total_interest(&self, principal: Money) -> Money {
        self.total_amount - principal
    }
}

/// calculate EMI rounded half-up to cents
pub fn calculate_emi(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    let emi = round_currency(raw_emi(principal, annual_rate, months)?);

    if emi <= Decimal::ZERO {
        return Err(LoanError::computation(format!(
            "non-positive emi {} for principal {} at {} over {} months",
            emi, principal, annual_rate, months
        )));
    }

    Ok(Money::from_decimal(emi))
}

/// unrounded EMI
///
/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1), or P / n when r is zero
pub(crate) fn raw_emi(principal: Money, annual_rate: Rate, months: u32) -> Result<Decimal> {
    if months == 0 {
        return Err(LoanError::computation("loan term of 0 months"));
    }
    if annual_rate.as_decimal() < Decimal::ZERO {
        return Err(LoanError::computation(format!(
            "negative interest rate {}",
            annual_rate
        )));
    }

    let p = principal.as_decimal();
    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return Ok(p / Decimal::from(months));
    }

    let compound = compound_factor(Decimal::ONE + r, months)?;
    let overflow = || {
        LoanError::computation(format!(
            "emi overflows for principal {} at {} over {} months",
            principal, annual_rate, months
        ))
    };

    let numerator = p
        .checked_mul(r)
        .and_then(|x| x.checked_mul(compound))
        .ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;

    numerator.checked_div(denominator).ok_or_else(|| {
        LoanError::computation(format!(
            "degenerate compounding factor {} for rate {}",
            compound, annual_rate
        ))
    })
}

/// (base)^n by repeated squaring
fn compound_factor(base: Decimal, n: u32) -> Result<Decimal> {
    base.checked_powu(u64::from(n)).ok_or_else(|| {
        LoanError::computation(format!("compounding {} over {} periods overflows", base, n))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary(principal: i64, rate: Decimal, months: u32) -> FinancialSummary {
        FinancialSummary::compute(
            Money::from_major(principal),
            Rate::from_percentage(rate),
            months,
        )
        .unwrap()
    }

    #[test]
    fn test_reference_values() {
        let s = summary(120_000, dec!(10), 12);
        assert_eq!(s.monthly_emi, Money::from_str_exact("10549.91").unwrap());
        assert_eq!(s.total_amount, Money::from_str_exact("126598.92").unwrap());

        let s = summary(1_000, dec!(12), 12);
        assert_eq!(s.monthly_emi, Money::from_str_exact("88.85").unwrap());
        assert_eq!(s.total_amount, Money::from_str_exact("1066.20").unwrap());

        let s = summary(250_000, dec!(7.25), 360);
        assert_eq!(s.monthly_emi, Money::from_str_exact("1705.44").unwrap());
        assert_eq!(s.total_amount, Money::from_str_exact("613958.40").unwrap());
    }

    #[test]
    fn test_single_month_term() {
        let s = summary(1_000, dec!(12), 1);
        assert_eq!(s.monthly_emi, Money::from_str_exact("1010.00").unwrap());
        assert_eq!(s.total_amount, s.monthly_emi);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let s = summary(1_000, Decimal::ZERO, 3);
        assert_eq!(s.monthly_emi, Money::from_str_exact("333.33").unwrap());
        assert_eq!(s.total_amount, Money::from_str_exact("999.99").unwrap());
    }

    #[test]
    fn test_total_is_rounded_emi_times_term() {
        for (principal, rate, months) in [
            (1_000, dec!(0.1), 1),
            (5_000, dec!(15), 24),
            (75_000, dec!(9.99), 84),
            (500_000, dec!(8.5), 240),
        ] {
            let s = summary(principal, rate, months);
            assert!(s.monthly_emi.is_positive());
            assert_eq!(
                s.total_amount.as_decimal(),
                round_currency(s.monthly_emi.as_decimal() * Decimal::from(months))
            );
            assert!(s.total_amount >= Money::from_major(principal));
        }
    }

    #[test]
    fn test_zero_term_is_computation_error() {
        let err = calculate_emi(Money::from_major(1_000), Rate::from_percentage(dec!(10)), 0)
            .unwrap_err();
        assert!(matches!(err, LoanError::Computation { .. }));
    }

    #[test]
    fn test_longest_terms_finish() {
        let s = summary(250_000, dec!(6), crate::config::MAX_TERM_MONTHS);
        assert!(s.monthly_emi > Money::from_major(1_250));
        assert!(s.monthly_emi < Money::from_major(1_260));

        // rounds to zero cents
        let err = calculate_emi(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(0.000001)),
            u32::MAX,
        )
        .unwrap_err();
        assert!(matches!(err, LoanError::Computation { .. }));
    }

    #[test]
    fn test_overflow_is_computation_error() {
        let err = calculate_emi(
            Money::from_major(1_000_000),
            Rate::from_percentage(dec!(5000)),
            600,
        )
        .unwrap_err();
        assert!(matches!(err, LoanError::Computation { .. }));
    }
}
