use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MAX_TERM_MONTHS;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::LoanTerms;

use super::emi::calculate_emi;

/// scheduled payment in amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub due_date: DateTime<Utc>,
    pub opening_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub closing_balance: Money,
    pub cumulative_interest: Money,
}

/// reducing-balance amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub start_date: DateTime<Utc>,
    pub monthly_emi: Money,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate payment schedule, first payment one month after `start_date`
    pub fn generate(terms: &LoanTerms, start_date: DateTime<Utc>) -> Result<Self> {
        let principal = terms.loan_amount;
        let months = terms.term_months;
        if months > MAX_TERM_MONTHS {
            return Err(LoanError::computation(format!(
                "schedule of {} payments exceeds the {} month limit",
                months, MAX_TERM_MONTHS
            )));
        }
        let monthly_rate = terms.interest_rate.monthly_rate().as_decimal();
        let emi = calculate_emi(principal, terms.interest_rate, months)?;

        let mut payments = Vec::with_capacity(months as usize);
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;

        for i in 1..=months {
            let due_date = start_date
                .checked_add_months(Months::new(i))
                .ok_or_else(|| {
                    LoanError::computation(format!(
                        "due date for payment {} falls outside the calendar",
                        i
                    ))
                })?;

            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate);

            // last payment absorbs rounding residue
            let principal_portion = if i == months {
                balance
            } else {
                (emi - interest_portion).min(balance)
            };
            let payment_amount = principal_portion + interest_portion;
            let closing_balance = balance - principal_portion;

            cumulative_interest += interest_portion;

            payments.push(ScheduledPayment {
                payment_number: i,
                due_date,
                opening_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                closing_balance,
                cumulative_interest,
            });

            balance = closing_balance;
        }

        let total_payment = payments
            .iter()
            .map(|p| p.payment_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            principal,
            interest_rate: terms.interest_rate,
            term_months: months,
            start_date,
            monthly_emi: emi,
            payments,
            total_interest: cumulative_interest,
            total_payment,
        })
    }

    /// get payment for specific period, numbered from 1
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }

    /// remaining balance after payment, principal before the first
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        self.get_payment(payment_number)
            .map(|p| p.closing_balance)
            .unwrap_or(self.principal)
    }

    pub fn final_payment(&self) -> Option<&ScheduledPayment> {
        self.payments.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn terms(amount: i64, rate: Decimal, months: u32) -> LoanTerms {
        LoanTerms {
            loan_type: "PERSONAL".to_string(),
            loan_amount: Money::from_major(amount),
            interest_rate: Rate::from_percentage(rate),
            term_months: months,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let schedule = AmortizationSchedule::generate(&terms(120_000, dec!(10), 12), start()).unwrap();

        assert_eq!(schedule.payments.len(), 12);
        assert_eq!(schedule.monthly_emi, Money::from_str_exact("10549.91").unwrap());

        let first = schedule.get_payment(1).unwrap();
        assert_eq!(first.opening_balance, Money::from_major(120_000));
        assert_eq!(first.interest_portion, Money::from_major(1_000));
        assert_eq!(first.principal_portion, Money::from_str_exact("9549.91").unwrap());

        let last = schedule.final_payment().unwrap();
        assert_eq!(last.closing_balance, Money::ZERO);
        // residue stays within a few cents of the regular installment
        assert!((last.payment_amount - schedule.monthly_emi).abs() < Money::ONE);

        let principal_paid = schedule
            .payments
            .iter()
            .fold(Money::ZERO, |acc, p| acc + p.principal_portion);
        assert_eq!(principal_paid, schedule.principal);
        assert_eq!(schedule.total_payment, schedule.principal + schedule.total_interest);
    }

    #[test]
    fn test_interest_declines_each_month() {
        let schedule = AmortizationSchedule::generate(&terms(10_000, dec!(12), 36), start()).unwrap();
        for pair in schedule.payments.windows(2) {
            assert!(pair[1].interest_portion < pair[0].interest_portion);
            assert_eq!(pair[1].opening_balance, pair[0].closing_balance);
        }
    }

    #[test]
    fn test_due_dates_clamp_to_month_end() {
        let schedule = AmortizationSchedule::generate(&terms(1_000, dec!(12), 3), start()).unwrap();
        let dates: Vec<_> = schedule.payments.iter().map(|p| p.due_date).collect();
        assert_eq!(dates[0], Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(dates[1], Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap());
        assert_eq!(dates[2], Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_term_beyond_limit_refused() {
        let err = AmortizationSchedule::generate(&terms(1_000, dec!(0.000001), u32::MAX), start())
            .unwrap_err();
        assert!(matches!(err, LoanError::Computation { .. }));

        let schedule =
            AmortizationSchedule::generate(&terms(250_000, dec!(6), MAX_TERM_MONTHS), start()).unwrap();
        assert_eq!(schedule.payments.len(), MAX_TERM_MONTHS as usize);
        assert_eq!(schedule.balance_after_payment(MAX_TERM_MONTHS), Money::ZERO);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule = AmortizationSchedule::generate(&terms(1_000, Decimal::ZERO, 3), start()).unwrap();
        assert_eq!(schedule.total_interest, Money::ZERO);
        assert_eq!(
            schedule.final_payment().unwrap().payment_amount,
            Money::from_str_exact("333.34").unwrap()
        );
        assert_eq!(schedule.balance_after_payment(0), Money::from_major(1_000));
        assert_eq!(schedule.balance_after_payment(3), Money::ZERO);
    }
}
