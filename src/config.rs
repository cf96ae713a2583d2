use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// longest term any policy admits, 100 years
pub const MAX_TERM_MONTHS: u32 = 1200;

/// thresholds applied when a request is validated or terms are revised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationPolicy {
    /// smallest principal accepted, inclusive
    pub minimum_loan_amount: Decimal,
    /// inclusive floor for the annual rate in percent; `None` means any rate above zero
    pub minimum_interest_rate: Option<Decimal>,
    /// shortest term accepted, inclusive
    pub minimum_term_months: u32,
    /// longest term accepted, inclusive; capped at [`MAX_TERM_MONTHS`]
    pub maximum_term_months: Option<u32>,
}

impl Default for ApplicationPolicy {
    fn default() -> Self {
        Self {
            minimum_loan_amount: dec!(1000),
            minimum_interest_rate: None,
            minimum_term_months: 1,
            maximum_term_months: None,
        }
    }
}

impl ApplicationPolicy {
    /// parse a policy from json, missing keys fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: ApplicationPolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_minimum_loan_amount(mut self, amount: Decimal) -> Self {
        self.minimum_loan_amount = amount;
        self
    }

    pub fn with_minimum_interest_rate(mut self, rate: Decimal) -> Self {
        self.minimum_interest_rate = Some(rate);
        self
    }

    pub fn with_maximum_term_months(mut self, months: u32) -> Self {
        self.maximum_term_months = Some(months);
        self
    }

    /// reject policies that would admit a zero term, principal or rate
    pub fn validate(&self) -> Result<()> {
        if self.minimum_loan_amount <= Decimal::ZERO {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "minimum loan amount must be positive, got {}",
                    self.minimum_loan_amount
                ),
            });
        }

        if let Some(rate) = self.minimum_interest_rate {
            if rate <= Decimal::ZERO {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("minimum interest rate must be positive, got {}", rate),
                });
            }
        }

        if self.minimum_term_months == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "minimum term must be at least 1 month".to_string(),
            });
        }

        if self.minimum_term_months > MAX_TERM_MONTHS {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "minimum term {} exceeds the {} month limit",
                    self.minimum_term_months, MAX_TERM_MONTHS
                ),
            });
        }

        if let Some(max) = self.maximum_term_months {
            if max > MAX_TERM_MONTHS {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "maximum term {} exceeds the {} month limit",
                        max, MAX_TERM_MONTHS
                    ),
                });
            }
            if max < self.minimum_term_months {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "maximum term {} is below minimum term {}",
                        max, self.minimum_term_months
                    ),
                });
            }
        }

        Ok(())
    }

    /// error message for an out-of-range amount
    pub(crate) fn loan_amount_message(&self) -> String {
        format!("loan amount must be at least {}", self.minimum_loan_amount.normalize())
    }

    pub(crate) fn interest_rate_message(&self) -> String {
        match self.minimum_interest_rate {
            Some(min) => format!("interest rate must be at least {}", min.normalize()),
            None => "interest rate must be positive".to_string(),
        }
    }

    pub(crate) fn term_message(&self, months: i64) -> String {
        let max = self.maximum_term();
        if months > max as i64 {
            format!("loan term must be at most {} months", max)
        } else if self.minimum_term_months == 1 {
            "loan term must be at least 1 month".to_string()
        } else {
            format!("loan term must be at least {} months", self.minimum_term_months)
        }
    }

    pub fn accepts_loan_amount(&self, amount: Decimal) -> bool {
        amount >= self.minimum_loan_amount
    }

    /// The monthly rate derived from `rate` must stay above zero, so
    /// percentages too small to survive the conversion are refused.
    pub fn accepts_interest_rate(&self, rate: Rate) -> bool {
        if rate.monthly_rate().as_decimal() <= Decimal::ZERO {
            return false;
        }
        match self.minimum_interest_rate {
            Some(min) => rate >= Rate::from_percentage(min),
            None => true,
        }
    }

    pub fn accepts_term(&self, months: i64) -> bool {
        months >= self.minimum_term_months as i64 && months <= self.maximum_term() as i64
    }

    /// longest term in effect
    pub fn maximum_term(&self) -> u32 {
        self.maximum_term_months
            .map_or(MAX_TERM_MONTHS, |max| max.min(MAX_TERM_MONTHS))
    }

    /// check typed terms, as on revision or when loading a stored row
    pub fn check_terms(&self, loan_amount: Money, interest_rate: Rate, term_months: u32) -> Result<()> {
        if !self.accepts_loan_amount(loan_amount.as_decimal()) {
            return Err(LoanError::validation("loan_amount", self.loan_amount_message()));
        }
        if !self.accepts_interest_rate(interest_rate) {
            return Err(LoanError::validation("interest_rate", self.interest_rate_message()));
        }
        if !self.accepts_term(term_months as i64) {
            return Err(LoanError::validation(
                "loan_term_months",
                self.term_message(term_months as i64),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let policy = ApplicationPolicy::default();
        assert!(policy.accepts_loan_amount(dec!(1000)));
        assert!(!policy.accepts_loan_amount(dec!(999.99)));
        assert!(policy.accepts_interest_rate(Rate::from_percentage(dec!(0.01))));
        assert!(!policy.accepts_interest_rate(Rate::ZERO));
        assert!(!policy.accepts_interest_rate(Rate::from_percentage(dec!(-1))));
        assert!(policy.accepts_term(1));
        assert!(!policy.accepts_term(0));
        assert!(policy.accepts_term(MAX_TERM_MONTHS as i64));
        assert!(!policy.accepts_term(MAX_TERM_MONTHS as i64 + 1));
        assert!(!policy.accepts_term(4_000_000_000));
        assert_eq!(policy.loan_amount_message(), "loan amount must be at least 1000");
        assert_eq!(policy.interest_rate_message(), "interest rate must be positive");
        assert_eq!(policy.term_message(0), "loan term must be at least 1 month");
        assert_eq!(policy.term_message(4_000_000_000), "loan term must be at most 1200 months");
    }

    #[test]
    fn test_rate_vanishing_on_conversion_refused() {
        let policy = ApplicationPolicy::default();
        let tiny = Rate::from_percentage(dec!(0.0000000000000000000000000001));
        assert!(tiny.is_zero());
        assert!(!policy.accepts_interest_rate(tiny));
    }

    #[test]
    fn test_check_terms() {
        let policy = ApplicationPolicy::default();
        assert!(policy
            .check_terms(Money::from_major(1_000), Rate::from_percentage(dec!(12)), 12)
            .is_ok());

        let err = policy
            .check_terms(Money::from_major(500), Rate::from_percentage(dec!(12)), 12)
            .unwrap_err();
        assert!(matches!(err, LoanError::Validation { ref field, .. } if field == "loan_amount"));

        let err = policy
            .check_terms(Money::from_major(1_000), Rate::ZERO, 12)
            .unwrap_err();
        assert!(matches!(err, LoanError::Validation { ref field, .. } if field == "interest_rate"));

        let err = policy
            .check_terms(Money::from_major(1_000), Rate::from_percentage(dec!(12)), u32::MAX)
            .unwrap_err();
        assert!(matches!(err, LoanError::Validation { ref field, .. } if field == "loan_term_months"));
    }

    #[test]
    fn test_maximum_term_capped() {
        assert_eq!(ApplicationPolicy::default().maximum_term(), MAX_TERM_MONTHS);
        let err = ApplicationPolicy::from_json(r#"{"maximumTermMonths": 5000}"#).unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_inclusive_rate_floor() {
        let policy = ApplicationPolicy::default().with_minimum_interest_rate(dec!(0.1));
        assert!(policy.accepts_interest_rate(Rate::from_percentage(dec!(0.1))));
        assert!(!policy.accepts_interest_rate(Rate::from_percentage(dec!(0.09))));
        assert_eq!(policy.interest_rate_message(), "interest rate must be at least 0.1");
    }

    #[test]
    fn test_from_json_partial() {
        let policy = ApplicationPolicy::from_json(r#"{"maximumTermMonths": 360}"#).unwrap();
        assert_eq!(policy.maximum_term_months, Some(360));
        assert_eq!(policy.minimum_loan_amount, dec!(1000));
        assert!(!policy.accepts_term(361));
        assert_eq!(policy.term_message(361), "loan term must be at most 360 months");
    }

    #[test]
    fn test_from_json_rejects_inconsistent_policy() {
        let err = ApplicationPolicy::from_json(r#"{"minimumTermMonths": 0}"#).unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));

        let err = ApplicationPolicy::from_json(
            r#"{"minimumTermMonths": 12, "maximumTermMonths": 6}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }
}
