//! Loan application intake: the wire request, its normalization and validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::ApplicationPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::name::full_name;
use crate::types::{CustomerDetails, LoanTerms};

/// string fields checked by the derived rules, in declaration order
const STRING_FIELDS: [&str; 5] = ["first_name", "last_name", "phone_number", "email", "loan_type"];

/// Incoming application as posted by a client.
///
/// Every field is optional at the serde level so that a missing value is
/// reported as a validation failure on that field instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanApplicationRequest {
    // customer details
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "phone number is required"))]
    pub phone_number: String,
    #[validate(
        length(min = 1, message = "email is required"),
        email(message = "invalid email format")
    )]
    pub email: String,
    pub user_id: Option<String>,

    // loan details
    #[validate(length(min = 1, message = "loan type is required"))]
    pub loan_type: String,
    pub loan_amount: Option<Decimal>,
    /// annual rate in percent
    pub interest_rate: Option<Decimal>,
    pub loan_term_months: Option<i64>,
    pub purpose: Option<String>,
    pub collateral: Option<String>,
}

/// one failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<FieldViolation> for LoanError {
    fn from(v: FieldViolation) -> Self {
        LoanError::Validation {
            field: v.field,
            message: v.message,
        }
    }
}

impl LoanApplicationRequest {
    /// trim every string; blank optional fields become absent
    pub fn normalized(&self) -> Self {
        fn opt(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            first_name: self.first_name.trim().to_string(),
            middle_name: opt(&self.middle_name),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: self.email.trim().to_string(),
            user_id: opt(&self.user_id),
            loan_type: self.loan_type.trim().to_string(),
            loan_amount: self.loan_amount,
            interest_rate: self.interest_rate,
            loan_term_months: self.loan_term_months,
            purpose: opt(&self.purpose),
            collateral: opt(&self.collateral),
        }
    }

    /// display name as the applicant entered it
    pub fn full_name(&self) -> String {
        full_name(
            Some(&self.first_name),
            self.middle_name.as_deref(),
            Some(&self.last_name),
        )
    }

    /// every failed constraint, in field declaration order
    pub fn violations(&self, policy: &ApplicationPolicy) -> Vec<FieldViolation> {
        let normalized = self.normalized();
        let mut violations = normalized.string_violations();

        if let Err(v) = normalized.check_loan_amount(policy) {
            violations.push(v);
        }
        if let Err(v) = normalized.check_interest_rate(policy) {
            violations.push(v);
        }
        if let Err(v) = normalized.check_term(policy) {
            violations.push(v);
        }

        violations
    }

    /// Normalize and validate, failing on the first violated constraint.
    pub fn validate_with(&self, policy: &ApplicationPolicy) -> Result<ValidatedApplication> {
        let normalized = self.normalized();

        if let Some(violation) = normalized.string_violations().into_iter().next() {
            tracing::debug!(field = %violation.field, message = %violation.message, "loan application rejected");
            return Err(violation.into());
        }

        let numbers = normalized
            .check_loan_amount(policy)
            .and_then(|amount| {
                let rate = normalized.check_interest_rate(policy)?;
                let term = normalized.check_term(policy)?;
                Ok((amount, rate, term))
            });
        let (amount, rate, term) = match numbers {
            Ok(numbers) => numbers,
            Err(violation) => {
                tracing::debug!(field = %violation.field, message = %violation.message, "loan application rejected");
                return Err(violation.into());
            }
        };

        let LoanApplicationRequest {
            first_name,
            middle_name,
            last_name,
            phone_number,
            email,
            user_id,
            loan_type,
            purpose,
            collateral,
            ..
        } = normalized;

        Ok(ValidatedApplication {
            customer: CustomerDetails {
                first_name,
                middle_name,
                last_name,
                phone_number,
                email,
                user_id,
            },
            terms: LoanTerms {
                loan_type,
                loan_amount: Money::from_decimal(amount),
                interest_rate: rate,
                term_months: term,
            },
            purpose,
            collateral,
        })
    }

    /// validate against the default policy
    pub fn validate_default(&self) -> Result<ValidatedApplication> {
        self.validate_with(&ApplicationPolicy::default())
    }

    fn string_violations(&self) -> Vec<FieldViolation> {
        let errors = match Validate::validate(self) {
            Ok(()) => return Vec::new(),
            Err(errors) => errors,
        };
        let by_field = errors.field_errors();

        STRING_FIELDS
            .iter()
            .filter_map(|field| {
                let found = by_field.get(field)?;
                // prefer the length error for empty values
                let error = found
                    .iter()
                    .find(|e| e.code == "length")
                    .or_else(|| found.first())?;
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field.replace('_', " ")));
                Some(FieldViolation::new(field, message))
            })
            .collect()
    }

    fn check_loan_amount(&self, policy: &ApplicationPolicy) -> std::result::Result<Decimal, FieldViolation> {
        match self.loan_amount {
            None => Err(FieldViolation::new("loan_amount", "loan amount is required")),
            Some(amount) if !policy.accepts_loan_amount(amount) => {
                Err(FieldViolation::new("loan_amount", policy.loan_amount_message()))
            }
            Some(amount) => Ok(amount),
        }
    }

    fn check_interest_rate(&self, policy: &ApplicationPolicy) -> std::result::Result<Rate, FieldViolation> {
        let percent = self
            .interest_rate
            .ok_or_else(|| FieldViolation::new("interest_rate", "interest rate is required"))?;

        // validated on the stored fraction
        let rate = Rate::from_percentage(percent);
        if !policy.accepts_interest_rate(rate) {
            return Err(FieldViolation::new("interest_rate", policy.interest_rate_message()));
        }
        Ok(rate)
    }

    fn check_term(&self, policy: &ApplicationPolicy) -> std::result::Result<u32, FieldViolation> {
        let months = self
            .loan_term_months
            .ok_or_else(|| FieldViolation::new("loan_term_months", "loan term is required"))?;

        if !policy.accepts_term(months) {
            return Err(FieldViolation::new("loan_term_months", policy.term_message(months)));
        }

        u32::try_from(months)
            .map_err(|_| FieldViolation::new("loan_term_months", policy.term_message(months)))
    }
}

/// A request that passed validation, ready to become an entity.
///
/// Only obtainable through [`LoanApplicationRequest::validate_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedApplication {
    customer: CustomerDetails,
    terms: LoanTerms,
    purpose: Option<String>,
    collateral: Option<String>,
}

impl ValidatedApplication {
    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn collateral(&self) -> Option<&str> {
        self.collateral.as_deref()
    }

    pub(crate) fn into_parts(self) -> (CustomerDetails, LoanTerms, Option<String>, Option<String>) {
        (self.customer, self.terms, self.purpose, self.collateral)
    }
}
