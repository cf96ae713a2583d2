use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::LoanApplication;
use crate::decimal::Money;
use crate::types::ApplicationId;

/// Point-in-time view of an application for API consumers.
///
/// Status is carried as its wire name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationResponse {
    pub id: Option<ApplicationId>,

    // customer details
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub user_id: Option<String>,

    // loan details
    pub loan_type: String,
    pub loan_amount: Money,
    /// annual rate in percent
    pub interest_rate: Decimal,
    pub loan_term_months: u32,
    pub monthly_emi: Money,
    pub total_amount: Money,
    pub status: String,
    pub purpose: Option<String>,
    pub collateral: Option<String>,
    pub application_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl LoanApplicationResponse {
    pub fn from_application(application: &LoanApplication) -> Self {
        let customer = application.customer();
        let terms = application.terms();

        Self {
            id: application.id(),
            first_name: customer.first_name.clone(),
            middle_name: customer.middle_name.clone(),
            last_name: customer.last_name.clone(),
            full_name: customer.full_name(),
            phone_number: customer.phone_number.clone(),
            email: customer.email.clone(),
            user_id: customer.user_id.clone(),
            loan_type: terms.loan_type.clone(),
            loan_amount: terms.loan_amount,
            interest_rate: terms.interest_rate.as_percentage(),
            loan_term_months: terms.term_months,
            monthly_emi: application.monthly_emi(),
            total_amount: application.total_amount(),
            status: application.status().as_str().to_string(),
            purpose: application.purpose().map(str::to_string),
            collateral: application.collateral().map(str::to_string),
            application_date: application.application_date(),
            approval_date: application.approval_date(),
            rejection_reason: application.rejection_reason().map(str::to_string),
            created_at: application.created_at(),
            updated_at: application.updated_at(),
            submitted_at: application.submitted_at(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }
}

impl From<&LoanApplication> for LoanApplicationResponse {
    fn from(application: &LoanApplication) -> Self {
        Self::from_application(application)
    }
}
