use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{Money, Rate};
use crate::name::full_name;

/// identifier assigned by the persistence layer
pub type ApplicationId = u64;

/// loan application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// received, awaiting review
    Submitted,
    /// picked up by a reviewer
    UnderReview,
    /// approved, not yet paid out
    Approved,
    /// declined with a reason
    Rejected,
    /// funds paid out
    Disbursed,
    /// fully repaid or otherwise closed
    Closed,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 6] = [
        LoanStatus::Submitted,
        LoanStatus::UnderReview,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Disbursed,
        LoanStatus::Closed,
    ];

    /// wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Submitted => "SUBMITTED",
            LoanStatus::UnderReview => "UNDER_REVIEW",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Disbursed => "DISBURSED",
            LoanStatus::Closed => "CLOSED",
        }
    }

    /// statuses that carry an approval date
    pub fn is_approved_family(&self) -> bool {
        matches!(
            self,
            LoanStatus::Approved | LoanStatus::Disbursed | LoanStatus::Closed
        )
    }

    /// still waiting on an approve/reject decision
    pub fn is_pending_decision(&self) -> bool {
        matches!(self, LoanStatus::Submitted | LoanStatus::UnderReview)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        LoanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown loan status: {}", s))
    }
}

/// customer identity carried by an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub user_id: Option<String>,
}

impl CustomerDetails {
    pub fn full_name(&self) -> String {
        full_name(
            Some(&self.first_name),
            self.middle_name.as_deref(),
            Some(&self.last_name),
        )
    }
}

/// the three terms EMI is computed from, plus the product name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_type: String,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(LoanStatus::UnderReview.to_string(), "UNDER_REVIEW");
        assert_eq!(
            serde_json::to_string(&LoanStatus::Approved).unwrap(),
            "\"APPROVED\""
        );
        let parsed: LoanStatus = serde_json::from_str("\"DISBURSED\"").unwrap();
        assert_eq!(parsed, LoanStatus::Disbursed);
    }

    #[test]
    fn test_status_from_str_ignores_case() {
        assert_eq!("rejected".parse::<LoanStatus>(), Ok(LoanStatus::Rejected));
        assert_eq!(" under_review ".parse::<LoanStatus>(), Ok(LoanStatus::UnderReview));
        assert!("PENDING".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_approved_family() {
        let family: Vec<_> = LoanStatus::ALL
            .into_iter()
            .filter(LoanStatus::is_approved_family)
            .collect();
        assert_eq!(
            family,
            vec![LoanStatus::Approved, LoanStatus::Disbursed, LoanStatus::Closed]
        );
    }
}
