use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::config::ApplicationPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{EventStore, LoanEvent};
use crate::payments::{AmortizationSchedule, FinancialSummary};
use crate::request::ValidatedApplication;
use crate::response::LoanApplicationResponse;
use crate::types::{ApplicationId, CustomerDetails, LoanStatus, LoanTerms};

/// Authoritative state of one loan application.
///
/// Fields are private: the derived EMI/total, the status and the
/// status-dependent dates only change through the operations below, each of
/// which either succeeds completely or leaves the application untouched.
#[derive(Debug, Clone)]
pub struct LoanApplication {
    // identity, assigned on first save
    pub(crate) id: Option<ApplicationId>,
    pub(crate) version: u64,

    pub(crate) customer: CustomerDetails,
    pub(crate) terms: LoanTerms,
    pub(crate) purpose: Option<String>,
    pub(crate) collateral: Option<String>,

    // derived from terms
    pub(crate) financials: FinancialSummary,

    // lifecycle
    pub(crate) status: LoanStatus,
    pub(crate) application_date: DateTime<Utc>,
    pub(crate) submitted_at: DateTime<Utc>,
    pub(crate) approval_date: Option<DateTime<Utc>>,
    pub(crate) rejection_reason: Option<String>,

    // audit
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,

    pub(crate) events: EventStore,
}

impl LoanApplication {
    /// create a submitted application from a validated request
    pub fn create_from_request(
        request: ValidatedApplication,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        let now = time_provider.now();
        let (customer, terms, purpose, collateral) = request.into_parts();

        let financials = FinancialSummary::compute(
            terms.loan_amount,
            terms.interest_rate,
            terms.term_months,
        )?;

        let mut application = Self {
            id: None,
            version: 0,
            customer,
            terms,
            purpose,
            collateral,
            financials,
            status: LoanStatus::Submitted,
            application_date: now,
            submitted_at: now,
            approval_date: None,
            rejection_reason: None,
            created_at: None,
            updated_at: None,
            events: EventStore::new(),
        };

        application.events.emit(LoanEvent::ApplicationSubmitted {
            loan_type: application.terms.loan_type.clone(),
            loan_amount: application.terms.loan_amount,
            monthly_emi: application.financials.monthly_emi,
            timestamp: now,
        });

        tracing::info!(
            loan_type = %application.terms.loan_type,
            amount = %application.terms.loan_amount,
            monthly_emi = %application.financials.monthly_emi,
            "loan application submitted"
        );

        Ok(application)
    }

    /// create with system time
    pub fn create_from_request_now(request: ValidatedApplication) -> Result<Self> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        Self::create_from_request(request, &time)
    }

    /// Recompute EMI and total from the current terms.
    ///
    /// Idempotent; on error the stored values are kept.
    pub fn recompute_financials(&mut self) -> Result<()> {
        let financials = FinancialSummary::compute(
            self.terms.loan_amount,
            self.terms.interest_rate,
            self.terms.term_months,
        )?;

        if financials != self.financials {
            tracing::debug!(
                id = ?self.id,
                old_emi = %self.financials.monthly_emi,
                new_emi = %financials.monthly_emi,
                "financials recomputed"
            );
        }
        self.financials = financials;
        Ok(())
    }

    /// Change amount, rate and term before a decision is made.
    pub fn revise_terms(
        &mut self,
        loan_amount: Money,
        interest_rate: Rate,
        term_months: u32,
        policy: &ApplicationPolicy,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        if !self.status.is_pending_decision() {
            return Err(LoanError::state(self.status, "revise terms"));
        }
        policy.check_terms(loan_amount, interest_rate, term_months)?;

        // compute before touching anything
        let financials = FinancialSummary::compute(loan_amount, interest_rate, term_months)?;
        let now = time_provider.now();
        let old_emi = self.financials.monthly_emi;

        self.terms.loan_amount = loan_amount;
        self.terms.interest_rate = interest_rate;
        self.terms.term_months = term_months;
        self.financials = financials;
        self.updated_at = Some(now);

        self.events.emit(LoanEvent::TermsRevised {
            loan_amount,
            interest_rate,
            term_months,
            old_emi,
            new_emi: financials.monthly_emi,
            timestamp: now,
        });

        tracing::info!(
            id = ?self.id,
            amount = %loan_amount,
            rate = %interest_rate,
            term_months,
            %old_emi,
            new_emi = %financials.monthly_emi,
            "loan terms revised"
        );

        Ok(())
    }

    /// hand the application to a reviewer
    pub fn start_review(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        if self.status != LoanStatus::Submitted {
            return Err(LoanError::state(self.status, "start review"));
        }
        self.transition(LoanStatus::UnderReview, None, time_provider.now());
        Ok(())
    }

    /// approve now
    pub fn approve(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        self.approve_on(time_provider.now(), time_provider)
    }

    /// approve with an explicit approval date
    pub fn approve_on(
        &mut self,
        approval_date: DateTime<Utc>,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        if !self.status.is_pending_decision() {
            return Err(LoanError::state(self.status, "approve"));
        }
        if approval_date < self.submitted_at {
            return Err(LoanError::state(
                self.status,
                format!(
                    "approve on {} before submission on {}",
                    approval_date, self.submitted_at
                ),
            ));
        }

        self.approval_date = Some(approval_date);
        self.transition(LoanStatus::Approved, None, time_provider.now());
        Ok(())
    }

    /// reject with a reason
    pub fn reject(&mut self, reason: &str, time_provider: &SafeTimeProvider) -> Result<()> {
        if !self.status.is_pending_decision() {
            return Err(LoanError::state(self.status, "reject"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LoanError::validation("rejection_reason", "rejection reason is required"));
        }

        self.rejection_reason = Some(reason.to_string());
        self.transition(
            LoanStatus::Rejected,
            Some(reason.to_string()),
            time_provider.now(),
        );
        Ok(())
    }

    /// record payout of an approved loan
    pub fn disburse(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        if self.status != LoanStatus::Approved {
            return Err(LoanError::state(self.status, "disburse"));
        }
        self.transition(LoanStatus::Disbursed, None, time_provider.now());
        Ok(())
    }

    /// close a disbursed loan
    pub fn close(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        if self.status != LoanStatus::Disbursed {
            return Err(LoanError::state(self.status, "close"));
        }
        self.transition(LoanStatus::Closed, None, time_provider.now());
        Ok(())
    }

    fn transition(&mut self, new_status: LoanStatus, reason: Option<String>, now: DateTime<Utc>) {
        let old_status = self.status;
        self.status = new_status;
        self.updated_at = Some(now);

        self.events.emit(LoanEvent::StatusChanged {
            old_status,
            new_status,
            reason,
            timestamp: now,
        });

        tracing::info!(id = ?self.id, %old_status, %new_status, "loan application status changed");
    }

    /// Check the status-dependent invariants.
    pub fn check_consistency(&self) -> Result<()> {
        if self.approval_date.is_some() != self.status.is_approved_family() {
            return Err(LoanError::state(
                self.status,
                match self.approval_date {
                    Some(_) => "carry an approval date",
                    None => "lack an approval date",
                },
            ));
        }
        if self.rejection_reason.is_some() != (self.status == LoanStatus::Rejected) {
            return Err(LoanError::state(
                self.status,
                match self.rejection_reason {
                    Some(_) => "carry a rejection reason",
                    None => "lack a rejection reason",
                },
            ));
        }
        Ok(())
    }

    /// month-by-month repayment plan starting from the approval date, or
    /// from submission while undecided
    pub fn amortization_schedule(&self) -> Result<AmortizationSchedule> {
        let start = self.approval_date.unwrap_or(self.submitted_at);
        AmortizationSchedule::generate(&self.terms, start)
    }

    /// Record the identity assigned by a persistence backend.
    pub fn mark_persisted(&mut self, id: ApplicationId, at: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at.get_or_insert(at);
        self.updated_at = Some(at);
        self.version += 1;
    }

    pub fn to_response(&self) -> LoanApplicationResponse {
        LoanApplicationResponse::from_application(self)
    }

    pub fn id(&self) -> Option<ApplicationId> {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn full_name(&self) -> String {
        self.customer.full_name()
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn collateral(&self) -> Option<&str> {
        self.collateral.as_deref()
    }

    pub fn monthly_emi(&self) -> Money {
        self.financials.monthly_emi
    }

    pub fn total_amount(&self) -> Money {
        self.financials.total_amount
    }

    pub fn total_interest(&self) -> Money {
        self.financials.total_interest(self.terms.loan_amount)
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn application_date(&self) -> DateTime<Utc> {
        self.application_date
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn approval_date(&self) -> Option<DateTime<Utc>> {
        self.approval_date
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.events
    }
}
