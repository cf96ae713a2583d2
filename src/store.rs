//! Persistence seam for loan applications.
//!
//! Backends assign ids and audit timestamps and reject stale writes by
//! comparing versions. [`InMemoryLoanRepository`] is the reference backend.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::application::LoanApplication;
use crate::config::ApplicationPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{EventStore, RecordedEvent};
use crate::payments::FinancialSummary;
use crate::types::{ApplicationId, CustomerDetails, LoanStatus, LoanTerms};

/// Row shape of a persisted application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationRecord {
    pub id: ApplicationId,
    pub version: u64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub user_id: Option<String>,
    pub loan_type: String,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub loan_term_months: u32,
    pub monthly_emi: Money,
    pub total_amount: Money,
    pub status: LoanStatus,
    pub purpose: Option<String>,
    pub collateral: Option<String>,
    pub application_date: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanApplication {
    /// row for a persisted application, `None` before the first save
    pub fn to_record(&self) -> Option<LoanApplicationRecord> {
        let id = self.id?;
        let created_at = self.created_at?;

        Some(LoanApplicationRecord {
            id,
            version: self.version,
            first_name: self.customer.first_name.clone(),
            middle_name: self.customer.middle_name.clone(),
            last_name: self.customer.last_name.clone(),
            phone_number: self.customer.phone_number.clone(),
            email: self.customer.email.clone(),
            user_id: self.customer.user_id.clone(),
            loan_type: self.terms.loan_type.clone(),
            loan_amount: self.terms.loan_amount,
            interest_rate: self.terms.interest_rate,
            loan_term_months: self.terms.term_months,
            monthly_emi: self.financials.monthly_emi,
            total_amount: self.financials.total_amount,
            status: self.status,
            purpose: self.purpose.clone(),
            collateral: self.collateral.clone(),
            application_date: self.application_date,
            submitted_at: self.submitted_at,
            approval_date: self.approval_date,
            rejection_reason: self.rejection_reason.clone(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }

    /// Rebuild an application from a stored row under the default policy.
    pub fn from_record(record: LoanApplicationRecord) -> Result<Self> {
        Self::from_record_with(record, &ApplicationPolicy::default())
    }

    /// Rebuild an application from a stored row.
    ///
    /// Terms must satisfy `policy`. EMI and total are recomputed from the
    /// stored terms; stored values that disagree are discarded.
    /// Status-dependent fields must agree with the status or the row is
    /// refused.
    pub fn from_record_with(record: LoanApplicationRecord, policy: &ApplicationPolicy) -> Result<Self> {
        policy
            .check_terms(record.loan_amount, record.interest_rate, record.loan_term_months)
            .map_err(|e| {
                tracing::warn!(id = record.id, error = %e, "stored loan terms refused");
                e
            })?;

        let financials = FinancialSummary::compute(
            record.loan_amount,
            record.interest_rate,
            record.loan_term_months,
        )?;

        if financials.monthly_emi != record.monthly_emi
            || financials.total_amount != record.total_amount
        {
            tracing::warn!(
                id = record.id,
                stored_emi = %record.monthly_emi,
                computed_emi = %financials.monthly_emi,
                "stored financials disagree with terms, using recomputed values"
            );
        }

        let application = Self {
            id: Some(record.id),
            version: record.version,
            customer: CustomerDetails {
                first_name: record.first_name,
                middle_name: record.middle_name,
                last_name: record.last_name,
                phone_number: record.phone_number,
                email: record.email,
                user_id: record.user_id,
            },
            terms: LoanTerms {
                loan_type: record.loan_type,
                loan_amount: record.loan_amount,
                interest_rate: record.interest_rate,
                term_months: record.loan_term_months,
            },
            purpose: record.purpose,
            collateral: record.collateral,
            financials,
            status: record.status,
            application_date: record.application_date,
            submitted_at: record.submitted_at,
            approval_date: record.approval_date,
            rejection_reason: record.rejection_reason,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
            events: EventStore::new(),
        };

        application.check_consistency()?;
        Ok(application)
    }
}

/// filters for listing applications; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationQuery {
    pub user_id: Option<String>,
    pub status: Option<LoanStatus>,
    pub loan_type: Option<String>,
}

impl ApplicationQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: LoanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_loan_type(mut self, loan_type: impl Into<String>) -> Self {
        self.loan_type = Some(loan_type.into());
        self
    }

    pub fn matches(&self, application: &LoanApplication) -> bool {
        let user_ok = self
            .user_id
            .as_deref()
            .map_or(true, |u| application.customer().user_id.as_deref() == Some(u));
        let status_ok = self.status.map_or(true, |s| application.status() == s);
        let type_ok = self
            .loan_type
            .as_deref()
            .map_or(true, |t| application.terms().loan_type.eq_ignore_ascii_case(t));

        user_ok && status_ok && type_ok
    }
}

/// storage backend for applications
pub trait LoanRepository: Send + Sync {
    /// Insert or update.
    ///
    /// Assigns id and `created_at` on first save, bumps `updated_at` and the
    /// version on every save. Fails with `VersionConflict` if the stored
    /// version moved since `application` was loaded.
    fn save(
        &self,
        application: &mut LoanApplication,
        time_provider: &SafeTimeProvider,
    ) -> Result<ApplicationId>;

    fn find(&self, id: ApplicationId) -> Result<Option<LoanApplication>>;

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<LoanApplication>>;

    fn get(&self, id: ApplicationId) -> Result<LoanApplication> {
        self.find(id)?.ok_or(LoanError::NotFound { id })
    }
}

#[derive(Debug, Default)]
struct Tables {
    next_id: ApplicationId,
    rows: BTreeMap<ApplicationId, LoanApplicationRecord>,
    history: BTreeMap<ApplicationId, Vec<RecordedEvent>>,
}

/// in-process backend, rows kept in id order
#[derive(Debug, Default)]
pub struct InMemoryLoanRepository {
    tables: RwLock<Tables>,
    policy: ApplicationPolicy,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// rows are checked against `policy` when loaded
    pub fn with_policy(policy: ApplicationPolicy) -> Self {
        Self {
            tables: RwLock::default(),
            policy,
        }
    }

    /// events flushed by every save of `id`, oldest first
    pub fn history(&self, id: ApplicationId) -> Vec<RecordedEvent> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.history.get(&id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LoanRepository for InMemoryLoanRepository {
    fn save(
        &self,
        application: &mut LoanApplication,
        time_provider: &SafeTimeProvider,
    ) -> Result<ApplicationId> {
        application.check_consistency()?;

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let now = time_provider.now();

        let id = match application.id() {
            Some(id) => {
                let stored = tables.rows.get(&id).ok_or(LoanError::NotFound { id })?;
                if stored.version != application.version() {
                    tracing::warn!(
                        id,
                        expected = application.version(),
                        found = stored.version,
                        "rejected stale loan application write"
                    );
                    return Err(LoanError::VersionConflict {
                        id,
                        expected: application.version(),
                        found: stored.version,
                    });
                }
                id
            }
            None => {
                tables.next_id += 1;
                tables.next_id
            }
        };

        application.mark_persisted(id, now);
        let record = application.to_record().ok_or_else(|| {
            LoanError::computation(format!("application {} has no audit timestamps", id))
        })?;
        tables.rows.insert(id, record);

        let flushed = application.events_mut().take_events();
        tracing::debug!(id, version = application.version(), events = flushed.len(), "loan application saved");
        tables.history.entry(id).or_default().extend(flushed);

        Ok(id)
    }

    fn find(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        let record = {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            tables.rows.get(&id).cloned()
        };
        record
            .map(|record| LoanApplication::from_record_with(record, &self.policy))
            .transpose()
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<LoanApplication>> {
        let records: Vec<_> = {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            tables.rows.values().cloned().collect()
        };

        let mut found = Vec::new();
        for record in records {
            let application = LoanApplication::from_record_with(record, &self.policy)?;
            if query.matches(&application) {
                found.push(application);
            }
        }
        Ok(found)
    }
}
