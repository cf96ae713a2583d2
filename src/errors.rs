use thiserror::Error;

use crate::types::{ApplicationId, LoanStatus};

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    #[error("inconsistent state: cannot {attempted} while {status}")]
    StateInconsistency {
        status: LoanStatus,
        attempted: String,
    },

    #[error("calculation error: {message}")]
    Computation {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("loan application not found: {id}")]
    NotFound {
        id: ApplicationId,
    },

    #[error("version conflict on application {id}: expected {expected}, found {found}")]
    VersionConflict {
        id: ApplicationId,
        expected: u64,
        found: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoanError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        LoanError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn state(status: LoanStatus, attempted: impl Into<String>) -> Self {
        LoanError::StateInconsistency {
            status,
            attempted: attempted.into(),
        }
    }

    pub(crate) fn computation(message: impl Into<String>) -> Self {
        LoanError::Computation {
            message: message.into(),
        }
    }

    /// caller supplied bad input, as opposed to a contract violation
    pub fn is_client_error(&self) -> bool {
        matches!(self, LoanError::Validation { .. } | LoanError::NotFound { .. } | LoanError::VersionConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
