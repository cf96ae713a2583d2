pub mod application;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod name;
pub mod payments;
pub mod request;
pub mod response;
pub mod store;
pub mod types;

// re-export key types
pub use application::LoanApplication;
pub use config::{ApplicationPolicy, MAX_TERM_MONTHS};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{EventStore, LoanEvent, RecordedEvent};
pub use name::full_name;
pub use payments::{calculate_emi, AmortizationSchedule, FinancialSummary, ScheduledPayment};
pub use request::{FieldViolation, LoanApplicationRequest, ValidatedApplication};
pub use response::LoanApplicationResponse;
pub use store::{ApplicationQuery, InMemoryLoanRepository, LoanApplicationRecord, LoanRepository};
pub use types::{ApplicationId, CustomerDetails, LoanStatus, LoanTerms};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
