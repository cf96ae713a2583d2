pub mod amortization;
pub mod emi;

pub use amortization::{AmortizationSchedule, ScheduledPayment};
pub use emi::{calculate_emi, FinancialSummary};
