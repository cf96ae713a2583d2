use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::LoanStatus;

/// all events that can be emitted by a loan application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanEvent {
    ApplicationSubmitted {
        loan_type: String,
        loan_amount: Money,
        monthly_emi: Money,
        timestamp: DateTime<Utc>,
    },
    TermsRevised {
        loan_amount: Money,
        interest_rate: Rate,
        term_months: u32,
        old_emi: Money,
        new_emi: Money,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl LoanEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LoanEvent::ApplicationSubmitted { timestamp, .. }
            | LoanEvent::TermsRevised { timestamp, .. }
            | LoanEvent::StatusChanged { timestamp, .. } => *timestamp,
        }
    }
}

/// event with a stable id, as handed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: Uuid,
    pub event: LoanEvent,
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<RecordedEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: LoanEvent) {
        self.events.push(RecordedEvent {
            event_id: Uuid::new_v4(),
            event,
        });
    }

    pub fn take_events(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
