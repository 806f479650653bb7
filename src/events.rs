use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{SaleId, VoucherId};

/// all events that can be emitted by a financing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // schedule events
    ScheduleGenerated {
        sale_id: SaleId,
        installments: u32,
        first_due_date: NaiveDate,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },
    RequiredAmountChanged {
        sale_id: SaleId,
        old_amount: Money,
        new_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // voucher events
    VoucherAdded {
        sale_id: SaleId,
        voucher_id: VoucherId,
        amount: Money,
        total_paid: Money,
        remaining: Money,
        timestamp: DateTime<Utc>,
    },
    VoucherEdited {
        sale_id: SaleId,
        voucher_id: VoucherId,
        old_amount: Money,
        new_amount: Money,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    VoucherDeleted {
        sale_id: SaleId,
        voucher_id: VoucherId,
        amount: Money,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    CollectionCompleted {
        sale_id: SaleId,
        total_paid: Money,
        voucher_count: u32,
        timestamp: DateTime<Utc>,
    },

    // submission events
    SubmissionDispatched {
        sale_id: SaleId,
        total_amount: Money,
        voucher_count: u32,
        timestamp: DateTime<Utc>,
    },
    SubmissionSucceeded {
        sale_id: SaleId,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },
    SubmissionFailed {
        sale_id: SaleId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    PaymentsCleared {
        sale_id: SaleId,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
