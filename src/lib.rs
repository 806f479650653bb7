pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod schedule;
pub mod session;
pub mod types;

// re-export key types
pub use config::SaleTerms;
pub use decimal::{Money, Rate};
pub use errors::{FinancingError, Result};
pub use events::{Event, EventStore};
pub use ledger::{PaymentLedger, PaymentVoucher};
pub use schedule::{AmortizationParameters, AmortizationSchedule, Installment};
pub use session::{
    FinancingSession, PaymentBatch, PaymentRegistrar, SessionView, SubmissionOutcome,
};
pub use types::{Currency, LedgerPhase, RoundingMode, SaleId, SaleType, VoucherId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
