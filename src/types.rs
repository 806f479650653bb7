use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a sale
pub type SaleId = Uuid;

/// unique identifier for a payment voucher
pub type VoucherId = Uuid;

/// settlement currency, informational only (no conversion performed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// peruvian sol
    PEN,
    /// us dollar
    USD,
}

/// how a sale is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleType {
    /// single payment of the net sale total, no schedule
    DirectPayment,
    /// total split across dated installments
    Financed,
}

/// rounding policy for installment amounts
///
/// Both modes accumulate the rounding delta and apply it to the last
/// installment so the schedule total reconciles exactly to the rounded
/// target amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingMode {
    /// every installment rounded to the nearest whole currency unit
    WholeUnits,
    /// installments keep 2 decimal places
    TwoDecimals,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::WholeUnits
    }
}

/// ledger phase within one collection session
///
/// Complete is not terminal: deleting or shrinking a voucher drops the
/// ledger back to Accumulating. A successful submission resets to Empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerPhase {
    /// no vouchers recorded
    Empty,
    /// vouchers recorded, total below required amount
    Accumulating,
    /// total has reached the required amount
    Complete,
}
