use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{FinancingError, Result};
use crate::types::{LedgerPhase, VoucherId};

/// one recorded payment receipt (bank deposit, transfer, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVoucher {
    pub id: VoucherId,
    pub bank_name: Option<String>,
    pub reference: Option<String>,
    pub transaction_date: NaiveDate,
    pub amount: Money,
}

impl PaymentVoucher {
    pub fn new(
        bank_name: Option<String>,
        reference: Option<String>,
        transaction_date: NaiveDate,
        amount: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bank_name,
            reference,
            transaction_date,
            amount,
        }
    }
}

/// ordered collection of payment vouchers for one collection session
///
/// The ledger owns its entries until the session's submission succeeds.
/// `total_paid` is maintained on every mutation; failed operations leave
/// all state untouched, so conservation (`total_paid` equals the sum of
/// entry amounts) holds after every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLedger {
    required_amount: Money,
    entries: Vec<PaymentVoucher>,
    total_paid: Money,
}

impl PaymentLedger {
    pub fn new(required_amount: Money) -> Self {
        Self {
            required_amount: required_amount.max(Money::ZERO),
            entries: Vec::new(),
            total_paid: Money::ZERO,
        }
    }

    pub fn required_amount(&self) -> Money {
        self.required_amount
    }

    /// recompute hook for the orchestrator when sale terms change
    pub fn set_required_amount(&mut self, amount: Money) {
        self.required_amount = amount.max(Money::ZERO);
    }

    pub fn entries(&self) -> &[PaymentVoucher] {
        &self.entries
    }

    pub fn total_paid(&self) -> Money {
        self.total_paid
    }

    pub fn remaining_amount(&self) -> Money {
        (self.required_amount - self.total_paid).max(Money::ZERO)
    }

    pub fn is_amount_reached(&self) -> bool {
        self.total_paid >= self.required_amount
    }

    /// completion gate for submission
    ///
    /// Currently identical to `is_amount_reached`; kept separate so a
    /// stricter rule (e.g. a minimum voucher count) can diverge later
    /// without touching callers.
    pub fn is_payment_complete(&self) -> bool {
        self.is_amount_reached()
    }

    pub fn phase(&self) -> LedgerPhase {
        if self.entries.is_empty() && !self.is_amount_reached() {
            LedgerPhase::Empty
        } else if self.is_amount_reached() {
            LedgerPhase::Complete
        } else {
            LedgerPhase::Accumulating
        }
    }

    /// append a voucher
    ///
    /// The UI is expected to cap the input field at `remaining_amount`,
    /// but the ledger re-validates as the authoritative last line of
    /// defense.
    pub fn add_payment(&mut self, voucher: PaymentVoucher) -> Result<()> {
        if !voucher.amount.is_positive() {
            return Err(FinancingError::InvalidVoucherAmount {
                amount: voucher.amount,
            });
        }

        if voucher.amount > self.remaining_amount() {
            return Err(FinancingError::Overpayment {
                remaining: self.remaining_amount(),
                requested: voucher.amount,
            });
        }

        self.total_paid += voucher.amount;
        self.entries.push(voucher);
        Ok(())
    }

    /// replace the voucher at `index` with a new one
    ///
    /// The replacement is capped at `remaining_amount + old.amount`: the
    /// entry's own prior contribution is freed before the cap is checked,
    /// so a voucher may grow into the room its old value occupied.
    pub fn edit_payment(&mut self, index: usize, voucher: PaymentVoucher) -> Result<()> {
        let old_amount = match self.entries.get(index) {
            Some(entry) => entry.amount,
            None => {
                return Err(FinancingError::IndexOutOfRange {
                    index,
                    len: self.entries.len(),
                })
            }
        };

        if !voucher.amount.is_positive() {
            return Err(FinancingError::InvalidVoucherAmount {
                amount: voucher.amount,
            });
        }

        let cap = self.remaining_amount() + old_amount;
        if voucher.amount > cap {
            return Err(FinancingError::Overpayment {
                remaining: cap,
                requested: voucher.amount,
            });
        }

        self.total_paid = self.total_paid - old_amount + voucher.amount;
        self.entries[index] = voucher;
        Ok(())
    }

    /// remove the voucher at `index`
    ///
    /// No amount validation: deletion only ever lowers `total_paid`.
    pub fn delete_payment(&mut self, index: usize) -> Result<PaymentVoucher> {
        if index >= self.entries.len() {
            return Err(FinancingError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let removed = self.entries.remove(index);
        self.total_paid -= removed.amount;
        Ok(removed)
    }

    /// clear all entries, returning the ledger to a fresh state
    pub fn reset_payments(&mut self) {
        self.entries.clear();
        self.total_paid = Money::ZERO;
    }
}
