use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{FinancingError, Result};
use crate::types::{RoundingMode, SaleType};

/// agreed financing terms for one lot sale
///
/// This is the contract supplied by the sale-financing source. Prices are
/// raw decimal amounts; currency formatting belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleTerms {
    pub sale_type: SaleType,
    pub lot_price: Money,
    pub urban_development_price: Option<Money>,
    /// down payment, subtracted from the financed principal
    pub initial_amount: Money,
    /// separate deposit, netted from the required amount but never scheduled
    pub reservation_amount: Money,
    /// nominal rate per installment period
    pub interest_rate: Rate,
    pub number_of_payments: u32,
    /// anchor date for installment 1; required for financed sales
    pub first_payment_date: Option<NaiveDate>,
    pub rounding: RoundingMode,
}

impl SaleTerms {
    /// create terms for a financed sale
    pub fn financed(
        lot_price: Money,
        urban_development_price: Option<Money>,
        initial_amount: Money,
        reservation_amount: Money,
        interest_rate: Rate,
        number_of_payments: u32,
        first_payment_date: NaiveDate,
    ) -> Self {
        Self {
            sale_type: SaleType::Financed,
            lot_price,
            urban_development_price,
            initial_amount,
            reservation_amount,
            interest_rate,
            number_of_payments,
            first_payment_date: Some(first_payment_date),
            rounding: RoundingMode::default(),
        }
    }

    /// create terms for a direct-payment sale
    pub fn direct(
        lot_price: Money,
        urban_development_price: Option<Money>,
        reservation_amount: Money,
    ) -> Self {
        Self {
            sale_type: SaleType::DirectPayment,
            lot_price,
            urban_development_price,
            initial_amount: Money::ZERO,
            reservation_amount,
            interest_rate: Rate::ZERO,
            number_of_payments: 0,
            first_payment_date: None,
            rounding: RoundingMode::default(),
        }
    }

    /// select the installment rounding policy
    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// total sale amount before any deposit is netted off
    pub fn gross_total(&self) -> Money {
        self.lot_price + self.urban_development_price.unwrap_or(Money::ZERO)
    }

    /// amount still owed once initial and reservation deposits are applied
    pub fn net_total(&self) -> Money {
        (self.gross_total() - self.initial_amount - self.reservation_amount).max(Money::ZERO)
    }

    /// validate terms before any schedule or ledger is built
    pub fn validate(&self) -> Result<()> {
        if self.lot_price.is_negative() {
            return Err(FinancingError::InvalidParameter {
                message: format!("lot price must not be negative: {}", self.lot_price),
            });
        }

        if let Some(udp) = self.urban_development_price {
            if udp.is_negative() {
                return Err(FinancingError::InvalidParameter {
                    message: format!("urban development price must not be negative: {}", udp),
                });
            }
        }

        if self.initial_amount.is_negative() || self.reservation_amount.is_negative() {
            return Err(FinancingError::InvalidParameter {
                message: "deposit amounts must not be negative".to_string(),
            });
        }

        if self.initial_amount > self.gross_total() {
            return Err(FinancingError::InvalidParameter {
                message: format!(
                    "initial amount {} exceeds sale total {}",
                    self.initial_amount,
                    self.gross_total()
                ),
            });
        }

        if self.sale_type == SaleType::Financed {
            if self.number_of_payments < 1 {
                return Err(FinancingError::InvalidParameter {
                    message: "financed sale requires at least 1 payment".to_string(),
                });
            }

            if self.first_payment_date.is_none() {
                return Err(FinancingError::InvalidParameter {
                    message: "financed sale requires a first payment date".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_net_total() {
        let terms = SaleTerms::financed(
            Money::from_major(50_000),
            Some(Money::from_major(5_000)),
            Money::from_major(10_000),
            Money::from_major(1_000),
            Rate::from_percentage(dec!(2)),
            24,
            date(2024, 3, 1),
        );

        assert_eq!(terms.gross_total(), Money::from_major(55_000));
        assert_eq!(terms.net_total(), Money::from_major(44_000));
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_net_total_floors_at_zero() {
        let terms = SaleTerms::direct(
            Money::from_major(1_000),
            None,
            Money::from_major(1_500),
        );

        assert_eq!(terms.net_total(), Money::ZERO);
    }

    #[test]
    fn test_financed_requires_payments_and_date() {
        let mut terms = SaleTerms::financed(
            Money::from_major(10_000),
            None,
            Money::ZERO,
            Money::ZERO,
            Rate::ZERO,
            0,
            date(2024, 1, 15),
        );
        assert!(terms.validate().is_err());

        terms.number_of_payments = 12;
        terms.first_payment_date = None;
        assert!(terms.validate().is_err());

        terms.first_payment_date = Some(date(2024, 1, 15));
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_initial_above_total_rejected() {
        let terms = SaleTerms::financed(
            Money::from_major(10_000),
            None,
            Money::from_major(12_000),
            Money::ZERO,
            Rate::ZERO,
            12,
            date(2024, 1, 15),
        );
        assert!(terms.validate().is_err());
    }
}
