use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{FinancingError, Result};
use crate::types::RoundingMode;

/// inputs for one schedule calculation, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationParameters {
    /// financed total before the down payment is subtracted
    pub total_amount: Money,
    /// down payment, removed from the principal before scheduling
    pub initial_amount: Money,
    /// reservation deposit, informational only
    pub reservation_amount: Money,
    /// nominal rate per installment period, applied flat (not reducing-balance)
    pub interest_rate: Rate,
    pub number_of_payments: u32,
    /// anchor date for installment 1
    pub first_payment_date: NaiveDate,
    pub rounding: RoundingMode,
}

/// one scheduled installment (cuota)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the schedule
    pub number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// amortization schedule for a financed lot sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub number_of_payments: u32,
    pub first_payment_date: NaiveDate,
    pub rounding: RoundingMode,
    pub installments: Vec<Installment>,
    /// sum of all installment amounts after rounding reconciliation
    pub total_amount: Money,
    pub total_interest: Money,
}

impl AmortizationSchedule {
    /// generate the full schedule from scratch
    ///
    /// Pure and idempotent: identical parameters yield an identical
    /// schedule, and re-invocation never patches a prior result.
    pub fn generate(params: &AmortizationParameters) -> Result<Self> {
        validate_parameters(params)?;

        let principal = params.total_amount - params.initial_amount;
        let n = params.number_of_payments;

        // flat per-period interest on the full principal, applied literally
        // per installment rather than on a reducing balance
        let per_period_interest = principal.as_decimal() * params.interest_rate.as_decimal();
        let total_interest = per_period_interest * Decimal::from(n);
        let target_total = principal.as_decimal() + total_interest;
        let base = target_total / Decimal::from(n);

        let (rounded_base, rounded_target) = match params.rounding {
            RoundingMode::WholeUnits => (base.round_dp(0), target_total.round_dp(0)),
            RoundingMode::TwoDecimals => (base.round_dp(2), target_total.round_dp(2)),
        };

        let mut installments = Vec::with_capacity(n as usize);
        for i in 1..=n {
            let due_date = params
                .first_payment_date
                .checked_add_months(Months::new(i - 1))
                .ok_or_else(|| FinancingError::InvalidDate {
                    message: format!(
                        "cannot add {} months to {}",
                        i - 1,
                        params.first_payment_date
                    ),
                })?;

            installments.push(Installment {
                number: i,
                amount: Money::from_decimal(rounded_base),
                due_date,
            });
        }

        // apply the accumulated rounding delta to the last installment so
        // the schedule total reconciles exactly to the rounded target
        let before_correction = rounded_base * Decimal::from(n);
        let correction = rounded_target - before_correction;
        if !correction.is_zero() {
            if let Some(last) = installments.last_mut() {
                last.amount = Money::from_decimal(rounded_base + correction);
            }
        }

        let total_amount = installments.iter().map(|i| i.amount).sum();

        Ok(Self {
            principal,
            interest_rate: params.interest_rate,
            number_of_payments: n,
            first_payment_date: params.first_payment_date,
            rounding: params.rounding,
            installments,
            total_amount,
            total_interest: Money::from_decimal(total_interest),
        })
    }

    /// get installment by 1-based number
    pub fn get_installment(&self, number: u32) -> Option<&Installment> {
        self.installments.get(number.checked_sub(1)? as usize)
    }
}

fn validate_parameters(params: &AmortizationParameters) -> Result<()> {
    if params.number_of_payments < 1 {
        return Err(FinancingError::InvalidParameter {
            message: "number of payments must be at least 1".to_string(),
        });
    }

    if params.total_amount.is_negative() {
        return Err(FinancingError::InvalidParameter {
            message: format!("total amount must not be negative: {}", params.total_amount),
        });
    }

    if params.initial_amount.is_negative() {
        return Err(FinancingError::InvalidParameter {
            message: format!(
                "initial amount must not be negative: {}",
                params.initial_amount
            ),
        });
    }

    if params.initial_amount > params.total_amount {
        return Err(FinancingError::InvalidParameter {
            message: format!(
                "initial amount {} exceeds total amount {}",
                params.initial_amount, params.total_amount
            ),
        });
    }

    Ok(())
}
