use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum FinancingError {
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        message: String,
    },

    #[error("invalid voucher amount: {amount}")]
    InvalidVoucherAmount {
        amount: Money,
    },

    #[error("overpayment: remaining {remaining}, requested {requested}")]
    Overpayment {
        remaining: Money,
        requested: Money,
    },

    #[error("voucher index out of range: index {index}, len {len}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
    },

    #[error("submission already in flight")]
    SubmissionInFlight,

    #[error("no submission in flight")]
    NoSubmissionInFlight,

    #[error("submission failed: {message}")]
    SubmissionFailed {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, FinancingError>;
