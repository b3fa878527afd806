use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Component, TransactionId};

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("schedule has no installments")]
    EmptySchedule,

    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        expected: String,
        found: String,
    },

    #[error("unknown allocation strategy: {id}")]
    UnknownStrategy {
        id: String,
    },

    #[error("installment {installment} {component} is written off and cannot take payments")]
    AlreadyWrittenOffComponent {
        installment: u32,
        component: Component,
    },

    #[error("invalid schedule: {message}")]
    InvalidSchedule {
        message: String,
    },

    #[error("invalid currency code: {code}")]
    InvalidCurrencyCode {
        code: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("transaction {id} dated {date} precedes disbursement on {disbursement_date}")]
    TransactionBeforeDisbursement {
        id: TransactionId,
        date: NaiveDate,
        disbursement_date: NaiveDate,
    },

    #[error("transaction {id} appears more than once")]
    DuplicateTransaction {
        id: TransactionId,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AllocationError>;
