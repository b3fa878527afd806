pub mod charges;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod processor;
pub mod schedule;
pub mod serialization;
pub mod strategy;
pub mod transaction;
pub mod types;

// re-export key types
pub use charges::{ChargeKind, ChargePaidBy, LoanCharge};
pub use config::ProcessorConfig;
pub use decimal::{Currency, CurrencyCode, Money};
pub use errors::{AllocationError, Result};
pub use processor::TransactionProcessor;
pub use schedule::{ComponentAmounts, Installment, Schedule};
pub use serialization::ScheduleView;
pub use strategy::{
    is_interest_first_strategy, select_strategy, AllocationRules, AllocationStrategy,
    ComponentOrder, DueTraversal, FutureFlow,
};
pub use transaction::{Allocation, ChangedTransactionDetail, Transaction, TransactionSnapshot};
pub use types::{
    ChargeId, Component, ComponentBreakdown, LoanId, TransactionId, TransactionType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
