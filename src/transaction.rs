use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::charges::ChargePaidBy;
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{ComponentBreakdown, TransactionId, TransactionType};

/// outcome of allocating one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Amount per component, always non-negative. For a refund these are the
    /// amounts taken back out of `paid`; the transaction type carries the
    /// direction, so do not negate them again.
    pub portions: ComponentBreakdown,
    pub overpayment: Money,
    pub charges_paid_by: Vec<ChargePaidBy>,
}

impl Allocation {
    /// portions plus overpayment
    pub fn accounted(&self) -> Result<Money> {
        self.portions.total()?.plus(self.overpayment)
    }
}

/// one monetary event against a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub amount: Money,
    #[serde(default)]
    pub reversed: bool,
    /// filled in by the processor; `None` until first applied
    #[serde(default)]
    pub allocation: Option<Allocation>,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        date: NaiveDate,
        transaction_type: TransactionType,
        amount: Money,
    ) -> Self {
        Self {
            id,
            date,
            transaction_type,
            amount,
            reversed: false,
            allocation: None,
        }
    }

    pub fn repayment(id: TransactionId, date: NaiveDate, amount: Money) -> Self {
        Self::new(id, date, TransactionType::Repayment, amount)
    }

    pub fn portions(&self) -> Option<&ComponentBreakdown> {
        self.allocation.as_ref().map(|a| &a.portions)
    }

    /// overpayment of the last apply, zero if never applied
    pub fn overpayment(&self) -> Money {
        self.allocation
            .as_ref()
            .map(|a| a.overpayment)
            .unwrap_or_else(|| Money::zero(self.amount.currency()))
    }

    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    /// current allocated state, `None` for a transaction never applied
    pub fn snapshot(&self) -> Option<TransactionSnapshot> {
        self.allocation.as_ref().map(|allocation| TransactionSnapshot {
            amount: self.amount,
            allocation: allocation.clone(),
        })
    }
}

/// pre-replay image of an allocated transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub amount: Money,
    pub allocation: Allocation,
}

/// Transactions whose allocation moved during a replay, keyed by id, holding
/// the state they had before the replay began.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedTransactionDetail {
    changed: BTreeMap<TransactionId, TransactionSnapshot>,
}

impl ChangedTransactionDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: TransactionId, pre_image: TransactionSnapshot) {
        self.changed.insert(id, pre_image);
    }

    pub fn get(&self, id: TransactionId) -> Option<&TransactionSnapshot> {
        self.changed.get(&id)
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.changed.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    /// changed ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.changed.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransactionId, &TransactionSnapshot)> {
        self.changed.iter()
    }
}
