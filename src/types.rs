use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Currency, Money};
use crate::errors::Result;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// Transaction identity. Ids are issued in submission order, so they break
/// ties between transactions booked on the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// unique identifier for a loan charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargeId(pub u64);

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "charge-{}", self.0)
    }
}

/// installment component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Principal,
    Interest,
    Fee,
    Penalty,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Principal,
        Component::Interest,
        Component::Fee,
        Component::Penalty,
    ];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Principal => "principal",
            Component::Interest => "interest",
            Component::Fee => "fee",
            Component::Penalty => "penalty",
        };
        f.write_str(name)
    }
}

/// monetary event kinds the processor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Repayment,
    WaiveInterest,
    WriteOff,
    Refund,
    Recovery,
}

/// per-component breakdown of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub fee_portion: Money,
    pub penalty_portion: Money,
}

impl ComponentBreakdown {
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            principal_portion: zero,
            interest_portion: zero,
            fee_portion: zero,
            penalty_portion: zero,
        }
    }

    pub fn portion(&self, component: Component) -> Money {
        match component {
            Component::Principal => self.principal_portion,
            Component::Interest => self.interest_portion,
            Component::Fee => self.fee_portion,
            Component::Penalty => self.penalty_portion,
        }
    }

    fn portion_mut(&mut self, component: Component) -> &mut Money {
        match component {
            Component::Principal => &mut self.principal_portion,
            Component::Interest => &mut self.interest_portion,
            Component::Fee => &mut self.fee_portion,
            Component::Penalty => &mut self.penalty_portion,
        }
    }

    pub fn add(&mut self, component: Component, amount: Money) -> Result<()> {
        let slot = self.portion_mut(component);
        *slot = slot.plus(amount)?;
        Ok(())
    }

    pub fn total(&self) -> Result<Money> {
        self.principal_portion
            .plus(self.interest_portion)?
            .plus(self.fee_portion)?
            .plus(self.penalty_portion)
    }

    /// signed per-component change from `earlier` to `self`
    pub fn difference(&self, earlier: &ComponentBreakdown) -> Result<ComponentBreakdown> {
        Ok(Self {
            principal_portion: self
                .principal_portion
                .minus_unbounded(earlier.principal_portion)?,
            interest_portion: self
                .interest_portion
                .minus_unbounded(earlier.interest_portion)?,
            fee_portion: self.fee_portion.minus_unbounded(earlier.fee_portion)?,
            penalty_portion: self
                .penalty_portion
                .minus_unbounded(earlier.penalty_portion)?,
        })
    }
}
