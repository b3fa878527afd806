use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Currency, Money};
use crate::errors::{AllocationError, Result};
use crate::types::{ChargeId, Component};

/// whether a charge is settled through the fee or the penalty component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    Fee,
    Penalty,
}

impl ChargeKind {
    pub fn component(&self) -> Component {
        match self {
            ChargeKind::Fee => Component::Fee,
            ChargeKind::Penalty => Component::Penalty,
        }
    }
}

/// loan-level charge whose due amount is already folded into the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCharge {
    pub id: ChargeId,
    pub kind: ChargeKind,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub paid: Money,
    pub waived: Money,
    pub written_off: Money,
}

impl LoanCharge {
    pub fn new(id: ChargeId, kind: ChargeKind, due_date: NaiveDate, amount: Money) -> Self {
        let zero = Money::zero(amount.currency());
        Self {
            id,
            kind,
            due_date,
            amount,
            paid: zero,
            waived: zero,
            written_off: zero,
        }
    }

    pub fn outstanding(&self) -> Result<Money> {
        let settled = self.paid.plus(self.waived)?.plus(self.written_off)?;
        if settled.is_greater_than(&self.amount)? {
            return Err(AllocationError::InvalidSchedule {
                message: format!("{} settled {settled} exceeds amount {}", self.id, self.amount),
            });
        }
        self.amount.minus(settled)
    }

    pub fn ensure_currency(&self, currency: Currency) -> Result<()> {
        self.amount.ensure_currency(currency)?;
        self.paid.ensure_currency(currency)?;
        self.waived.ensure_currency(currency)?;
        self.written_off.ensure_currency(currency)
    }

    fn reset(&mut self) {
        let zero = Money::zero(self.amount.currency());
        self.paid = zero;
        self.waived = zero;
        self.written_off = zero;
    }
}

/// amount of one transaction attributed to one charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargePaidBy {
    pub charge_id: ChargeId,
    pub amount: Money,
}

/// indices of charges of `kind`, oldest due first
fn ordered(charges: &[LoanCharge], kind: ChargeKind) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..charges.len())
        .filter(|&i| charges[i].kind == kind)
        .collect();
    indices.sort_by_key(|&i| (charges[i].due_date, charges[i].id));
    indices
}

/// Spread `amount` over outstanding charges of `kind`, oldest first. Any
/// part no charge can absorb is left unattributed.
pub(crate) fn pay_charges(
    charges: &mut [LoanCharge],
    kind: ChargeKind,
    amount: Money,
) -> Result<Vec<ChargePaidBy>> {
    let mut remaining = amount;
    let mut paid_by = Vec::new();

    for index in ordered(charges, kind) {
        if remaining.is_zero() {
            break;
        }
        let charge = &mut charges[index];
        let take = remaining.min(charge.outstanding()?)?;
        if take.is_zero() {
            continue;
        }
        charge.paid = charge.paid.plus(take)?;
        remaining = remaining.minus(take)?;
        paid_by.push(ChargePaidBy {
            charge_id: charge.id,
            amount: take,
        });
    }

    Ok(paid_by)
}

/// Undo up to `amount` of charge payments of `kind`, newest first.
pub(crate) fn refund_charges(
    charges: &mut [LoanCharge],
    kind: ChargeKind,
    amount: Money,
) -> Result<Vec<ChargePaidBy>> {
    let mut remaining = amount;
    let mut refunded = Vec::new();

    for index in ordered(charges, kind).into_iter().rev() {
        if remaining.is_zero() {
            break;
        }
        let charge = &mut charges[index];
        let take = remaining.min(charge.paid)?;
        if take.is_zero() {
            continue;
        }
        charge.paid = charge.paid.minus(take)?;
        remaining = remaining.minus(take)?;
        refunded.push(ChargePaidBy {
            charge_id: charge.id,
            amount: take,
        });
    }

    Ok(refunded)
}

/// write off whatever is still outstanding on every charge
pub(crate) fn write_off_charges(charges: &mut [LoanCharge]) -> Result<Vec<ChargePaidBy>> {
    let mut written_off = Vec::new();
    let mut indices: Vec<usize> = (0..charges.len()).collect();
    indices.sort_by_key(|&i| (charges[i].due_date, charges[i].id));

    for index in indices {
        let charge = &mut charges[index];
        let outstanding = charge.outstanding()?;
        if outstanding.is_zero() {
            continue;
        }
        charge.written_off = charge.written_off.plus(outstanding)?;
        written_off.push(ChargePaidBy {
            charge_id: charge.id,
            amount: outstanding,
        });
    }

    Ok(written_off)
}

pub(crate) fn reset_charges(charges: &mut [LoanCharge]) {
    for charge in charges {
        charge.reset();
    }
}
