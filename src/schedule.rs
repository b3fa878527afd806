use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Currency, Money};
use crate::errors::{AllocationError, Result};
use crate::types::{Component, LoanId};

/// due / paid / waived / written-off buckets of one installment component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAmounts {
    pub due: Money,
    pub paid: Money,
    pub waived: Money,
    pub written_off: Money,
}

impl ComponentAmounts {
    pub fn new(due: Money) -> Self {
        let zero = Money::zero(due.currency());
        Self {
            due,
            paid: zero,
            waived: zero,
            written_off: zero,
        }
    }

    /// `due - paid - waived - written_off`; settling more than is due is an
    /// error, never clamped
    pub fn outstanding(&self) -> Result<Money> {
        let settled = self.settled()?;
        if settled.is_greater_than(&self.due)? {
            return Err(AllocationError::InvalidSchedule {
                message: format!("settled {settled} exceeds due {}", self.due),
            });
        }
        self.due.minus(settled)
    }

    fn settled(&self) -> Result<Money> {
        self.paid.plus(self.waived)?.plus(self.written_off)
    }

    pub fn is_settled(&self) -> Result<bool> {
        Ok(self.outstanding()?.is_zero())
    }

    pub fn is_written_off(&self) -> bool {
        self.written_off.is_greater_than_zero()
    }

    fn reset(&mut self) {
        let zero = Money::zero(self.due.currency());
        self.paid = zero;
        self.waived = zero;
        self.written_off = zero;
    }
}

/// one scheduled period of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub sequence_no: u32,
    pub from_date: NaiveDate,
    pub due_date: NaiveDate,
    pub principal: ComponentAmounts,
    pub interest: ComponentAmounts,
    pub fee: ComponentAmounts,
    pub penalty: ComponentAmounts,
}

impl Installment {
    pub fn new(
        sequence_no: u32,
        from_date: NaiveDate,
        due_date: NaiveDate,
        principal: Money,
        interest: Money,
        fee: Money,
        penalty: Money,
    ) -> Self {
        Self {
            sequence_no,
            from_date,
            due_date,
            principal: ComponentAmounts::new(principal),
            interest: ComponentAmounts::new(interest),
            fee: ComponentAmounts::new(fee),
            penalty: ComponentAmounts::new(penalty),
        }
    }

    pub fn component(&self, component: Component) -> &ComponentAmounts {
        match component {
            Component::Principal => &self.principal,
            Component::Interest => &self.interest,
            Component::Fee => &self.fee,
            Component::Penalty => &self.penalty,
        }
    }

    pub fn component_mut(&mut self, component: Component) -> &mut ComponentAmounts {
        match component {
            Component::Principal => &mut self.principal,
            Component::Interest => &mut self.interest,
            Component::Fee => &mut self.fee,
            Component::Penalty => &mut self.penalty,
        }
    }

    pub fn outstanding(&self, component: Component) -> Result<Money> {
        self.component(component).outstanding()
    }

    pub fn total_outstanding(&self) -> Result<Money> {
        Money::total(
            self.principal.due.currency(),
            Component::ALL
                .iter()
                .map(|c| self.outstanding(*c))
                .collect::<Result<Vec<_>>>()?,
        )
    }

    pub fn total_due(&self) -> Result<Money> {
        Money::total(
            self.principal.due.currency(),
            Component::ALL.iter().map(|c| self.component(*c).due),
        )
    }

    /// all four components have nothing outstanding
    pub fn obligations_met(&self) -> Result<bool> {
        for component in Component::ALL {
            if !self.component(component).is_settled()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// period has not started yet as of `date`
    pub fn is_in_advance_of(&self, date: NaiveDate) -> bool {
        date < self.from_date
    }

    /// any component carries a payment
    pub fn has_payments(&self) -> bool {
        Component::ALL
            .iter()
            .any(|c| self.component(*c).paid.is_greater_than_zero())
    }

    pub fn reset(&mut self) {
        for component in Component::ALL {
            self.component_mut(component).reset();
        }
    }

    fn ensure_currency(&self, currency: Currency) -> Result<()> {
        for component in Component::ALL {
            let amounts = self.component(component);
            amounts.due.ensure_currency(currency)?;
            amounts.paid.ensure_currency(currency)?;
            amounts.waived.ensure_currency(currency)?;
            amounts.written_off.ensure_currency(currency)?;
        }
        Ok(())
    }

    fn ensure_within_due(&self) -> Result<()> {
        for component in Component::ALL {
            self.outstanding(component).map_err(|e| match e {
                AllocationError::InvalidSchedule { message } => AllocationError::InvalidSchedule {
                    message: format!("installment {} {component}: {message}", self.sequence_no),
                },
                other => other,
            })?;
        }
        Ok(())
    }
}

/// ordered installments of one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub loan_id: LoanId,
    pub currency: Currency,
    installments: Vec<Installment>,
}

impl Schedule {
    /// Build a schedule, checking that sequence numbers run 1, 2, 3, ... and
    /// due dates strictly increase.
    pub fn new(loan_id: LoanId, currency: Currency, installments: Vec<Installment>) -> Result<Self> {
        for (index, installment) in installments.iter().enumerate() {
            let expected = index as u32 + 1;
            if installment.sequence_no != expected {
                return Err(AllocationError::InvalidSchedule {
                    message: format!(
                        "expected installment {expected}, found {}",
                        installment.sequence_no
                    ),
                });
            }
            if installment.from_date > installment.due_date {
                return Err(AllocationError::InvalidSchedule {
                    message: format!(
                        "installment {expected} starts {} after its due date {}",
                        installment.from_date, installment.due_date
                    ),
                });
            }
        }

        for pair in installments.windows(2) {
            if pair[1].due_date <= pair[0].due_date {
                return Err(AllocationError::InvalidSchedule {
                    message: format!(
                        "installment {} due {} is not after installment {} due {}",
                        pair[1].sequence_no, pair[1].due_date, pair[0].sequence_no, pair[0].due_date
                    ),
                });
            }
        }

        let schedule = Self {
            loan_id,
            currency,
            installments,
        };
        schedule.ensure_consistent()?;
        Ok(schedule)
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub(crate) fn installments_mut(&mut self) -> &mut [Installment] {
        &mut self.installments
    }

    pub fn installment(&self, sequence_no: u32) -> Option<&Installment> {
        sequence_no
            .checked_sub(1)
            .and_then(|index| self.installments.get(index as usize))
    }

    /// Mutable access for the recalculation collaborator that adjusts due
    /// amounts between replays.
    pub fn installment_mut(&mut self, sequence_no: u32) -> Option<&mut Installment> {
        sequence_no
            .checked_sub(1)
            .and_then(|index| self.installments.get_mut(index as usize))
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn total_outstanding(&self) -> Result<Money> {
        Money::total(
            self.currency,
            self.installments
                .iter()
                .map(Installment::total_outstanding)
                .collect::<Result<Vec<_>>>()?,
        )
    }

    pub fn total_outstanding_for(&self, component: Component) -> Result<Money> {
        Money::total(
            self.currency,
            self.installments
                .iter()
                .map(|i| i.outstanding(component))
                .collect::<Result<Vec<_>>>()?,
        )
    }

    /// zero every paid / waived / written-off bucket, keeping due amounts
    pub fn reset_allocations(&mut self) {
        for installment in &mut self.installments {
            installment.reset();
        }
    }

    /// every bucket of every installment is in the schedule currency
    pub fn ensure_currency(&self) -> Result<()> {
        for installment in &self.installments {
            installment.ensure_currency(self.currency)?;
        }
        Ok(())
    }

    /// Every bucket is in the schedule currency and no component has settled
    /// more than is due. Due amounts may have been lowered through
    /// [`Schedule::installment_mut`] since the last allocation.
    pub fn ensure_consistent(&self) -> Result<()> {
        self.ensure_currency()?;
        for installment in &self.installments {
            installment.ensure_within_due()?;
        }
        Ok(())
    }
}
