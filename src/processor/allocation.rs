use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{AllocationError, Result};
use crate::schedule::Installment;
use crate::strategy::{AllocationRules, ComponentOrder, DueTraversal, FutureFlow};
use crate::types::{Component, ComponentBreakdown};

/// bucket an allocated amount lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Paid,
    Waived,
}

/// running state of one forward allocation
struct Allocator {
    remaining: Money,
    portions: ComponentBreakdown,
}

impl Allocator {
    fn new(amount: Money) -> Self {
        Self {
            remaining: amount,
            portions: ComponentBreakdown::zero(amount.currency()),
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining.is_zero()
    }

    fn take(
        &mut self,
        installment: &mut Installment,
        component: Component,
        bucket: Bucket,
    ) -> Result<()> {
        let sequence_no = installment.sequence_no;
        let amounts = installment.component_mut(component);
        let take = self.remaining.min(amounts.outstanding()?)?;
        if take.is_zero() {
            return Ok(());
        }

        match bucket {
            Bucket::Paid => {
                if amounts.is_written_off() {
                    return Err(AllocationError::AlreadyWrittenOffComponent {
                        installment: sequence_no,
                        component,
                    });
                }
                amounts.paid = amounts.paid.plus(take)?;
            }
            Bucket::Waived => amounts.waived = amounts.waived.plus(take)?,
        }

        self.portions.add(component, take)?;
        self.remaining = self.remaining.minus(take)?;
        Ok(())
    }

    fn settle(&mut self, installment: &mut Installment, order: ComponentOrder) -> Result<()> {
        if installment.obligations_met()? {
            return Ok(());
        }
        for component in order.components() {
            if self.exhausted() {
                break;
            }
            self.take(installment, component, Bucket::Paid)?;
        }
        Ok(())
    }

    fn finish(self) -> (ComponentBreakdown, Money) {
        (self.portions, self.remaining)
    }
}

/// Forward allocation of a repayment or recovery. Returns the portions taken
/// and whatever could not be placed.
pub(super) fn allocate_repayment(
    rules: &AllocationRules,
    date: NaiveDate,
    amount: Money,
    installments: &mut [Installment],
) -> Result<(ComponentBreakdown, Money)> {
    let mut allocator = Allocator::new(amount);
    let (due, advance): (Vec<usize>, Vec<usize>) =
        (0..installments.len()).partition(|&i| !installments[i].is_in_advance_of(date));

    match rules.due_traversal {
        DueTraversal::Vertical => {
            for &index in &due {
                if allocator.exhausted() {
                    break;
                }
                allocator.settle(&mut installments[index], rules.due_order)?;
            }
        }
        DueTraversal::Horizontal => {
            for component in rules.due_order.components() {
                for &index in &due {
                    if allocator.exhausted() {
                        break;
                    }
                    allocator.take(&mut installments[index], component, Bucket::Paid)?;
                }
            }
        }
    }

    let future: Vec<usize> = match rules.future_flow {
        FutureFlow::InDueOrder => advance,
        FutureFlow::LatestFirst => advance.into_iter().rev().collect(),
    };
    for index in future {
        if allocator.exhausted() {
            break;
        }
        allocator.settle(&mut installments[index], rules.advance_order)?;
    }

    Ok(allocator.finish())
}

/// Waive outstanding interest, earliest installment first.
pub(super) fn allocate_interest_waiver(
    amount: Money,
    installments: &mut [Installment],
) -> Result<(ComponentBreakdown, Money)> {
    let mut allocator = Allocator::new(amount);
    for installment in installments.iter_mut() {
        if allocator.exhausted() {
            break;
        }
        allocator.take(installment, Component::Interest, Bucket::Waived)?;
    }
    Ok(allocator.finish())
}
