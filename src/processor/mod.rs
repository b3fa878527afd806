mod allocation;
mod refund;
mod replay;
mod write_off;

use log::{debug, warn};

use crate::charges::{self, ChargeKind, LoanCharge};
use crate::decimal::Money;
use crate::errors::{AllocationError, Result};
use crate::schedule::Schedule;
use crate::strategy::{AllocationRules, AllocationStrategy};
use crate::transaction::{Allocation, Transaction};
use crate::types::TransactionType;

/// Allocates transactions against a repayment schedule under one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionProcessor {
    strategy: AllocationStrategy,
    rules: AllocationRules,
}

impl TransactionProcessor {
    /// processor using the strategy's default ordering table
    pub fn new(strategy: AllocationStrategy) -> Self {
        Self {
            strategy,
            rules: strategy.rules(),
        }
    }

    /// processor with an ordering table configured per product
    pub fn with_rules(strategy: AllocationStrategy, rules: AllocationRules) -> Self {
        Self { strategy, rules }
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    pub fn rules(&self) -> &AllocationRules {
        &self.rules
    }

    /// Allocate one transaction, updating its allocation and the touched
    /// installments and charges. On error nothing is modified.
    pub fn apply(
        &self,
        transaction: &mut Transaction,
        schedule: &mut Schedule,
        charges: &mut [LoanCharge],
    ) -> Result<()> {
        Self::check_schedule(schedule, charges)?;
        schedule.ensure_consistent()?;
        transaction.amount.ensure_currency(schedule.currency)?;

        let mut staged_transaction = transaction.clone();
        let mut staged_schedule = schedule.clone();
        let mut staged_charges = charges.to_vec();
        self.process(&mut staged_transaction, &mut staged_schedule, &mut staged_charges)?;

        *transaction = staged_transaction;
        *schedule = staged_schedule;
        charges.clone_from_slice(&staged_charges);
        Ok(())
    }

    /// Outstanding left after applying `transactions` in order to a copy of
    /// `schedule`. Neither argument is modified.
    pub fn simulate_outstanding(
        &self,
        transactions: &[Transaction],
        schedule: &Schedule,
    ) -> Result<Money> {
        Self::check_schedule(schedule, &[])?;
        schedule.ensure_consistent()?;

        let mut scratch = schedule.clone();
        let mut no_charges: Vec<LoanCharge> = Vec::new();
        for transaction in transactions {
            transaction.amount.ensure_currency(scratch.currency)?;
            let mut copy = transaction.clone();
            self.process(&mut copy, &mut scratch, &mut no_charges)?;
        }

        scratch.total_outstanding()
    }

    fn check_schedule(schedule: &Schedule, charges: &[LoanCharge]) -> Result<()> {
        if schedule.is_empty() {
            return Err(AllocationError::EmptySchedule);
        }
        schedule.ensure_currency()?;
        for charge in charges {
            charge.ensure_currency(schedule.currency)?;
        }
        Ok(())
    }

    /// dispatch on transaction type, then record the allocation
    fn process(
        &self,
        transaction: &mut Transaction,
        schedule: &mut Schedule,
        charges: &mut [LoanCharge],
    ) -> Result<()> {
        let currency = schedule.currency;
        let installments = schedule.installments_mut();
        let mut amount = transaction.amount;

        let allocation = match transaction.transaction_type {
            TransactionType::Repayment | TransactionType::Recovery => {
                let (portions, overpayment) = allocation::allocate_repayment(
                    &self.rules,
                    transaction.date,
                    amount,
                    installments,
                )?;
                let mut charges_paid_by =
                    charges::pay_charges(charges, ChargeKind::Fee, portions.fee_portion)?;
                charges_paid_by.extend(charges::pay_charges(
                    charges,
                    ChargeKind::Penalty,
                    portions.penalty_portion,
                )?);
                Allocation {
                    portions,
                    overpayment,
                    charges_paid_by,
                }
            }
            TransactionType::WaiveInterest => {
                let (portions, overpayment) =
                    allocation::allocate_interest_waiver(amount, installments)?;
                Allocation {
                    portions,
                    overpayment,
                    charges_paid_by: Vec::new(),
                }
            }
            TransactionType::WriteOff => {
                let portions = write_off::write_off_outstanding(currency, installments)?;
                // a write-off is worth whatever was still outstanding
                amount = portions.total()?;
                Allocation {
                    portions,
                    overpayment: Money::zero(currency),
                    charges_paid_by: charges::write_off_charges(charges)?,
                }
            }
            TransactionType::Refund => {
                let (portions, unmatched) =
                    refund::allocate_refund(self.rules.due_order, amount, installments)?;
                let mut charges_paid_by =
                    charges::refund_charges(charges, ChargeKind::Penalty, portions.penalty_portion)?;
                charges_paid_by.extend(charges::refund_charges(
                    charges,
                    ChargeKind::Fee,
                    portions.fee_portion,
                )?);
                if unmatched.is_greater_than_zero() {
                    warn!(
                        "refund {} exceeds payments on schedule by {}",
                        transaction.id, unmatched
                    );
                }
                Allocation {
                    portions,
                    overpayment: unmatched,
                    charges_paid_by,
                }
            }
        };

        if allocation.overpayment.is_greater_than_zero()
            && transaction.transaction_type != TransactionType::Refund
        {
            warn!(
                "{:?} {} left overpayment of {}",
                transaction.transaction_type, transaction.id, allocation.overpayment
            );
        }
        debug!(
            "{:?} {} on {} allocated: principal {}, interest {}, fee {}, penalty {}",
            transaction.transaction_type,
            transaction.id,
            transaction.date,
            allocation.portions.principal_portion,
            allocation.portions.interest_portion,
            allocation.portions.fee_portion,
            allocation.portions.penalty_portion,
        );
        debug_assert_eq!(allocation.accounted()?, amount);

        transaction.amount = amount;
        transaction.allocation = Some(allocation);
        Ok(())
    }
}
