use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::charges::{self, LoanCharge};
use crate::errors::{AllocationError, Result};
use crate::schedule::Schedule;
use crate::transaction::{ChangedTransactionDetail, Transaction, TransactionSnapshot};
use crate::types::TransactionId;

use super::TransactionProcessor;

impl TransactionProcessor {
    /// Reset the schedule and re-apply every non-reversed transaction in
    /// `(date, id)` order.
    ///
    /// Due amounts are taken as already correct; buckets are reset first, so
    /// a due lowered below what was paid is accepted. The returned detail maps
    /// each previously allocated transaction whose allocation moved to the
    /// state it had before the replay; transactions applied for the first
    /// time are never reported. Inputs are validated before anything is
    /// reset, so a rejected replay leaves schedule, charges and transactions
    /// as they were.
    pub fn replay(
        &self,
        disbursement_date: NaiveDate,
        transactions: &mut [Transaction],
        schedule: &mut Schedule,
        charges: &mut [LoanCharge],
    ) -> Result<ChangedTransactionDetail> {
        Self::check_schedule(schedule, charges)?;

        let mut order: Vec<usize> = (0..transactions.len())
            .filter(|&i| !transactions[i].reversed)
            .collect();
        order.sort_by_key(|&i| (transactions[i].date, transactions[i].id));
        Self::check_history(disbursement_date, transactions, &order, schedule)?;

        let pre_images: BTreeMap<TransactionId, TransactionSnapshot> = order
            .iter()
            .filter_map(|&i| transactions[i].snapshot().map(|s| (transactions[i].id, s)))
            .collect();

        schedule.reset_allocations();
        charges::reset_charges(charges);

        for &index in &order {
            self.process(&mut transactions[index], schedule, charges)?;
        }

        let mut changed = ChangedTransactionDetail::new();
        for &index in &order {
            let transaction = &transactions[index];
            let Some(pre_image) = pre_images.get(&transaction.id) else {
                continue;
            };
            if transaction.snapshot().as_ref() == Some(pre_image) {
                continue;
            }
            if let Some(portions) = transaction.portions() {
                let delta = portions.difference(&pre_image.allocation.portions)?;
                debug!(
                    "{} reallocated: principal {:+}, interest {:+}, fee {:+}, penalty {:+}",
                    transaction.id,
                    delta.principal_portion.amount(),
                    delta.interest_portion.amount(),
                    delta.fee_portion.amount(),
                    delta.penalty_portion.amount(),
                );
            }
            changed.insert(transaction.id, pre_image.clone());
        }

        info!(
            "replayed {} transactions on loan {} with {}: {} changed",
            order.len(),
            schedule.loan_id,
            self.strategy,
            changed.len()
        );
        Ok(changed)
    }

    fn check_history(
        disbursement_date: NaiveDate,
        transactions: &[Transaction],
        order: &[usize],
        schedule: &Schedule,
    ) -> Result<()> {
        let mut seen = BTreeSet::new();
        for &index in order {
            let transaction = &transactions[index];
            if !seen.insert(transaction.id) {
                return Err(AllocationError::DuplicateTransaction { id: transaction.id });
            }
            if transaction.date < disbursement_date {
                return Err(AllocationError::TransactionBeforeDisbursement {
                    id: transaction.id,
                    date: transaction.date,
                    disbursement_date,
                });
            }
            transaction.amount.ensure_currency(schedule.currency)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::decimal::{Currency, Money};
    use crate::errors::AllocationError;
    use crate::processor::TransactionProcessor;
    use crate::schedule::{Installment, Schedule};
    use crate::strategy::AllocationStrategy;
    use crate::transaction::Transaction;
    use crate::types::{TransactionId, TransactionType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn usd() -> Currency {
        Currency::new("USD", 2).unwrap()
    }

    fn m(v: i64) -> Money {
        Money::from_major(v, usd())
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn schedule() -> Schedule {
        Schedule::new(
            Uuid::new_v4(),
            usd(),
            vec![
                Installment::new(1, date(1, 1), date(2, 1), m(90), m(10), m(0), m(0)),
                Installment::new(2, date(2, 1), date(3, 1), m(90), m(10), m(0), m(0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_same_date_ties_broken_by_id() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![
            Transaction::repayment(TransactionId(2), date(1, 10), m(150)),
            Transaction::repayment(TransactionId(1), date(1, 10), m(60)),
        ];

        processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();

        // id 1 goes first and lands entirely on installment 1
        assert_eq!(transactions[1].portions().unwrap().principal_portion, m(50));
        assert_eq!(transactions[1].portions().unwrap().interest_portion, m(10));
        assert_eq!(transactions[0].portions().unwrap().principal_portion, m(130));
        assert_eq!(transactions[0].overpayment(), m(10));
    }

    #[test]
    fn test_reversed_transactions_are_skipped() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut reversed = Transaction::repayment(TransactionId(1), date(1, 10), m(100));
        reversed.reversed = true;
        let mut transactions = vec![
            reversed,
            Transaction::repayment(TransactionId(2), date(1, 20), m(40)),
        ];

        let changed = processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();

        assert!(changed.is_empty());
        assert!(transactions[0].allocation.is_none());
        assert_eq!(schedule.total_outstanding().unwrap(), m(160));
    }

    #[test]
    fn test_rejects_transaction_before_disbursement() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![Transaction::repayment(TransactionId(1), date(1, 10), m(40))];
        processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();
        let before = schedule.clone();

        transactions.push(Transaction::repayment(TransactionId(2), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), m(5)));
        let result = processor.replay(date(1, 1), &mut transactions, &mut schedule, &mut []);

        assert!(matches!(
            result,
            Err(AllocationError::TransactionBeforeDisbursement { .. })
        ));
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_rejects_foreign_currency_before_reset() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![Transaction::repayment(TransactionId(1), date(1, 10), m(40))];
        processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();
        let before = schedule.clone();

        let eur = Currency::new("EUR", 2).unwrap();
        transactions.push(Transaction::repayment(TransactionId(2), date(1, 20), Money::from_major(10, eur)));
        let result = processor.replay(date(1, 1), &mut transactions, &mut schedule, &mut []);

        assert!(matches!(result, Err(AllocationError::CurrencyMismatch { .. })));
        assert_eq!(schedule, before);
        assert!(transactions[1].allocation.is_none());
    }

    #[test]
    fn test_replay_accepts_due_lowered_below_paid() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![Transaction::repayment(TransactionId(1), date(1, 10), m(100))];
        processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();

        schedule.installment_mut(1).unwrap().interest.due = m(5);
        let changed = processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();

        // the freed 5 prepays installment 2 interest, portions are unchanged
        assert!(changed.is_empty());
        assert_eq!(schedule.installment(1).unwrap().interest.paid, m(5));
        assert_eq!(schedule.installment(2).unwrap().interest.paid, m(5));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![
            Transaction::repayment(TransactionId(1), date(1, 10), m(40)),
            Transaction::repayment(TransactionId(1), date(1, 12), m(40)),
        ];

        let result = processor.replay(date(1, 1), &mut transactions, &mut schedule, &mut []);
        assert!(matches!(result, Err(AllocationError::DuplicateTransaction { .. })));
    }

    #[test]
    fn test_write_off_amount_changes_are_reported() {
        let processor = TransactionProcessor::new(AllocationStrategy::Standard);
        let mut schedule = schedule();
        let mut transactions = vec![
            Transaction::repayment(TransactionId(1), date(1, 10), m(100)),
            Transaction::new(TransactionId(2), date(2, 10), TransactionType::WriteOff, m(0)),
        ];
        processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();
        assert_eq!(transactions[1].amount, m(100));

        // the repayment is reduced after the fact
        transactions[0].amount = m(40);
        let changed = processor
            .replay(date(1, 1), &mut transactions, &mut schedule, &mut [])
            .unwrap();

        assert_eq!(transactions[1].amount, m(160));
        assert_eq!(changed.get(TransactionId(2)).unwrap().amount, m(100));
        assert!(changed.contains(TransactionId(1)));
    }
}
