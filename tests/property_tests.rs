use chrono::{Duration, NaiveDate};
use loan_allocation_rs::{
    AllocationStrategy, Component, Currency, Installment, Money, Schedule, Transaction,
    TransactionId, TransactionProcessor, TransactionType,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

fn usd() -> Currency {
    Currency::new("USD", 2).unwrap()
}

fn cents(v: i64) -> Money {
    Money::new(Decimal::new(v, 2), usd())
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Generate a monthly schedule of 1..6 installments with random component dues.
fn arb_schedule() -> impl Strategy<Value = Schedule> {
    prop::collection::vec((0i64..50_000, 0i64..5_000, 0i64..2_000, 0i64..1_000), 1..6).prop_map(
        |dues| {
            let installments = dues
                .into_iter()
                .enumerate()
                .map(|(i, (principal, interest, fee, penalty))| {
                    let from = base_date() + Duration::days(30 * i as i64);
                    Installment::new(
                        i as u32 + 1,
                        from,
                        from + Duration::days(30),
                        cents(principal),
                        cents(interest),
                        cents(fee),
                        cents(penalty),
                    )
                })
                .collect();
            Schedule::new(Uuid::new_v4(), usd(), installments).unwrap()
        },
    )
}

fn arb_strategy() -> impl Strategy<Value = AllocationStrategy> {
    prop::sample::select(AllocationStrategy::ALL.to_vec())
}

/// Strategies that walk due installments vertically.
fn arb_vertical_strategy() -> impl Strategy<Value = AllocationStrategy> {
    prop::sample::select(vec![
        AllocationStrategy::Standard,
        AllocationStrategy::Creocore,
        AllocationStrategy::HeavensFamily,
        AllocationStrategy::EarlyPayment,
        AllocationStrategy::PrincipalFirst,
        AllocationStrategy::InterestFirst,
    ])
}

/// Money-in transaction types only; a refund or write-off can reduce paid.
fn arb_inflow_type() -> impl Strategy<Value = TransactionType> {
    prop::sample::select(vec![
        TransactionType::Repayment,
        TransactionType::Recovery,
        TransactionType::WaiveInterest,
    ])
}

fn arb_history_type() -> impl Strategy<Value = TransactionType> {
    prop::sample::select(vec![
        TransactionType::Repayment,
        TransactionType::Repayment,
        TransactionType::Recovery,
        TransactionType::WaiveInterest,
        TransactionType::Refund,
    ])
}

fn build_history(entries: Vec<(i64, i64, TransactionType)>, final_write_off: bool) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = entries
        .into_iter()
        .enumerate()
        .map(|(i, (day, amount, kind))| {
            Transaction::new(
                TransactionId(i as u64 + 1),
                base_date() + Duration::days(day),
                kind,
                cents(amount),
            )
        })
        .collect();
    if final_write_off {
        let id = TransactionId(transactions.len() as u64 + 1);
        transactions.push(Transaction::new(
            id,
            base_date() + Duration::days(400),
            TransactionType::WriteOff,
            cents(0),
        ));
    }
    transactions
}

fn arb_history() -> impl Strategy<Value = Vec<Transaction>> {
    (
        prop::collection::vec((0i64..300, 1i64..60_000, arb_history_type()), 1..10),
        any::<bool>(),
    )
        .prop_map(|(entries, write_off)| build_history(entries, write_off))
}

fn allocations_by_id(transactions: &[Transaction]) -> BTreeMap<TransactionId, String> {
    transactions
        .iter()
        .map(|t| (t.id, serde_json::to_string(t).unwrap()))
        .collect()
}

fn paid(schedule: &Schedule) -> Vec<(Decimal, Decimal, Decimal)> {
    schedule
        .installments()
        .iter()
        .flat_map(|inst| {
            Component::ALL.iter().map(move |&c| {
                let amounts = inst.component(c);
                (
                    amounts.paid.amount(),
                    amounts.waived.amount(),
                    amounts.written_off.amount(),
                )
            })
        })
        .collect()
}

proptest! {
    // ===================================================================
    // Every unit of every transaction lands in exactly one portion or in
    // the overpayment.
    // ===================================================================
    #[test]
    fn allocation_conserves_amount(
        mut schedule in arb_schedule(),
        strategy in arb_strategy(),
        mut history in arb_history(),
    ) {
        let processor = TransactionProcessor::new(strategy);
        history.sort_by_key(|t| (t.date, t.id));
        for txn in history.iter_mut() {
            processor.apply(txn, &mut schedule, &mut []).unwrap();
            let allocation = txn.allocation.as_ref().unwrap();
            prop_assert_eq!(allocation.accounted().unwrap(), txn.amount);
            prop_assert!(!allocation.overpayment.is_negative());
        }
    }

    // ===================================================================
    // With every installment due, a vertical strategy never pays a later
    // component while an earlier one in its order is still outstanding,
    // and never touches an installment while an earlier one is open.
    // ===================================================================
    #[test]
    fn priority_order_respected(
        mut schedule in arb_schedule(),
        strategy in arb_vertical_strategy(),
        amount in 1i64..80_000,
    ) {
        let processor = TransactionProcessor::new(strategy);
        let order = processor.rules().due_order.components();
        let mut txn = Transaction::repayment(
            TransactionId(1),
            base_date() + Duration::days(365),
            cents(amount),
        );
        processor.apply(&mut txn, &mut schedule, &mut []).unwrap();

        let mut open_before = false;
        for inst in schedule.installments() {
            if open_before {
                prop_assert!(!inst.has_payments());
                continue;
            }
            for (k, &component) in order.iter().enumerate() {
                if inst.outstanding(component).unwrap().is_greater_than_zero() {
                    for &later in &order[k + 1..] {
                        prop_assert!(inst.component(later).paid.is_zero());
                    }
                    break;
                }
            }
            open_before = !inst.obligations_met().unwrap();
        }
    }

    // ===================================================================
    // Repayments, recoveries and waivers only ever increase settled
    // amounts.
    // ===================================================================
    #[test]
    fn settlement_is_monotonic(
        mut schedule in arb_schedule(),
        strategy in arb_strategy(),
        entries in prop::collection::vec((0i64..300, 1i64..30_000, arb_inflow_type()), 1..8),
    ) {
        let processor = TransactionProcessor::new(strategy);
        let mut history = build_history(entries, false);
        history.sort_by_key(|t| (t.date, t.id));

        let mut before = paid(&schedule);
        for txn in history.iter_mut() {
            processor.apply(txn, &mut schedule, &mut []).unwrap();
            let after = paid(&schedule);
            for (b, a) in before.iter().zip(after.iter()) {
                prop_assert!(a.0 >= b.0 && a.1 >= b.1 && a.2 >= b.2);
            }
            before = after;
        }
    }

    // ===================================================================
    // After a write-off nothing is outstanding and later money is pure
    // overpayment.
    // ===================================================================
    #[test]
    fn write_off_is_terminal(
        mut schedule in arb_schedule(),
        strategy in arb_strategy(),
        paid_first in 0i64..40_000,
        recovered in 1i64..10_000,
    ) {
        let processor = TransactionProcessor::new(strategy);
        let mut repayment = Transaction::repayment(TransactionId(1), base_date() + Duration::days(10), cents(paid_first));
        processor.apply(&mut repayment, &mut schedule, &mut []).unwrap();
        let outstanding = schedule.total_outstanding().unwrap();

        let mut write_off = Transaction::new(TransactionId(2), base_date() + Duration::days(20), TransactionType::WriteOff, cents(0));
        processor.apply(&mut write_off, &mut schedule, &mut []).unwrap();
        prop_assert_eq!(write_off.amount, outstanding);
        prop_assert!(schedule.total_outstanding().unwrap().is_zero());

        let mut recovery = Transaction::new(TransactionId(3), base_date() + Duration::days(30), TransactionType::Recovery, cents(recovered));
        processor.apply(&mut recovery, &mut schedule, &mut []).unwrap();
        prop_assert!(recovery.portions().unwrap().total().unwrap().is_zero());
        prop_assert_eq!(recovery.overpayment(), cents(recovered));
    }

    // ===================================================================
    // A refund never takes back more than was paid on any component.
    // ===================================================================
    #[test]
    fn refund_is_bounded_by_paid(
        mut schedule in arb_schedule(),
        strategy in arb_strategy(),
        repaid in 1i64..60_000,
        refunded in 1i64..80_000,
    ) {
        let processor = TransactionProcessor::new(strategy);
        let mut repayment = Transaction::repayment(TransactionId(1), base_date() + Duration::days(40), cents(repaid));
        processor.apply(&mut repayment, &mut schedule, &mut []).unwrap();
        let total_paid = repayment.portions().unwrap().total().unwrap();

        let mut refund = Transaction::new(TransactionId(2), base_date() + Duration::days(50), TransactionType::Refund, cents(refunded));
        processor.apply(&mut refund, &mut schedule, &mut []).unwrap();

        let refunded_portions = refund.portions().unwrap().total().unwrap();
        prop_assert!(!refunded_portions.is_greater_than(&total_paid).unwrap());
        for inst in schedule.installments() {
            for component in Component::ALL {
                prop_assert!(!inst.component(component).paid.is_negative());
            }
        }
    }

    // ===================================================================
    // Replaying an unchanged history reports nothing and reproduces the
    // same allocations.
    // ===================================================================
    #[test]
    fn replay_is_idempotent(
        mut schedule in arb_schedule(),
        strategy in arb_strategy(),
        mut history in arb_history(),
    ) {
        let processor = TransactionProcessor::new(strategy);
        processor.replay(base_date(), &mut history, &mut schedule, &mut []).unwrap();
        let first_schedule = schedule.clone();
        let first_allocations = allocations_by_id(&history);

        let changed = processor.replay(base_date(), &mut history, &mut schedule, &mut []).unwrap();

        prop_assert!(changed.is_empty());
        prop_assert_eq!(schedule, first_schedule);
        prop_assert_eq!(allocations_by_id(&history), first_allocations);
    }

    // ===================================================================
    // Replay depends only on (date, id), never on input order.
    // ===================================================================
    #[test]
    fn replay_is_order_independent(
        schedule in arb_schedule(),
        strategy in arb_strategy(),
        history in arb_history(),
    ) {
        let processor = TransactionProcessor::new(strategy);

        let mut forward = history.clone();
        let mut forward_schedule = schedule.clone();
        processor.replay(base_date(), &mut forward, &mut forward_schedule, &mut []).unwrap();

        let mut backward: Vec<Transaction> = history.into_iter().rev().collect();
        let mut backward_schedule = schedule;
        processor.replay(base_date(), &mut backward, &mut backward_schedule, &mut []).unwrap();

        prop_assert_eq!(forward_schedule, backward_schedule);
        prop_assert_eq!(allocations_by_id(&forward), allocations_by_id(&backward));
    }
}
