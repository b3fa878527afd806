/// replay walkthrough - a backdated repayment shifts an existing allocation
use chrono::NaiveDate;
use loan_allocation_rs::{
    ChargeId, ChargeKind, Currency, Installment, LoanCharge, Money, ProcessorConfig, Schedule,
    ScheduleView, Transaction, TransactionId, TransactionType, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    println!("=== replay walkthrough ===\n");

    let usd = Currency::new("USD", 2)?;
    let m = |v| Money::from_major(v, usd);
    let date = |month, day| NaiveDate::from_ymd_opt(2024, month, day).ok_or("bad date");

    let mut schedule = Schedule::new(
        Uuid::new_v4(),
        usd,
        vec![
            Installment::new(1, date(1, 1)?, date(2, 1)?, m(90), m(10), m(5), m(0)),
            Installment::new(2, date(2, 1)?, date(3, 1)?, m(140), m(10), m(5), m(0)),
            Installment::new(3, date(3, 1)?, date(4, 1)?, m(160), m(10), m(0), m(0)),
        ],
    )?;
    let mut charges = vec![
        LoanCharge::new(ChargeId(1), ChargeKind::Fee, date(2, 1)?, m(5)),
        LoanCharge::new(ChargeId(2), ChargeKind::Fee, date(3, 1)?, m(5)),
    ];

    // product configured with the standard waterfall
    let processor = ProcessorConfig::from_json(r#"{ "strategy": "1" }"#)?.build()?;
    println!("strategy: {}", processor.strategy());

    let mut transactions = vec![
        Transaction::repayment(TransactionId(2), date(2, 10)?, m(120)),
        Transaction::new(TransactionId(3), date(2, 15)?, TransactionType::WaiveInterest, m(5)),
    ];
    processor.replay(date(1, 1)?, &mut transactions, &mut schedule, &mut charges)?;
    println!("\nafter first replay:");
    println!("{}", ScheduleView::from_schedule(&schedule)?.to_json_pretty()?);

    // a repayment from january is captured late
    transactions.push(Transaction::repayment(TransactionId(1), date(1, 10)?, m(105)));
    let changed = processor.replay(date(1, 1)?, &mut transactions, &mut schedule, &mut charges)?;

    println!("\nchanged transactions:");
    for (id, before) in changed.iter() {
        let after = transactions
            .iter()
            .find(|t| t.id == *id)
            .and_then(|t| t.portions())
            .ok_or("changed transaction missing")?;
        println!(
            "  {id}: principal {} -> {}, interest {} -> {}",
            before.allocation.portions.principal_portion,
            after.principal_portion,
            before.allocation.portions.interest_portion,
            after.interest_portion,
        );
    }

    let remaining = processor.simulate_outstanding(
        &[Transaction::repayment(TransactionId(4), date(3, 20)?, m(100))],
        &schedule,
    )?;
    println!("\noutstanding after a further 100: {remaining}");

    println!("\nfinal schedule:");
    println!("{}", ScheduleView::from_schedule(&schedule)?.to_json_pretty()?);

    Ok(())
}
