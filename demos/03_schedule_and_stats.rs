/// schedule and statistics - repayment plan preview and aggregate figures
use credit_registry_rs::{
    BankDraft, BankType, ClientDraft, CreditDraft, CreditRegistry, CreditType, InMemoryStore, Money,
    Rate, RegistryConfig, SafeTimeProvider, TimeSource,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== schedule and statistics example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap()));
    let mut registry = CreditRegistry::new(InMemoryStore::new(), RegistryConfig::default(), time)?;

    let bank = registry.create_bank(BankDraft::new("Banco Austral", BankType::Private))?;
    let client = registry.register_client(ClientDraft::new(
        "Diego Campos",
        NaiveDate::from_ymd_opt(1982, 11, 3).unwrap(),
        "diego@example.com",
    ))?;

    let plans = [
        (CreditType::Mortgage, 900_000, 240, dec!(9.50)),
        (CreditType::Automotive, 35_000, 48, dec!(13.25)),
        (CreditType::Automotive, 18_000, 24, dec!(15.00)),
    ];
    let mut ids = Vec::new();
    for (credit_type, amount, term, rate) in plans {
        let credit = registry.create_credit(CreditDraft {
            client_id: client.id,
            bank_id: bank.id,
            description: format!("{:?} credit", credit_type),
            amount: Money::from_major(amount),
            min_payment: Money::from_major(500),
            max_payment: Money::from_major(9_000),
            term_months: term,
            credit_type,
            interest_rate: Some(Rate::from_percent(rate)),
        })?;
        ids.push(credit.id);
    }

    let schedule = registry.credit_schedule(ids[1])?;
    println!("installment: {}", schedule.monthly_installment);
    for payment in schedule.payments.iter().take(3) {
        println!(
            "  #{} {} interest {} principal {} balance {}",
            payment.payment_number,
            payment.payment_date.format("%Y-%m-%d"),
            payment.interest_portion,
            payment.principal_portion,
            payment.ending_balance
        );
    }
    println!("  total interest: {}", schedule.total_interest);

    let stats = registry.credit_statistics(Some(bank.id))?;
    println!("\n{}", stats.to_json_pretty()?);

    let holder = registry.client_with_credits(client.id)?;
    println!("\nclient with {} credits:\n{}", holder.credits.len(), holder.to_json_pretty()?);

    Ok(())
}
