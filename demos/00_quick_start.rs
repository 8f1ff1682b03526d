/// quick start - register a bank, a client and a credit
use credit_registry_rs::{
    BankDraft, BankType, ClientDraft, CreditDraft, CreditRegistry, CreditType, InMemoryStore, Money,
    Rate, RegistryConfig, SafeTimeProvider, TimeSource,
};
use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    credit_registry_rs::logging::init_logging_default();

    let time = SafeTimeProvider::new(TimeSource::System);
    let mut registry = CreditRegistry::new(InMemoryStore::new(), RegistryConfig::load_default()?, time)?;

    let bank = registry.create_bank(
        BankDraft::new("Banco Andino", BankType::Private)
            .code("BA-01")
            .interest_range(Rate::from_percentage(8), Rate::from_percentage(18)),
    )?;

    let client = registry.register_client(
        ClientDraft::new("Elena Torres", NaiveDate::from_ymd_opt(1988, 7, 21).unwrap(), "elena@example.com")
            .phone("+51 (1) 555-0199")
            .bank(bank.id),
    )?;
    println!("client {} is {} years old", client.full_name, client.age);

    let credit = registry.create_credit(CreditDraft {
        client_id: client.id,
        bank_id: bank.id,
        description: "Vehiculo nuevo".to_string(),
        amount: Money::from_major(50_000),
        min_payment: Money::from_major(3_000),
        max_payment: Money::from_major(5_000),
        term_months: 12,
        credit_type: CreditType::Automotive,
        interest_rate: Some(Rate::from_percentage(12)),
    })?;

    println!("monthly installment: {:?}", credit.monthly_installment);
    println!("total payable: {:?}", credit.total_payable);
    println!("{}", serde_json::to_string_pretty(&credit)?);

    Ok(())
}
