/// delete guard - banks and clients with credits cannot be removed
use credit_registry_rs::{
    BankDraft, BankType, ClientDraft, CreditDraft, CreditRegistry, CreditType, InMemoryStore, Money,
    RegistryConfig, RegistryEvent, SafeTimeProvider, TimeSource,
};
use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== delete guard example ===\n");

    let time = SafeTimeProvider::new(TimeSource::System);
    let mut registry = CreditRegistry::new(InMemoryStore::new(), RegistryConfig::default(), time)?;

    let bank = registry.create_bank(BankDraft::new("Banco del Valle", BankType::Government))?;
    let birth = NaiveDate::from_ymd_opt(1975, 2, 10).unwrap();
    let client = registry.register_client(ClientDraft::new("Jorge Lima", birth, "jorge@example.com").bank(bank.id))?;
    let idle = registry.register_client(ClientDraft::new("Marta Sol", birth, "marta@example.com"))?;

    registry.create_credit(CreditDraft {
        client_id: client.id,
        bank_id: bank.id,
        description: "Local comercial".to_string(),
        amount: Money::from_major(120_000),
        min_payment: Money::from_major(2_000),
        max_payment: Money::from_major(4_000),
        term_months: 60,
        credit_type: CreditType::Commercial,
        interest_rate: None,
    })?;

    let check = registry.can_delete_client(client.id)?;
    println!("can delete {}: {} ({:?})", client.full_name, check.allowed, check.reason);

    let denied = registry.delete_client(client.id)?;
    println!("\ndenied outcome:\n{}", denied.to_json_pretty()?);

    let deleted = registry.delete_client(idle.id)?;
    println!("\nsuccess outcome:\n{}", deleted.to_json_pretty()?);

    let bank_outcome = registry.delete_bank(bank.id)?;
    println!("\nbank delete: {}", bank_outcome.message);

    println!("\nevents:");
    for event in registry.take_events() {
        if let RegistryEvent::DeleteDenied { owner, dependent_count, .. } = event {
            println!("  denied {} with {} dependents", owner, dependent_count);
        }
    }

    Ok(())
}
