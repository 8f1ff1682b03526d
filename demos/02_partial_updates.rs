/// partial updates - range checks use the stored value of the side not supplied
use credit_registry_rs::{
    BankDraft, BankPatch, BankType, CreditRegistry, InMemoryStore, Rate, RegistryConfig, SafeTimeProvider,
    TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== partial update example ===\n");

    let time = SafeTimeProvider::new(TimeSource::System);
    let mut registry = CreditRegistry::new(InMemoryStore::new(), RegistryConfig::default(), time)?;

    let bank = registry.create_bank(
        BankDraft::new("Banco Pacifico", BankType::Private)
            .interest_range(Rate::from_percentage(8), Rate::from_percentage(10))
            .term_range(6, 60),
    )?;
    println!("stored range: {:?} - {:?}", bank.interest_rate_min, bank.interest_rate_max);

    // only the lower bound is supplied; 11 > stored max of 10
    let patch: BankPatch = serde_json::from_str(r#"{"interest_rate_min": "11"}"#)?;
    match registry.patch_bank(bank.id, &patch) {
        Ok(_) => println!("unexpected success"),
        Err(err) => {
            let errors = err.validation_errors().ok_or("expected field errors")?;
            println!("rejected: {}", serde_json::to_string(errors)?);
        }
    }

    // clearing the upper bound makes any lower bound acceptable
    let patch: BankPatch = serde_json::from_str(r#"{"interest_rate_min": "11", "interest_rate_max": null}"#)?;
    let bank = registry.patch_bank(bank.id, &patch)?;
    println!("updated range: {:?} - {:?}", bank.interest_rate_min, bank.interest_rate_max);
    println!("term range untouched: {:?} - {:?}", bank.term_min_months, bank.term_max_months);

    Ok(())
}
