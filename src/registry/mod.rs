pub mod views;

pub use views::{ClientWithCredits, CreditStatistics};

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::entities::{Bank, BankDraft, BankPatch, Client, ClientDraft, ClientPatch, Credit, CreditDraft, CreditPatch};
use crate::errors::{RegistryError, Result};
use crate::events::{EventStore, RegistryEvent};
use crate::guard::{DeleteCheck, DeleteGuard, DeleteOutcome};
use crate::payments::{derive_terms, AmortizationSchedule};
use crate::store::EntityStore;
use crate::types::{BankId, ClientId, CreditId, CreditOwner};
use crate::validation::{validate_bank, validate_client, validate_credit, ClientEntry};

/// Credit registry over an entity store.
///
/// Every write runs validate -> derive -> persist inside one store transaction,
/// so a rejected write leaves the stored data unchanged.
pub struct CreditRegistry<S: EntityStore> {
    store: S,
    config: RegistryConfig,
    time: SafeTimeProvider,
    pub events: EventStore,
}

impl<S: EntityStore> CreditRegistry<S> {
    pub fn new(store: S, config: RegistryConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            time,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    /// calendar date used for age checks
    pub fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        self.events.take_events()
    }

    // banks

    pub fn create_bank(&mut self, draft: BankDraft) -> Result<Bank> {
        let now = self.time.now();
        let bank = self
            .store
            .transaction(|tx| {
                let clean = validate_bank(draft, &*tx, None)?;
                let bank = Bank::from_draft(Uuid::new_v4(), clean, now);
                tx.insert_bank(bank.clone())?;
                Ok(bank)
            })
            .map_err(|e| rejected("bank", e))?;

        info!(bank_id = %bank.id, name = %bank.name, "bank_created");
        self.events.emit(RegistryEvent::BankCreated {
            bank_id: bank.id,
            name: bank.name.clone(),
            timestamp: now,
        });
        Ok(bank)
    }

    /// full update
    pub fn update_bank(&mut self, id: BankId, draft: BankDraft) -> Result<Bank> {
        let now = self.time.now();
        let bank = self
            .store
            .transaction(|tx| {
                let mut bank = tx.bank(id)?.ok_or(RegistryError::NotFound { entity: "bank", id })?;
                let clean = validate_bank(draft, &*tx, Some(id))?;
                bank.apply(clean, now);
                tx.replace_bank(bank.clone())?;
                Ok(bank)
            })
            .map_err(|e| rejected("bank", e))?;

        info!(bank_id = %bank.id, "bank_updated");
        self.events.emit(RegistryEvent::BankUpdated {
            bank_id: bank.id,
            timestamp: now,
        });
        Ok(bank)
    }

    /// partial update; unsupplied fields keep their stored values
    pub fn patch_bank(&mut self, id: BankId, patch: &BankPatch) -> Result<Bank> {
        let current = self.get_bank(id)?;
        self.update_bank(id, patch.merge_onto(&current))
    }

    pub fn can_delete_bank(&self, id: BankId) -> Result<DeleteCheck> {
        DeleteGuard::can_delete(&self.store, CreditOwner::Bank(id))
    }

    /// guarded delete; client references to the bank are cleared
    pub fn delete_bank(&mut self, id: BankId) -> Result<DeleteOutcome> {
        self.guarded_delete(CreditOwner::Bank(id))
    }

    pub fn get_bank(&self, id: BankId) -> Result<Bank> {
        self.store
            .bank(id)?
            .ok_or(RegistryError::NotFound { entity: "bank", id })
    }

    pub fn list_banks(&self) -> Result<Vec<Bank>> {
        self.store.banks()
    }

    // clients

    /// public registration; the client must be an adult
    pub fn register_client(&mut self, draft: ClientDraft) -> Result<Client> {
        self.save_client(None, draft, ClientEntry::Registration)
    }

    /// bulk import; only the stored age bounds apply
    pub fn import_client(&mut self, draft: ClientDraft) -> Result<Client> {
        self.save_client(None, draft, ClientEntry::Import)
    }

    /// full update; the adult rule applies only when the birth date changes
    pub fn update_client(&mut self, id: ClientId, draft: ClientDraft) -> Result<Client> {
        self.save_client(Some(id), draft, ClientEntry::Registration)
    }

    pub fn patch_client(&mut self, id: ClientId, patch: &ClientPatch) -> Result<Client> {
        let current = self.get_client(id)?;
        self.update_client(id, patch.merge_onto(&current))
    }

    pub fn can_delete_client(&self, id: ClientId) -> Result<DeleteCheck> {
        DeleteGuard::can_delete(&self.store, CreditOwner::Client(id))
    }

    pub fn delete_client(&mut self, id: ClientId) -> Result<DeleteOutcome> {
        self.guarded_delete(CreditOwner::Client(id))
    }

    pub fn get_client(&self, id: ClientId) -> Result<Client> {
        self.store
            .client(id)?
            .ok_or(RegistryError::NotFound { entity: "client", id })
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        self.store.clients()
    }

    pub fn client_with_credits(&self, id: ClientId) -> Result<ClientWithCredits> {
        let client = self.get_client(id)?;
        let credits = self.store.credits_for(CreditOwner::Client(id))?;
        Ok(ClientWithCredits { client, credits })
    }

    fn save_client(&mut self, id: Option<ClientId>, draft: ClientDraft, entry: ClientEntry) -> Result<Client> {
        let now = self.time.now();
        let today = now.date_naive();
        let config = &self.config.validation;

        let client = self
            .store
            .transaction(|tx| {
                let current = match id {
                    Some(id) => Some(tx.client(id)?.ok_or(RegistryError::NotFound { entity: "client", id })?),
                    None => None,
                };
                let entry = match &current {
                    Some(stored) if stored.birth_date == draft.birth_date => ClientEntry::Update,
                    _ => entry,
                };
                let valid = validate_client(draft, &*tx, id, today, config, entry)?;
                match current {
                    Some(mut client) => {
                        client.apply(valid.draft, valid.age, now);
                        tx.replace_client(client.clone())?;
                        Ok(client)
                    }
                    None => {
                        let client = Client::from_draft(Uuid::new_v4(), valid.draft, valid.age, now);
                        tx.insert_client(client.clone())?;
                        Ok(client)
                    }
                }
            })
            .map_err(|e| rejected("client", e))?;

        if id.is_some() {
            info!(client_id = %client.id, age = client.age, "client_updated");
            self.events.emit(RegistryEvent::ClientUpdated {
                client_id: client.id,
                age: client.age,
                timestamp: now,
            });
        } else {
            info!(client_id = %client.id, age = client.age, entry = ?entry, "client_registered");
            self.events.emit(RegistryEvent::ClientRegistered {
                client_id: client.id,
                email: client.email.clone(),
                age: client.age,
                timestamp: now,
            });
        }
        Ok(client)
    }

    // credits

    pub fn create_credit(&mut self, draft: CreditDraft) -> Result<Credit> {
        let now = self.time.now();
        let (credit, client_email) = self.save_credit(None, draft, now)?;

        info!(
            credit_id = %credit.id,
            client_id = %credit.client_id,
            bank_id = %credit.bank_id,
            "credit_created"
        );
        self.events.emit(RegistryEvent::CreditRegistered {
            credit_id: credit.id,
            client_id: credit.client_id,
            client_email,
            bank_id: credit.bank_id,
            credit_type: credit.credit_type,
            amount: credit.amount,
            interest_rate: credit.interest_rate,
            monthly_installment: credit.monthly_installment,
            total_payable: credit.total_payable,
            timestamp: now,
        });
        Ok(credit)
    }

    /// full update; derived amounts are recomputed
    pub fn update_credit(&mut self, id: CreditId, draft: CreditDraft) -> Result<Credit> {
        let now = self.time.now();
        let (credit, _) = self.save_credit(Some(id), draft, now)?;

        info!(credit_id = %credit.id, "credit_updated");
        self.events.emit(RegistryEvent::CreditUpdated {
            credit_id: credit.id,
            monthly_installment: credit.monthly_installment,
            total_payable: credit.total_payable,
            timestamp: now,
        });
        Ok(credit)
    }

    pub fn patch_credit(&mut self, id: CreditId, patch: &CreditPatch) -> Result<Credit> {
        let current = self.get_credit(id)?;
        self.update_credit(id, patch.merge_onto(&current))
    }

    /// credits have no dependents, so no guard applies
    pub fn delete_credit(&mut self, id: CreditId) -> Result<()> {
        if !self.store.remove_credit(id)? {
            return Err(RegistryError::NotFound { entity: "credit", id });
        }
        info!(credit_id = %id, "credit_deleted");
        self.events.emit(RegistryEvent::CreditDeleted {
            credit_id: id,
            timestamp: self.time.now(),
        });
        Ok(())
    }

    pub fn get_credit(&self, id: CreditId) -> Result<Credit> {
        self.store
            .credit(id)?
            .ok_or(RegistryError::NotFound { entity: "credit", id })
    }

    /// newest registration first
    pub fn list_credits(&self) -> Result<Vec<Credit>> {
        self.store.credits()
    }

    pub fn credits_for(&self, owner: CreditOwner) -> Result<Vec<Credit>> {
        self.store.credits_for(owner)
    }

    /// totals over all credits, or only the credits of `bank`
    pub fn credit_statistics(&self, bank: Option<BankId>) -> Result<CreditStatistics> {
        let credits = match bank {
            Some(id) => {
                self.get_bank(id)?;
                self.store.credits_for(CreditOwner::Bank(id))?
            }
            None => self.store.credits()?,
        };
        Ok(CreditStatistics::from_credits(bank, &credits))
    }

    /// repayment plan starting at the credit's registration date
    pub fn credit_schedule(&self, id: CreditId) -> Result<AmortizationSchedule> {
        let credit = self.get_credit(id)?;
        AmortizationSchedule::generate(credit.amount, credit.interest_rate, credit.term_months, credit.registered_at)
    }

    /// returns the stored credit and the owning client's email
    fn save_credit(
        &mut self,
        id: Option<CreditId>,
        draft: CreditDraft,
        now: DateTime<Utc>,
    ) -> Result<(Credit, String)> {
        let default_rate = self.config.credit.default_interest_rate;

        self.store
            .transaction(|tx| {
                let current = match id {
                    Some(id) => Some(tx.credit(id)?.ok_or(RegistryError::NotFound { entity: "credit", id })?),
                    None => None,
                };
                let valid = validate_credit(draft, &*tx, default_rate)?;

                // derive before persist
                let terms = derive_terms(
                    Some(valid.draft.amount),
                    Some(valid.interest_rate),
                    Some(valid.draft.term_months),
                )?;
                debug!(
                    amount = %valid.draft.amount,
                    rate = %valid.interest_rate,
                    term_months = valid.draft.term_months,
                    installment = ?terms.map(|t| t.monthly_installment.to_string()),
                    "credit_terms_derived"
                );

                let credit = match current {
                    Some(mut credit) => {
                        credit.apply(valid.draft, valid.interest_rate, terms, now);
                        tx.replace_credit(credit.clone())?;
                        credit
                    }
                    None => {
                        let credit = Credit::from_draft(Uuid::new_v4(), valid.draft, valid.interest_rate, terms, now);
                        tx.insert_credit(credit.clone())?;
                        credit
                    }
                };

                let email = tx
                    .client(credit.client_id)?
                    .map(|c| c.email)
                    .unwrap_or_default();
                Ok((credit, email))
            })
            .map_err(|e| rejected("credit", e))
    }

    fn guarded_delete(&mut self, owner: CreditOwner) -> Result<DeleteOutcome> {
        let outcome = DeleteGuard::delete_if_safe(&mut self.store, owner)?;
        let timestamp = self.time.now();

        let event = match (outcome.success, owner) {
            (false, _) => RegistryEvent::DeleteDenied {
                owner,
                dependent_count: outcome.details.dependent_count,
                timestamp,
            },
            (true, CreditOwner::Bank(bank_id)) => RegistryEvent::BankDeleted { bank_id, timestamp },
            (true, CreditOwner::Client(client_id)) => RegistryEvent::ClientDeleted { client_id, timestamp },
        };
        self.events.emit(event);
        Ok(outcome)
    }
}

/// log a rejected write and pass the error through
fn rejected(entity: &'static str, err: RegistryError) -> RegistryError {
    match &err {
        RegistryError::Validation(errors) => {
            let fields: Vec<&str> = errors.fields().collect();
            warn!(entity, fields = %fields.join(","), "write_rejected");
        }
        other => warn!(entity, error = %other, "write_failed"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::store::InMemoryStore;
    use crate::types::{BankType, CreditType};
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn registry() -> CreditRegistry<InMemoryStore> {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()));
        CreditRegistry::new(InMemoryStore::new(), RegistryConfig::default(), time).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (CreditRegistry<InMemoryStore>, Bank, Client) {
        let mut registry = registry();
        let bank = registry
            .create_bank(BankDraft::new("Banco Central", BankType::Government).code("BC"))
            .unwrap();
        let client = registry
            .register_client(ClientDraft::new("Lucia Vega", date(1990, 4, 2), "Lucia@Test.com").bank(bank.id))
            .unwrap();
        (registry, bank, client)
    }

    fn credit_draft(bank: &Bank, client: &Client) -> CreditDraft {
        CreditDraft {
            client_id: client.id,
            bank_id: bank.id,
            description: "Auto familiar".to_string(),
            amount: Money::from_major(50_000),
            min_payment: Money::from_major(3_000),
            max_payment: Money::from_major(5_000),
            term_months: 12,
            credit_type: CreditType::Automotive,
            interest_rate: Some(Rate::from_percentage(12)),
        }
    }

    #[test]
    fn test_credit_write_derives_terms() {
        let (mut registry, bank, client) = seeded();
        let credit = registry.create_credit(credit_draft(&bank, &client)).unwrap();

        assert_eq!(credit.monthly_installment, Some(Money::from_decimal(dec!(4442.44))));
        assert_eq!(credit.total_payable, Some(Money::from_decimal(dec!(53309.28))));
        assert_eq!(credit.registered_at, registry.time().now());

        let events = registry.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            RegistryEvent::CreditRegistered { client_email, .. } if client_email == "lucia@test.com"
        )));
    }

    #[test]
    fn test_partial_credit_update_recomputes_terms() {
        let (mut registry, bank, client) = seeded();
        let credit = registry.create_credit(credit_draft(&bank, &client)).unwrap();
        let registered_at = credit.registered_at;

        registry.time().test_control().unwrap().advance(Duration::days(10));
        let patch = CreditPatch {
            interest_rate: Some(Some(Rate::ZERO)),
            amount: Some(Money::from_major(12_000)),
            ..Default::default()
        };
        // zero rate is a valid calculator input but not a valid credit rate
        let errors = registry
            .patch_credit(credit.id, &patch)
            .unwrap_err()
            .validation_errors()
            .cloned()
            .unwrap();
        assert!(errors.contains("interest_rate"));

        let patch = CreditPatch {
            term_months: Some(24),
            ..Default::default()
        };
        let updated = registry.patch_credit(credit.id, &patch).unwrap();
        assert_eq!(updated.registered_at, registered_at);
        assert_eq!(updated.interest_rate, Rate::from_percentage(12));
        assert_eq!(updated.monthly_installment, Some(Money::from_decimal(dec!(2353.67))));
        assert_eq!(updated.total_payable, Some(Money::from_decimal(dec!(56488.08))));
    }

    #[test]
    fn test_default_rate_applies_when_omitted() {
        let (mut registry, bank, client) = seeded();
        let mut draft = credit_draft(&bank, &client);
        draft.interest_rate = None;
        let credit = registry.create_credit(draft).unwrap();
        assert_eq!(credit.interest_rate, Rate::from_percent(dec!(12.00)));
    }

    #[test]
    fn test_rejected_credit_is_not_persisted() {
        let (mut registry, bank, client) = seeded();
        let mut draft = credit_draft(&bank, &client);
        draft.min_payment = Money::from_major(6_000);

        let err = registry.create_credit(draft).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["max_payment"]);
        assert!(registry.list_credits().unwrap().is_empty());
    }

    #[test]
    fn test_client_delete_guard_flow() {
        let (mut registry, bank, client) = seeded();

        let other = registry
            .register_client(ClientDraft::new("Raul Soto", date(1970, 1, 1), "raul@test.com"))
            .unwrap();
        let outcome = registry.delete_client(other.id).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.deleted_id, Some(other.id));

        registry.create_credit(credit_draft(&bank, &client)).unwrap();
        let outcome = registry.delete_client(client.id).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.details.dependent_count, 1);
        assert!(registry.get_client(client.id).is_ok());

        let events = registry.take_events();
        assert!(events.iter().any(|e| matches!(e, RegistryEvent::ClientDeleted { client_id, .. } if *client_id == other.id)));
        assert!(events.iter().any(|e| matches!(e, RegistryEvent::DeleteDenied { dependent_count: 1, .. })));
    }

    #[test]
    fn test_bank_delete_clears_client_reference() {
        let (mut registry, bank, client) = seeded();
        assert!(registry.can_delete_bank(bank.id).unwrap().allowed);

        let outcome = registry.delete_bank(bank.id).unwrap();
        assert!(outcome.success);
        assert_eq!(registry.get_client(client.id).unwrap().bank_id, None);
        assert!(matches!(registry.get_bank(bank.id), Err(RegistryError::NotFound { .. })));
    }

    #[test]
    fn test_bank_with_credits_cannot_be_deleted() {
        let (mut registry, bank, client) = seeded();
        registry.create_credit(credit_draft(&bank, &client)).unwrap();
        registry.create_credit(credit_draft(&bank, &client)).unwrap();

        let check = registry.can_delete_bank(bank.id).unwrap();
        assert!(!check.allowed);
        let outcome = registry.delete_bank(bank.id).unwrap();
        assert_eq!(outcome.details.dependent_count, 2);
        assert_eq!(registry.get_client(client.id).unwrap().bank_id, Some(bank.id));
    }

    #[test]
    fn test_partial_bank_update_blames_upper_bound() {
        let mut registry = registry();
        let bank = registry
            .create_bank(
                BankDraft::new("Banco Plata", BankType::Private)
                    .interest_range(Rate::from_percentage(8), Rate::from_percentage(10)),
            )
            .unwrap();

        let patch = BankPatch {
            interest_rate_min: Some(Some(Rate::from_percentage(11))),
            ..Default::default()
        };
        let err = registry.patch_bank(bank.id, &patch).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("interest_rate_max"));
        assert_eq!(
            registry.get_bank(bank.id).unwrap().interest_rate_min,
            Some(Rate::from_percentage(8))
        );
    }

    #[test]
    fn test_registration_age_follows_clock() {
        let mut registry = registry();
        let draft = ClientDraft::new("Nico Paz", date(2006, 6, 16), "nico@test.com");

        let err = registry.register_client(draft.clone()).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("birth_date"));

        registry.time().test_control().unwrap().advance(Duration::days(1));
        let client = registry.register_client(draft).unwrap();
        assert_eq!(client.age, 18);
    }

    #[test]
    fn test_import_accepts_minor_and_update_recomputes_age() {
        let mut registry = registry();
        let client = registry
            .import_client(ClientDraft::new("Sofia Paz", date(2012, 3, 1), "sofia@test.com"))
            .unwrap();
        assert_eq!(client.age, 12);

        let patch = ClientPatch {
            birth_date: Some(date(1980, 3, 1)),
            ..Default::default()
        };
        let updated = registry.patch_client(client.id, &patch).unwrap();
        assert_eq!(updated.age, 44);
        assert_eq!(updated.created_at, client.created_at);
    }

    #[test]
    fn test_imported_minor_can_be_patched() {
        let mut registry = registry();
        let client = registry
            .import_client(ClientDraft::new("Sofia Paz", date(2012, 3, 1), "sofia@test.com"))
            .unwrap();

        let patch = ClientPatch {
            phone: Some(Some("55 1234 0000".to_string())),
            ..Default::default()
        };
        let updated = registry.patch_client(client.id, &patch).unwrap();
        assert_eq!(updated.phone.as_deref(), Some("55 1234 0000"));
        assert_eq!(updated.age, 12);
        assert!(registry.patch_client(client.id, &ClientPatch::default()).is_ok());

        let patch = ClientPatch {
            birth_date: Some(date(2011, 3, 1)),
            ..Default::default()
        };
        let err = registry.patch_client(client.id, &patch).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("birth_date"));
        assert_eq!(registry.get_client(client.id).unwrap().birth_date, date(2012, 3, 1));
    }

    #[test]
    fn test_client_with_credits_and_statistics() {
        let (mut registry, bank, client) = seeded();
        let other_bank = registry
            .create_bank(BankDraft::new("Banco Nuevo", BankType::Private))
            .unwrap();
        registry.create_credit(credit_draft(&bank, &client)).unwrap();
        let mut mortgage = credit_draft(&other_bank, &client);
        mortgage.credit_type = CreditType::Mortgage;
        registry.create_credit(mortgage).unwrap();

        let view = registry.client_with_credits(client.id).unwrap();
        assert_eq!(view.credits.len(), 2);

        let all = registry.credit_statistics(None).unwrap();
        assert_eq!(all.total_credits, 2);
        assert_eq!(all.total_min_payment, Money::from_major(6_000));
        assert_eq!(all.total_max_payment, Money::from_major(10_000));
        assert_eq!(all.by_type[&CreditType::Commercial], 0);

        let one = registry.credit_statistics(Some(other_bank.id)).unwrap();
        assert_eq!(one.total_credits, 1);
        assert_eq!(one.by_type[&CreditType::Mortgage], 1);
    }

    #[test]
    fn test_credit_schedule_and_delete() {
        let (mut registry, bank, client) = seeded();
        let credit = registry.create_credit(credit_draft(&bank, &client)).unwrap();

        let schedule = registry.credit_schedule(credit.id).unwrap();
        assert_eq!(schedule.payments.len(), 12);
        assert_eq!(Some(schedule.monthly_installment), credit.monthly_installment);

        registry.delete_credit(credit.id).unwrap();
        assert!(matches!(
            registry.delete_credit(credit.id),
            Err(RegistryError::NotFound { entity: "credit", .. })
        ));
        assert!(registry.delete_client(client.id).unwrap().success);
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let mut registry = registry();
        let id = Uuid::new_v4();
        assert!(matches!(registry.get_bank(id), Err(RegistryError::NotFound { entity: "bank", .. })));
        assert!(matches!(
            registry.update_client(id, ClientDraft::new("X", date(1990, 1, 1), "x@test.com")),
            Err(RegistryError::NotFound { entity: "client", .. })
        ));
        assert!(matches!(registry.delete_bank(id), Err(RegistryError::NotFound { .. })));
    }
}
