use std::collections::HashMap;

use tracing::debug;

use super::EntityStore;
use crate::entities::{Bank, Client, Credit};
use crate::errors::{RegistryError, Result};
use crate::types::{BankId, ClientId, CreditId, CreditOwner};

#[derive(Debug, Clone, Default)]
struct Tables {
    banks: HashMap<BankId, Bank>,
    clients: HashMap<ClientId, Client>,
    credits: HashMap<CreditId, Credit>,
}

/// in-process store with snapshot-based transactions
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Tables,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn constraint(message: impl Into<String>) -> RegistryError {
        RegistryError::Storage {
            message: message.into(),
        }
    }

    fn check_bank_constraints(&self, bank: &Bank) -> Result<()> {
        if self.bank_name_taken(&bank.name, Some(bank.id))? {
            return Err(Self::constraint(format!("duplicate bank name: {}", bank.name)));
        }
        if let Some(code) = &bank.code {
            if self.bank_code_taken(code, Some(bank.id))? {
                return Err(Self::constraint(format!("duplicate bank code: {}", code)));
            }
        }
        Ok(())
    }

    fn check_client_constraints(&self, client: &Client) -> Result<()> {
        if self.client_email_taken(&client.email, Some(client.id))? {
            return Err(Self::constraint(format!("duplicate client email: {}", client.email)));
        }
        if let Some(bank_id) = client.bank_id {
            if !self.tables.banks.contains_key(&bank_id) {
                return Err(Self::constraint(format!("unknown bank {}", bank_id)));
            }
        }
        Ok(())
    }

    fn check_credit_constraints(&self, credit: &Credit) -> Result<()> {
        if !self.tables.clients.contains_key(&credit.client_id) {
            return Err(Self::constraint(format!("unknown client {}", credit.client_id)));
        }
        if !self.tables.banks.contains_key(&credit.bank_id) {
            return Err(Self::constraint(format!("unknown bank {}", credit.bank_id)));
        }
        Ok(())
    }

    fn owned_by(credit: &Credit, owner: CreditOwner) -> bool {
        match owner {
            CreditOwner::Bank(id) => credit.bank_id == id,
            CreditOwner::Client(id) => credit.client_id == id,
        }
    }
}

impl EntityStore for InMemoryStore {
    fn insert_bank(&mut self, bank: Bank) -> Result<()> {
        if self.tables.banks.contains_key(&bank.id) {
            return Err(Self::constraint(format!("bank {} already exists", bank.id)));
        }
        self.check_bank_constraints(&bank)?;
        self.tables.banks.insert(bank.id, bank);
        Ok(())
    }

    fn bank(&self, id: BankId) -> Result<Option<Bank>> {
        Ok(self.tables.banks.get(&id).cloned())
    }

    fn replace_bank(&mut self, bank: Bank) -> Result<()> {
        if !self.tables.banks.contains_key(&bank.id) {
            return Err(RegistryError::NotFound { entity: "bank", id: bank.id });
        }
        self.check_bank_constraints(&bank)?;
        self.tables.banks.insert(bank.id, bank);
        Ok(())
    }

    fn remove_bank(&mut self, id: BankId) -> Result<bool> {
        if self.tables.banks.remove(&id).is_none() {
            return Ok(false);
        }
        self.tables.credits.retain(|_, credit| credit.bank_id != id);
        for client in self.tables.clients.values_mut() {
            if client.bank_id == Some(id) {
                client.bank_id = None;
            }
        }
        debug!(bank_id = %id, "bank_row_removed");
        Ok(true)
    }

    fn banks(&self) -> Result<Vec<Bank>> {
        let mut banks: Vec<Bank> = self.tables.banks.values().cloned().collect();
        banks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(banks)
    }

    fn bank_name_taken(&self, name: &str, exclude: Option<BankId>) -> Result<bool> {
        Ok(self
            .tables
            .banks
            .values()
            .any(|b| Some(b.id) != exclude && b.name == name))
    }

    fn bank_code_taken(&self, code: &str, exclude: Option<BankId>) -> Result<bool> {
        Ok(self
            .tables
            .banks
            .values()
            .any(|b| Some(b.id) != exclude && b.code.as_deref() == Some(code)))
    }

    fn insert_client(&mut self, client: Client) -> Result<()> {
        if self.tables.clients.contains_key(&client.id) {
            return Err(Self::constraint(format!("client {} already exists", client.id)));
        }
        self.check_client_constraints(&client)?;
        self.tables.clients.insert(client.id, client);
        Ok(())
    }

    fn client(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.tables.clients.get(&id).cloned())
    }

    fn replace_client(&mut self, client: Client) -> Result<()> {
        if !self.tables.clients.contains_key(&client.id) {
            return Err(RegistryError::NotFound { entity: "client", id: client.id });
        }
        self.check_client_constraints(&client)?;
        self.tables.clients.insert(client.id, client);
        Ok(())
    }

    fn remove_client(&mut self, id: ClientId) -> Result<bool> {
        if self.tables.clients.remove(&id).is_none() {
            return Ok(false);
        }
        self.tables.credits.retain(|_, credit| credit.client_id != id);
        debug!(client_id = %id, "client_row_removed");
        Ok(true)
    }

    fn clients(&self) -> Result<Vec<Client>> {
        let mut clients: Vec<Client> = self.tables.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(clients)
    }

    fn client_email_taken(&self, email: &str, exclude: Option<ClientId>) -> Result<bool> {
        let email = email.to_lowercase();
        Ok(self
            .tables
            .clients
            .values()
            .any(|c| Some(c.id) != exclude && c.email.to_lowercase() == email))
    }

    fn client_phones(&self, exclude: Option<ClientId>) -> Result<Vec<String>> {
        Ok(self
            .tables
            .clients
            .values()
            .filter(|c| Some(c.id) != exclude)
            .filter_map(|c| c.phone.clone())
            .filter(|p| !p.trim().is_empty())
            .collect())
    }

    fn insert_credit(&mut self, credit: Credit) -> Result<()> {
        if self.tables.credits.contains_key(&credit.id) {
            return Err(Self::constraint(format!("credit {} already exists", credit.id)));
        }
        self.check_credit_constraints(&credit)?;
        self.tables.credits.insert(credit.id, credit);
        Ok(())
    }

    fn credit(&self, id: CreditId) -> Result<Option<Credit>> {
        Ok(self.tables.credits.get(&id).cloned())
    }

    fn replace_credit(&mut self, credit: Credit) -> Result<()> {
        if !self.tables.credits.contains_key(&credit.id) {
            return Err(RegistryError::NotFound { entity: "credit", id: credit.id });
        }
        self.check_credit_constraints(&credit)?;
        self.tables.credits.insert(credit.id, credit);
        Ok(())
    }

    fn remove_credit(&mut self, id: CreditId) -> Result<bool> {
        Ok(self.tables.credits.remove(&id).is_some())
    }

    fn credits(&self) -> Result<Vec<Credit>> {
        let mut credits: Vec<Credit> = self.tables.credits.values().cloned().collect();
        credits.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(credits)
    }

    fn credits_for(&self, owner: CreditOwner) -> Result<Vec<Credit>> {
        Ok(self
            .credits()?
            .into_iter()
            .filter(|c| Self::owned_by(c, owner))
            .collect())
    }

    fn credit_count(&self, owner: CreditOwner) -> Result<u64> {
        Ok(self
            .tables
            .credits
            .values()
            .filter(|c| Self::owned_by(c, owner))
            .count() as u64)
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.tables.clone();
        let result = f(self);
        if result.is_err() {
            self.tables = snapshot;
            debug!("transaction_rolled_back");
        }
        result
    }
}
