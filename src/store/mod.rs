pub mod memory;

pub use memory::InMemoryStore;

use crate::entities::{Bank, Client, Credit};
use crate::errors::Result;
use crate::types::{BankId, ClientId, CreditId, CreditOwner};

/// Data-access seam over the three record sets.
///
/// Implementations enforce storage-level constraints (unique bank name and code,
/// unique client email, foreign keys) and the relational delete semantics:
/// removing a bank cascades its credits and clears client references, removing
/// a client cascades its credits.
pub trait EntityStore {
    fn insert_bank(&mut self, bank: Bank) -> Result<()>;
    fn bank(&self, id: BankId) -> Result<Option<Bank>>;
    fn replace_bank(&mut self, bank: Bank) -> Result<()>;
    fn remove_bank(&mut self, id: BankId) -> Result<bool>;
    /// all banks ordered by name
    fn banks(&self) -> Result<Vec<Bank>>;
    fn bank_name_taken(&self, name: &str, exclude: Option<BankId>) -> Result<bool>;
    fn bank_code_taken(&self, code: &str, exclude: Option<BankId>) -> Result<bool>;

    fn insert_client(&mut self, client: Client) -> Result<()>;
    fn client(&self, id: ClientId) -> Result<Option<Client>>;
    fn replace_client(&mut self, client: Client) -> Result<()>;
    fn remove_client(&mut self, id: ClientId) -> Result<bool>;
    /// all clients ordered by full name
    fn clients(&self) -> Result<Vec<Client>>;
    /// case-insensitive email lookup
    fn client_email_taken(&self, email: &str, exclude: Option<ClientId>) -> Result<bool>;
    /// raw stored phones of every other client that has one
    fn client_phones(&self, exclude: Option<ClientId>) -> Result<Vec<String>>;

    fn insert_credit(&mut self, credit: Credit) -> Result<()>;
    fn credit(&self, id: CreditId) -> Result<Option<Credit>>;
    fn replace_credit(&mut self, credit: Credit) -> Result<()>;
    fn remove_credit(&mut self, id: CreditId) -> Result<bool>;
    /// all credits, newest registration first
    fn credits(&self) -> Result<Vec<Credit>>;
    fn credits_for(&self, owner: CreditOwner) -> Result<Vec<Credit>>;
    fn credit_count(&self, owner: CreditOwner) -> Result<u64>;

    /// Run `f` atomically: on `Err` every change made inside is discarded.
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>;
}
