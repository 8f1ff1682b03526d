pub mod bank;
pub mod client;
pub mod credit;
pub mod serialization;

pub use bank::{Bank, BankDraft, BankPatch};
pub use client::{Client, ClientDraft, ClientPatch};
pub use credit::{Credit, CreditDraft, CreditPatch};
