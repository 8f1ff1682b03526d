use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a bank
pub type BankId = Uuid;

/// unique identifier for a client
pub type ClientId = Uuid;

/// unique identifier for a credit
pub type CreditId = Uuid;

/// bank ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankType {
    Private,
    Government,
}

/// bank status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BankStatus {
    #[default]
    Active,
    Inactive,
}

/// legal form of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonType {
    /// individual
    #[default]
    Natural,
    /// company or other legal entity
    Legal,
}

/// credit product
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditType {
    Automotive,
    Mortgage,
    Commercial,
}

impl CreditType {
    pub const ALL: [CreditType; 3] = [
        CreditType::Automotive,
        CreditType::Mortgage,
        CreditType::Commercial,
    ];
}

/// a record that credits can reference, i.e. a delete-guard target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum CreditOwner {
    Bank(BankId),
    Client(ClientId),
}

impl CreditOwner {
    pub fn id(&self) -> Uuid {
        match self {
            CreditOwner::Bank(id) | CreditOwner::Client(id) => *id,
        }
    }

    /// entity name used in messages
    pub fn entity(&self) -> &'static str {
        match self {
            CreditOwner::Bank(_) => "bank",
            CreditOwner::Client(_) => "client",
        }
    }
}

impl fmt::Display for CreditOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity(), self.id())
    }
}
