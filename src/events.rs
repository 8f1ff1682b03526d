use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{BankId, ClientId, CreditId, CreditOwner, CreditType};

/// all events emitted by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryEvent {
    // bank events
    BankCreated {
        bank_id: BankId,
        name: String,
        timestamp: DateTime<Utc>,
    },
    BankUpdated {
        bank_id: BankId,
        timestamp: DateTime<Utc>,
    },
    BankDeleted {
        bank_id: BankId,
        timestamp: DateTime<Utc>,
    },

    // client events
    ClientRegistered {
        client_id: ClientId,
        email: String,
        age: i32,
        timestamp: DateTime<Utc>,
    },
    ClientUpdated {
        client_id: ClientId,
        age: i32,
        timestamp: DateTime<Utc>,
    },
    ClientDeleted {
        client_id: ClientId,
        timestamp: DateTime<Utc>,
    },

    // credit events
    /// carries what a downstream notifier needs to reach the client
    CreditRegistered {
        credit_id: CreditId,
        client_id: ClientId,
        client_email: String,
        bank_id: BankId,
        credit_type: CreditType,
        amount: Money,
        interest_rate: Rate,
        monthly_installment: Option<Money>,
        total_payable: Option<Money>,
        timestamp: DateTime<Utc>,
    },
    CreditUpdated {
        credit_id: CreditId,
        monthly_installment: Option<Money>,
        total_payable: Option<Money>,
        timestamp: DateTime<Utc>,
    },
    CreditDeleted {
        credit_id: CreditId,
        timestamp: DateTime<Utc>,
    },

    // guard events
    DeleteDenied {
        owner: CreditOwner,
        dependent_count: u64,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<RegistryEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_drains_store() {
        let mut store = EventStore::new();
        store.emit(RegistryEvent::CreditDeleted {
            credit_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });
        store.emit(RegistryEvent::DeleteDenied {
            owner: CreditOwner::Bank(Uuid::new_v4()),
            dependent_count: 2,
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 2);
        let taken = store.take_events();
        assert_eq!(taken.len(), 2);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_clear_discards_pending_events() {
        let mut store = EventStore::new();
        store.emit(RegistryEvent::BankDeleted {
            bank_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });
        store.clear();
        assert!(store.events().is_empty());
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn test_event_serializes_with_variant_tag() {
        let event = RegistryEvent::DeleteDenied {
            owner: CreditOwner::Client(Uuid::nil()),
            dependent_count: 1,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["DeleteDenied"]["dependent_count"], 1);
        assert_eq!(json["DeleteDenied"]["owner"]["entity"], "client");
    }
}
