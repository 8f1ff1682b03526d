use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{RegistryError, Result};
use crate::store::EntityStore;
use crate::types::CreditOwner;

/// result of a delete-permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDetails {
    pub dependent_count: u64,
}

/// structured delete result; a denial is a normal outcome, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    pub details: DeleteDetails,
    /// echoed back on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_id: Option<Uuid>,
}

impl DeleteOutcome {
    fn denied(owner: CreditOwner, dependent_count: u64) -> Self {
        Self {
            success: false,
            message: denial_reason(owner, dependent_count),
            details: DeleteDetails { dependent_count },
            deleted_id: None,
        }
    }

    fn deleted(owner: CreditOwner) -> Self {
        Self {
            success: true,
            message: format!("{} deleted", owner.entity()),
            details: DeleteDetails { dependent_count: 0 },
            deleted_id: Some(owner.id()),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn denial_reason(owner: CreditOwner, count: u64) -> String {
    let noun = if count == 1 { "credit" } else { "credits" };
    format!(
        "cannot delete {}: {} associated {} must be removed first",
        owner.entity(),
        count,
        noun
    )
}

/// Delete guard for banks and clients.
///
/// A bank or client may only be removed while no credit references it. The
/// dependent count and the removal run inside one store transaction.
pub struct DeleteGuard;

impl DeleteGuard {
    /// `allowed` is false iff at least one credit references `owner`
    pub fn can_delete<S: EntityStore>(store: &S, owner: CreditOwner) -> Result<DeleteCheck> {
        ensure_exists(store, owner)?;
        let count = store.credit_count(owner)?;
        Ok(if count == 0 {
            DeleteCheck {
                allowed: true,
                reason: None,
            }
        } else {
            DeleteCheck {
                allowed: false,
                reason: Some(denial_reason(owner, count)),
            }
        })
    }

    /// Re-check and delete atomically. Either the record is untouched (denied)
    /// or it is fully gone.
    pub fn delete_if_safe<S: EntityStore>(store: &mut S, owner: CreditOwner) -> Result<DeleteOutcome> {
        store.transaction(|tx| {
            ensure_exists(&*tx, owner)?;
            let count = tx.credit_count(owner)?;
            if count > 0 {
                warn!(entity = owner.entity(), id = %owner.id(), dependent_count = count, "delete_denied");
                return Ok(DeleteOutcome::denied(owner, count));
            }

            let removed = match owner {
                CreditOwner::Bank(id) => tx.remove_bank(id)?,
                CreditOwner::Client(id) => tx.remove_client(id)?,
            };
            if !removed {
                return Err(not_found(owner));
            }

            info!(entity = owner.entity(), id = %owner.id(), "record_deleted");
            Ok(DeleteOutcome::deleted(owner))
        })
    }
}

fn ensure_exists<S: EntityStore>(store: &S, owner: CreditOwner) -> Result<()> {
    let exists = match owner {
        CreditOwner::Bank(id) => store.bank(id)?.is_some(),
        CreditOwner::Client(id) => store.client(id)?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(not_found(owner))
    }
}

fn not_found(owner: CreditOwner) -> RegistryError {
    RegistryError::NotFound {
        entity: owner.entity(),
        id: owner.id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::entities::{Bank, BankDraft, Client, ClientDraft, Credit, CreditDraft};
    use crate::store::InMemoryStore;
    use crate::types::{BankType, CreditType};
    use chrono::{NaiveDate, Utc};

    fn seeded() -> (InMemoryStore, Bank, Client) {
        let mut store = InMemoryStore::new();
        let bank = Bank::from_draft(Uuid::new_v4(), BankDraft::new("Banco Oeste", BankType::Private), Utc::now());
        let birth = NaiveDate::from_ymd_opt(1979, 9, 9).unwrap();
        let client = Client::from_draft(Uuid::new_v4(), ClientDraft::new("Pablo Rey", birth, "pablo@test.com"), 45, Utc::now());
        store.insert_bank(bank.clone()).unwrap();
        store.insert_client(client.clone()).unwrap();
        (store, bank, client)
    }

    fn add_credit(store: &mut InMemoryStore, bank: &Bank, client: &Client) {
        let draft = CreditDraft {
            client_id: client.id,
            bank_id: bank.id,
            description: "Camioneta".to_string(),
            amount: Money::from_major(30_000),
            min_payment: Money::from_major(500),
            max_payment: Money::from_major(900),
            term_months: 36,
            credit_type: CreditType::Automotive,
            interest_rate: None,
        };
        let credit = Credit::from_draft(Uuid::new_v4(), draft, Rate::from_percentage(12), None, Utc::now());
        store.insert_credit(credit).unwrap();
    }

    #[test]
    fn test_client_without_credits_is_deleted() {
        let (mut store, _, client) = seeded();
        let owner = CreditOwner::Client(client.id);

        assert!(DeleteGuard::can_delete(&store, owner).unwrap().allowed);
        let outcome = DeleteGuard::delete_if_safe(&mut store, owner).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.deleted_id, Some(client.id));
        assert_eq!(outcome.details.dependent_count, 0);
        assert!(store.client(client.id).unwrap().is_none());
    }

    #[test]
    fn test_client_with_one_credit_is_kept() {
        let (mut store, bank, client) = seeded();
        add_credit(&mut store, &bank, &client);
        let owner = CreditOwner::Client(client.id);

        let check = DeleteGuard::can_delete(&store, owner).unwrap();
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("1 associated credit "));

        let outcome = DeleteGuard::delete_if_safe(&mut store, owner).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.details.dependent_count, 1);
        assert_eq!(outcome.deleted_id, None);
        assert!(store.client(client.id).unwrap().is_some());
    }

    #[test]
    fn test_bank_denial_reports_exact_count() {
        let (mut store, bank, client) = seeded();
        for _ in 0..3 {
            add_credit(&mut store, &bank, &client);
        }

        let outcome = DeleteGuard::delete_if_safe(&mut store, CreditOwner::Bank(bank.id)).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.details.dependent_count, 3);
        assert!(outcome.message.contains("3 associated credits"));
        assert_eq!(store.credit_count(CreditOwner::Bank(bank.id)).unwrap(), 3);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let (mut store, _, _) = seeded();
        let owner = CreditOwner::Bank(Uuid::new_v4());
        assert!(matches!(
            DeleteGuard::can_delete(&store, owner),
            Err(RegistryError::NotFound { entity: "bank", .. })
        ));
        assert!(matches!(
            DeleteGuard::delete_if_safe(&mut store, owner),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_outcome_json_shape() {
        let (mut store, _, client) = seeded();
        let outcome = DeleteGuard::delete_if_safe(&mut store, CreditOwner::Client(client.id)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&outcome.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["details"]["dependent_count"], 0);
        assert_eq!(json["deleted_id"], client.id.to_string());
    }
}
