use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::serialization::{double_option, merge_nullable, merge_required};
use crate::types::{BankId, ClientId, PersonType};

/// stored client record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub birth_date: NaiveDate,
    /// derived from `birth_date` on every write
    pub age: i32,
    pub nationality: Option<String>,
    pub address: Option<String>,
    /// stored lowercased
    pub email: String,
    pub phone: Option<String>,
    pub person_type: PersonType,
    pub bank_id: Option<BankId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full client input. There is no `age` field: an `age` key in a payload
/// is ignored and the value is always recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDraft {
    pub full_name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub person_type: PersonType,
    #[serde(default)]
    pub bank_id: Option<BankId>,
}

impl ClientDraft {
    pub fn new(full_name: impl Into<String>, birth_date: NaiveDate, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            birth_date,
            nationality: None,
            address: None,
            email: email.into(),
            phone: None,
            person_type: PersonType::Natural,
            bank_id: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn bank(mut self, bank_id: BankId) -> Self {
        self.bank_id = Some(bank_id);
        self
    }
}

/// partial client update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub nationality: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub person_type: Option<PersonType>,
    #[serde(default, deserialize_with = "double_option")]
    pub bank_id: Option<Option<BankId>>,
}

impl ClientPatch {
    pub fn merge_onto(&self, current: &Client) -> ClientDraft {
        ClientDraft {
            full_name: merge_required(&self.full_name, &current.full_name),
            birth_date: merge_required(&self.birth_date, &current.birth_date),
            nationality: merge_nullable(&self.nationality, &current.nationality),
            address: merge_nullable(&self.address, &current.address),
            email: merge_required(&self.email, &current.email),
            phone: merge_nullable(&self.phone, &current.phone),
            person_type: merge_required(&self.person_type, &current.person_type),
            bank_id: merge_nullable(&self.bank_id, &current.bank_id),
        }
    }
}

impl Client {
    /// build a record from a validated draft and its computed age
    pub fn from_draft(id: ClientId, draft: ClientDraft, age: i32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: draft.full_name,
            birth_date: draft.birth_date,
            age,
            nationality: draft.nationality,
            address: draft.address,
            email: draft.email,
            phone: draft.phone,
            person_type: draft.person_type,
            bank_id: draft.bank_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, draft: ClientDraft, age: i32, now: DateTime<Utc>) {
        let id = self.id;
        let created_at = self.created_at;
        *self = Client::from_draft(id, draft, age, now);
        self.created_at = created_at;
    }

    pub fn to_draft(&self) -> ClientDraft {
        ClientPatch::default().merge_onto(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_in_payload_is_ignored() {
        let draft: ClientDraft = serde_json::from_str(
            r#"{"full_name": "Ana Ruiz", "birth_date": "1990-05-01", "email": "ana@test.com", "age": 7}"#,
        )
        .unwrap();
        assert_eq!(draft.person_type, PersonType::Natural);
        assert_eq!(draft.phone, None);
    }

    #[test]
    fn test_patch_merges_birth_date_only() {
        let birth = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
        let client = Client::from_draft(
            uuid::Uuid::new_v4(),
            ClientDraft::new("Ana Ruiz", birth, "ana@test.com").phone("555-0101"),
            34,
            Utc::now(),
        );
        let patch = ClientPatch {
            birth_date: NaiveDate::from_ymd_opt(1985, 1, 1),
            ..Default::default()
        };

        let merged = patch.merge_onto(&client);
        assert_eq!(merged.birth_date, NaiveDate::from_ymd_opt(1985, 1, 1).unwrap());
        assert_eq!(merged.phone.as_deref(), Some("555-0101"));
        assert_eq!(merged.email, "ana@test.com");
    }
}
