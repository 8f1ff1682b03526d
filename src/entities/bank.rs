use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serialization::{double_option, merge_nullable, merge_required};
use crate::decimal::{Money, Rate};
use crate::types::{BankId, BankStatus, BankType};

/// stored bank record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    pub code: Option<String>,
    pub bank_type: BankType,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub interest_rate_min: Option<Rate>,
    pub interest_rate_max: Option<Rate>,
    pub term_min_months: Option<i32>,
    pub term_max_months: Option<i32>,
    pub amount_min: Option<Money>,
    pub amount_max: Option<Money>,
    pub status: BankStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// full bank input for create or full update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDraft {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub bank_type: BankType,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub interest_rate_min: Option<Rate>,
    #[serde(default)]
    pub interest_rate_max: Option<Rate>,
    #[serde(default)]
    pub term_min_months: Option<i32>,
    #[serde(default)]
    pub term_max_months: Option<i32>,
    #[serde(default)]
    pub amount_min: Option<Money>,
    #[serde(default)]
    pub amount_max: Option<Money>,
    #[serde(default)]
    pub status: BankStatus,
}

impl BankDraft {
    /// minimal draft with every optional attribute empty
    pub fn new(name: impl Into<String>, bank_type: BankType) -> Self {
        Self {
            name: name.into(),
            code: None,
            bank_type,
            address: None,
            email: None,
            phone: None,
            website: None,
            interest_rate_min: None,
            interest_rate_max: None,
            term_min_months: None,
            term_max_months: None,
            amount_min: None,
            amount_max: None,
            status: BankStatus::Active,
        }
    }

    pub fn interest_range(mut self, min: Rate, max: Rate) -> Self {
        self.interest_rate_min = Some(min);
        self.interest_rate_max = Some(max);
        self
    }

    pub fn term_range(mut self, min: i32, max: i32) -> Self {
        self.term_min_months = Some(min);
        self.term_max_months = Some(max);
        self
    }

    pub fn amount_range(mut self, min: Money, max: Money) -> Self {
        self.amount_min = Some(min);
        self.amount_max = Some(max);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// partial bank update; `Some(None)` clears a nullable attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub code: Option<Option<String>>,
    #[serde(default)]
    pub bank_type: Option<BankType>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub interest_rate_min: Option<Option<Rate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub interest_rate_max: Option<Option<Rate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub term_min_months: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub term_max_months: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub amount_min: Option<Option<Money>>,
    #[serde(default, deserialize_with = "double_option")]
    pub amount_max: Option<Option<Money>>,
    #[serde(default)]
    pub status: Option<BankStatus>,
}

impl BankPatch {
    /// supplied values win, everything else keeps its stored value
    pub fn merge_onto(&self, current: &Bank) -> BankDraft {
        BankDraft {
            name: merge_required(&self.name, &current.name),
            code: merge_nullable(&self.code, &current.code),
            bank_type: merge_required(&self.bank_type, &current.bank_type),
            address: merge_nullable(&self.address, &current.address),
            email: merge_nullable(&self.email, &current.email),
            phone: merge_nullable(&self.phone, &current.phone),
            website: merge_nullable(&self.website, &current.website),
            interest_rate_min: merge_nullable(&self.interest_rate_min, &current.interest_rate_min),
            interest_rate_max: merge_nullable(&self.interest_rate_max, &current.interest_rate_max),
            term_min_months: merge_nullable(&self.term_min_months, &current.term_min_months),
            term_max_months: merge_nullable(&self.term_max_months, &current.term_max_months),
            amount_min: merge_nullable(&self.amount_min, &current.amount_min),
            amount_max: merge_nullable(&self.amount_max, &current.amount_max),
            status: merge_required(&self.status, &current.status),
        }
    }
}

impl Bank {
    /// build a record from a validated draft
    pub fn from_draft(id: BankId, draft: BankDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            code: draft.code,
            bank_type: draft.bank_type,
            address: draft.address,
            email: draft.email,
            phone: draft.phone,
            website: draft.website,
            interest_rate_min: draft.interest_rate_min,
            interest_rate_max: draft.interest_rate_max,
            term_min_months: draft.term_min_months,
            term_max_months: draft.term_max_months,
            amount_min: draft.amount_min,
            amount_max: draft.amount_max,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// apply a validated full draft, keeping identity and creation time
    pub fn apply(&mut self, draft: BankDraft, now: DateTime<Utc>) {
        let id = self.id;
        let created_at = self.created_at;
        *self = Bank::from_draft(id, draft, now);
        self.created_at = created_at;
    }

    /// current values as a draft
    pub fn to_draft(&self) -> BankDraft {
        BankPatch::default().merge_onto(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn stored_bank() -> Bank {
        let draft = BankDraft::new("Banco Norte", BankType::Private)
            .code("BN01")
            .interest_range(Rate::from_percentage(5), Rate::from_percentage(20));
        Bank::from_draft(Uuid::new_v4(), draft, Utc::now())
    }

    #[test]
    fn test_patch_keeps_unsupplied_fields() {
        let bank = stored_bank();
        let patch = BankPatch {
            interest_rate_min: Some(Some(Rate::from_percent(dec!(7.5)))),
            ..Default::default()
        };

        let merged = patch.merge_onto(&bank);
        assert_eq!(merged.interest_rate_min, Some(Rate::from_percent(dec!(7.5))));
        assert_eq!(merged.interest_rate_max, Some(Rate::from_percentage(20)));
        assert_eq!(merged.code.as_deref(), Some("BN01"));
        assert_eq!(merged.name, "Banco Norte");
    }

    #[test]
    fn test_patch_can_clear_nullable_field() {
        let bank = stored_bank();
        let patch: BankPatch = serde_json::from_str(r#"{"code": null}"#).unwrap();
        assert_eq!(patch.merge_onto(&bank).code, None);
    }

    #[test]
    fn test_apply_preserves_identity() {
        let mut bank = stored_bank();
        let id = bank.id;
        let created_at = bank.created_at;
        let mut draft = bank.to_draft();
        draft.status = BankStatus::Inactive;

        bank.apply(draft, created_at + chrono::Duration::days(1));
        assert_eq!(bank.id, id);
        assert_eq!(bank.created_at, created_at);
        assert_eq!(bank.status, BankStatus::Inactive);
        assert!(bank.updated_at > created_at);
    }
}
