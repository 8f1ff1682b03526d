use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serialization::{double_option, merge_nullable, merge_required};
use crate::decimal::{Money, Rate};
use crate::payments::CreditTerms;
use crate::types::{BankId, ClientId, CreditId, CreditType};

/// stored credit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    pub client_id: ClientId,
    pub bank_id: BankId,
    pub description: String,
    pub amount: Money,
    /// monthly payment floor
    pub min_payment: Money,
    /// monthly payment ceiling
    pub max_payment: Money,
    pub term_months: i32,
    /// set once at creation
    pub registered_at: DateTime<Utc>,
    pub credit_type: CreditType,
    pub interest_rate: Rate,
    pub monthly_installment: Option<Money>,
    pub total_payable: Option<Money>,
    pub updated_at: DateTime<Utc>,
}

/// Full credit input. Derived amounts are not part of it; `interest_rate`
/// falls back to the configured default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditDraft {
    pub client_id: ClientId,
    pub bank_id: BankId,
    pub description: String,
    pub amount: Money,
    pub min_payment: Money,
    pub max_payment: Money,
    pub term_months: i32,
    pub credit_type: CreditType,
    #[serde(default)]
    pub interest_rate: Option<Rate>,
}

/// partial credit update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditPatch {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub bank_id: Option<BankId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub min_payment: Option<Money>,
    #[serde(default)]
    pub max_payment: Option<Money>,
    #[serde(default)]
    pub term_months: Option<i32>,
    #[serde(default)]
    pub credit_type: Option<CreditType>,
    #[serde(default, deserialize_with = "double_option")]
    pub interest_rate: Option<Option<Rate>>,
}

impl CreditPatch {
    pub fn merge_onto(&self, current: &Credit) -> CreditDraft {
        CreditDraft {
            client_id: merge_required(&self.client_id, &current.client_id),
            bank_id: merge_required(&self.bank_id, &current.bank_id),
            description: merge_required(&self.description, &current.description),
            amount: merge_required(&self.amount, &current.amount),
            min_payment: merge_required(&self.min_payment, &current.min_payment),
            max_payment: merge_required(&self.max_payment, &current.max_payment),
            term_months: merge_required(&self.term_months, &current.term_months),
            credit_type: merge_required(&self.credit_type, &current.credit_type),
            interest_rate: merge_nullable(&self.interest_rate, &Some(current.interest_rate)),
        }
    }
}

impl Credit {
    /// Build a record from a validated draft whose rate has been resolved.
    /// Derived fields come only from `terms`.
    pub fn from_draft(
        id: CreditId,
        draft: CreditDraft,
        interest_rate: Rate,
        terms: Option<CreditTerms>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client_id: draft.client_id,
            bank_id: draft.bank_id,
            description: draft.description,
            amount: draft.amount,
            min_payment: draft.min_payment,
            max_payment: draft.max_payment,
            term_months: draft.term_months,
            registered_at: now,
            credit_type: draft.credit_type,
            interest_rate,
            monthly_installment: terms.map(|t| t.monthly_installment),
            total_payable: terms.map(|t| t.total_payable),
            updated_at: now,
        }
    }

    /// apply a validated draft; `registered_at` never changes
    pub fn apply(
        &mut self,
        draft: CreditDraft,
        interest_rate: Rate,
        terms: Option<CreditTerms>,
        now: DateTime<Utc>,
    ) {
        let id = self.id;
        let registered_at = self.registered_at;
        *self = Credit::from_draft(id, draft, interest_rate, terms, now);
        self.registered_at = registered_at;
    }

    pub fn to_draft(&self) -> CreditDraft {
        CreditPatch::default().merge_onto(self)
    }
}
