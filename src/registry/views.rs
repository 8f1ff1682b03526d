// serializable read models returned by the registry
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::entities::{Client, Credit};
use crate::types::{BankId, CreditType};

/// a client together with every credit it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWithCredits {
    pub client: Client,
    pub credits: Vec<Credit>,
}

impl ClientWithCredits {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// aggregate figures over all credits, or those of one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<BankId>,
    pub total_credits: u64,
    pub total_min_payment: Money,
    pub total_max_payment: Money,
    /// every credit type is present, zero when unused
    pub by_type: BTreeMap<CreditType, u64>,
}

impl CreditStatistics {
    pub fn from_credits<'a>(bank_id: Option<BankId>, credits: impl IntoIterator<Item = &'a Credit>) -> Self {
        let mut by_type: BTreeMap<CreditType, u64> = CreditType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut total_credits = 0;
        let mut total_min_payment = Money::ZERO;
        let mut total_max_payment = Money::ZERO;

        for credit in credits {
            total_credits += 1;
            total_min_payment += credit.min_payment;
            total_max_payment += credit.max_payment;
            *by_type.entry(credit.credit_type).or_insert(0) += 1;
        }

        Self {
            bank_id,
            total_credits,
            total_min_payment,
            total_max_payment,
            by_type,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
