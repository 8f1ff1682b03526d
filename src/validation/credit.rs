use super::{check_decimal, check_max_length, check_positive_int, check_range, check_required_text, ValidationErrors};
use crate::decimal::Rate;
use crate::entities::CreditDraft;
use crate::errors::{RegistryError, Result};
use crate::store::EntityStore;

const DESCRIPTION_MAX: usize = 500;
const MONEY_DIGITS: u32 = 10;
const RATE_DIGITS: u32 = 5;

/// validated credit input with its resolved annual rate
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCredit {
    pub draft: CreditDraft,
    pub interest_rate: Rate,
}

/// Validate a full (or merged) credit draft. An absent rate resolves to
/// `default_rate` before it is checked.
pub fn validate_credit<S: EntityStore>(draft: CreditDraft, store: &S, default_rate: Rate) -> Result<ValidCredit> {
    let draft = CreditDraft {
        description: draft.description.trim().to_string(),
        ..draft
    };
    let interest_rate = draft.interest_rate.unwrap_or(default_rate);

    let mut errors = ValidationErrors::new();

    check_required_text(&mut errors, "description", &draft.description, "description");
    check_max_length(&mut errors, "description", Some(&draft.description), DESCRIPTION_MAX);

    check_decimal(&mut errors, "amount", Some(draft.amount.as_decimal()), MONEY_DIGITS, 2);
    check_decimal(&mut errors, "min_payment", Some(draft.min_payment.as_decimal()), MONEY_DIGITS, 2);
    check_decimal(&mut errors, "max_payment", Some(draft.max_payment.as_decimal()), MONEY_DIGITS, 2);
    check_positive_int(&mut errors, "term_months", Some(draft.term_months));
    check_decimal(&mut errors, "interest_rate", Some(interest_rate.as_percent()), RATE_DIGITS, 2);

    if store.client(draft.client_id)?.is_none() {
        errors.add("client_id", format!("client {} does not exist", draft.client_id));
    }
    if store.bank(draft.bank_id)?.is_none() {
        errors.add("bank_id", format!("bank {} does not exist", draft.bank_id));
    }

    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    let mut errors = ValidationErrors::new();
    check_range(
        &mut errors,
        Some(draft.min_payment),
        Some(draft.max_payment),
        "max_payment",
        "maximum payment must be greater than or equal to the minimum payment",
    );

    let draft = CreditDraft {
        interest_rate: Some(interest_rate),
        ..draft
    };
    errors
        .into_result(ValidCredit { draft, interest_rate })
        .map_err(RegistryError::Validation)
}
