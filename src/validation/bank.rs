use super::{
    check_decimal, check_max_length, check_positive_int, check_range, check_required_text,
    clean_optional, ValidationErrors,
};
use crate::decimal::{Money, Rate};
use crate::entities::BankDraft;
use crate::errors::{RegistryError, Result};
use crate::store::EntityStore;
use crate::types::BankId;

const NAME_MAX: usize = 200;
const CODE_MAX: usize = 50;
const ADDRESS_MAX: usize = 500;
const EMAIL_MAX: usize = 255;
const PHONE_MAX: usize = 50;
const WEBSITE_MAX: usize = 500;
const RATE_DIGITS: u32 = 5;
const AMOUNT_DIGITS: u32 = 12;

/// Validate a full bank draft; returns the cleaned draft ready to persist.
pub fn validate_bank<S: EntityStore>(draft: BankDraft, store: &S, exclude: Option<BankId>) -> Result<BankDraft> {
    let draft = BankDraft {
        name: draft.name.trim().to_string(),
        code: clean_optional(draft.code),
        address: clean_optional(draft.address),
        email: clean_optional(draft.email).map(|e| e.to_lowercase()),
        phone: clean_optional(draft.phone),
        website: clean_optional(draft.website),
        ..draft
    };

    let mut errors = check_fields(&draft);

    if !errors.contains("name") && store.bank_name_taken(&draft.name, exclude)? {
        errors.add("name", "a bank with this name already exists");
    }
    if let Some(code) = &draft.code {
        if !errors.contains("code") && store.bank_code_taken(code, exclude)? {
            errors.add("code", "a bank with this code already exists");
        }
    }
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    check_ranges(&draft)
        .into_result(draft)
        .map_err(RegistryError::Validation)
}

/// single-field rules, no store access
fn check_fields(draft: &BankDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    check_required_text(&mut errors, "name", &draft.name, "bank name");
    check_max_length(&mut errors, "name", Some(&draft.name), NAME_MAX);
    check_max_length(&mut errors, "code", draft.code.as_deref(), CODE_MAX);
    check_max_length(&mut errors, "address", draft.address.as_deref(), ADDRESS_MAX);
    check_max_length(&mut errors, "phone", draft.phone.as_deref(), PHONE_MAX);

    if let Some(email) = &draft.email {
        if !email.contains('@') {
            errors.add("email", "enter a valid email address");
        }
        check_max_length(&mut errors, "email", Some(email), EMAIL_MAX);
    }
    if let Some(website) = &draft.website {
        if !(website.starts_with("http://") || website.starts_with("https://")) {
            errors.add("website", "enter a valid URL starting with http:// or https://");
        }
        check_max_length(&mut errors, "website", Some(website), WEBSITE_MAX);
    }

    let rate = |r: Option<Rate>| r.map(|r| r.as_percent());
    check_decimal(&mut errors, "interest_rate_min", rate(draft.interest_rate_min), RATE_DIGITS, 2);
    check_decimal(&mut errors, "interest_rate_max", rate(draft.interest_rate_max), RATE_DIGITS, 2);

    check_positive_int(&mut errors, "term_min_months", draft.term_min_months);
    check_positive_int(&mut errors, "term_max_months", draft.term_max_months);

    let amount = |m: Option<Money>| m.map(|m| m.as_decimal());
    check_decimal(&mut errors, "amount_min", amount(draft.amount_min), AMOUNT_DIGITS, 2);
    check_decimal(&mut errors, "amount_max", amount(draft.amount_max), AMOUNT_DIGITS, 2);

    errors
}

/// paired min/max rules over the merged draft
fn check_ranges(draft: &BankDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_range(
        &mut errors,
        draft.interest_rate_min,
        draft.interest_rate_max,
        "interest_rate_max",
        "maximum interest rate must be greater than or equal to the minimum interest rate",
    );
    check_range(
        &mut errors,
        draft.term_min_months,
        draft.term_max_months,
        "term_max_months",
        "maximum term must be greater than or equal to the minimum term",
    );
    check_range(
        &mut errors,
        draft.amount_min,
        draft.amount_max,
        "amount_max",
        "maximum amount must be greater than or equal to the minimum amount",
    );
    errors
}
