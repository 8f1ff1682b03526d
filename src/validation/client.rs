use chrono::{Datelike, Months, NaiveDate};

use super::{check_max_length, check_required_text, clean_optional, ValidationErrors};
use crate::config::{PhoneNormalization, ValidationConfig};
use crate::entities::ClientDraft;
use crate::errors::{RegistryError, Result};
use crate::store::EntityStore;
use crate::types::ClientId;

const FULL_NAME_MAX: usize = 200;
const NATIONALITY_MAX: usize = 100;
const ADDRESS_MAX: usize = 500;
const EMAIL_MAX: usize = 255;
const PHONE_MAX: usize = 20;

/// which write path a client arrives through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEntry {
    /// public create/update: adult-only, registration phone policy
    Registration,
    /// bulk import: storage age bounds only, import phone policy
    Import,
    /// update keeping the stored birth date: storage age bounds only, registration phone policy
    Update,
}

impl ClientEntry {
    fn phone_policy(&self, config: &ValidationConfig) -> PhoneNormalization {
        match self {
            ClientEntry::Registration | ClientEntry::Update => config.registration_phones,
            ClientEntry::Import => config.import_phones,
        }
    }

    fn min_age(&self, config: &ValidationConfig) -> i32 {
        match self {
            ClientEntry::Registration => config.min_registration_age,
            ClientEntry::Import | ClientEntry::Update => config.min_age,
        }
    }
}

/// validated client input plus its computed age
#[derive(Debug, Clone, PartialEq)]
pub struct ValidClient {
    pub draft: ClientDraft,
    pub age: i32,
}

/// Whole years from `birth_date` to `today`.
///
/// A 29 February birthday counts as reached on 28 February in non-leap years.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth_date.year();
    if years <= 0 {
        return years.min(0);
    }
    let anniversary = birth_date.checked_add_months(Months::new(12 * years as u32));
    if anniversary.map_or(true, |d| d > today) {
        years -= 1;
    }
    years
}

/// trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// drop separator characters so differently formatted numbers compare equal
pub fn normalize_phone(phone: &str, policy: PhoneNormalization) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .filter(|c| policy == PhoneNormalization::KeepPlus || *c != '+')
        .collect()
}

/// Validate a full client draft against `today` and the stored clients.
///
/// `exclude` is the client being updated, left out of uniqueness checks.
pub fn validate_client<S: EntityStore>(
    draft: ClientDraft,
    store: &S,
    exclude: Option<ClientId>,
    today: NaiveDate,
    config: &ValidationConfig,
    entry: ClientEntry,
) -> Result<ValidClient> {
    let draft = ClientDraft {
        full_name: draft.full_name.trim().to_string(),
        email: normalize_email(&draft.email),
        nationality: clean_optional(draft.nationality),
        address: clean_optional(draft.address),
        phone: clean_optional(draft.phone),
        ..draft
    };

    let mut errors = ValidationErrors::new();

    check_required_text(&mut errors, "full_name", &draft.full_name, "full name");
    check_max_length(&mut errors, "full_name", Some(&draft.full_name), FULL_NAME_MAX);
    check_max_length(&mut errors, "nationality", draft.nationality.as_deref(), NATIONALITY_MAX);
    check_max_length(&mut errors, "address", draft.address.as_deref(), ADDRESS_MAX);

    let age = age_on(draft.birth_date, today);
    check_birth_date(&mut errors, draft.birth_date, today, age, entry.min_age(config), config.max_age);

    if draft.email.is_empty() || !draft.email.contains('@') {
        errors.add("email", "enter a valid email address");
    } else if draft.email.chars().count() > EMAIL_MAX {
        check_max_length(&mut errors, "email", Some(&draft.email), EMAIL_MAX);
    } else if store.client_email_taken(&draft.email, exclude)? {
        errors.add("email", "this email is already registered to another client");
    }

    if let Some(phone) = &draft.phone {
        check_max_length(&mut errors, "phone", Some(phone), PHONE_MAX);
        let policy = entry.phone_policy(config);
        let normalized = normalize_phone(phone, policy);
        let taken = store
            .client_phones(exclude)?
            .iter()
            .any(|existing| normalize_phone(existing, policy) == normalized);
        if taken {
            errors.add("phone", "this phone is already registered to another client");
        }
    }

    if let Some(bank_id) = draft.bank_id {
        if store.bank(bank_id)?.is_none() {
            errors.add("bank_id", format!("bank {} does not exist", bank_id));
        }
    }

    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    // record invariant, independent of the entry point
    check_age_bounds(age, config).map_err(RegistryError::Validation)?;

    Ok(ValidClient { draft, age })
}

fn check_birth_date(
    errors: &mut ValidationErrors,
    birth_date: NaiveDate,
    today: NaiveDate,
    age: i32,
    min_age: i32,
    max_age: i32,
) {
    if birth_date > today {
        errors.add("birth_date", "birth date cannot be in the future");
        return;
    }
    if age < min_age {
        errors.add(
            "birth_date",
            format!(
                "client must be at least {} years old; birth date gives an age of {}",
                min_age, age
            ),
        );
    } else if age > max_age {
        errors.add(
            "birth_date",
            format!(
                "birth date gives an invalid age ({}); age must be between {} and {}",
                age, min_age, max_age
            ),
        );
    }
}

/// stored clients must always have an age within `[min_age, max_age]`
pub fn check_age_bounds(age: i32, config: &ValidationConfig) -> std::result::Result<(), ValidationErrors> {
    if age < config.min_age || age > config.max_age {
        return Err(ValidationErrors::single(
            "birth_date",
            format!(
                "birth date gives an invalid age ({}); age must be between {} and {}",
                age, config.min_age, config.max_age
            ),
        ));
    }
    Ok(())
}
