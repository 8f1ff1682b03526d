pub mod bank;
pub mod client;
pub mod credit;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::decimal::decimal_places;

pub use bank::validate_bank;
pub use client::{age_on, normalize_email, normalize_phone, validate_client, ClientEntry, ValidClient};
pub use credit::{validate_credit, ValidCredit};

/// field name -> messages, in field order
///
/// Every rule reports against the field at fault; range violations land on the
/// upper-bound field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// single-field error
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// fields with at least one error
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// trim; blank becomes `None`
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn check_required_text(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} must not be empty", label));
    }
}

pub(crate) fn check_max_length(errors: &mut ValidationErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            errors.add(field, format!("must be at most {} characters (got {})", max, len));
        }
    }
}

/// Strictly positive amount with at most `dp` decimal places and fewer than
/// `max_digits` total digits.
pub(crate) fn check_decimal(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Decimal>,
    max_digits: u32,
    dp: u32,
) {
    let Some(value) = value else {
        return;
    };
    if value <= Decimal::ZERO {
        errors.add(field, "must be greater than 0");
        return;
    }
    if decimal_places(value) > dp {
        errors.add(field, format!("must have at most {} decimal places", dp));
    }
    let limit = Decimal::from(10u64.pow(max_digits - dp));
    if value >= limit {
        errors.add(field, format!("must have at most {} digits", max_digits));
    }
}

pub(crate) fn check_positive_int(errors: &mut ValidationErrors, field: &str, value: Option<i32>) {
    if let Some(value) = value {
        if value <= 0 {
            errors.add(field, "must be greater than 0");
        }
    }
}

/// min <= max when both ends are present; reported on `max_field`
pub(crate) fn check_range<T: PartialOrd>(
    errors: &mut ValidationErrors,
    min: Option<T>,
    max: Option<T>,
    max_field: &str,
    message: &str,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.add(max_field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "enter a valid email address");
        errors.add("email", "this email is already registered to another client");
        errors.add("full_name", "full name must not be empty");

        assert_eq!(errors.messages("email").len(), 2);
        assert!(errors.contains("full_name"));
        assert!(errors.messages("phone").is_empty());
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "full_name"]);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["full_name"][0], "full name must not be empty");
    }

    #[test]
    fn test_display_lists_every_message() {
        let errors = ValidationErrors::single("max_payment", "must be at least min_payment");
        assert_eq!(errors.to_string(), "max_payment: must be at least min_payment");
    }

    #[rstest]
    #[case(Some(dec!(10)), Some(dec!(8)), true)]
    #[case(Some(dec!(8)), Some(dec!(10)), false)]
    #[case(Some(dec!(8)), Some(dec!(8)), false)]
    #[case(None, Some(dec!(8)), false)]
    #[case(Some(dec!(10)), None, false)]
    fn test_range_reports_upper_bound(
        #[case] min: Option<Decimal>,
        #[case] max: Option<Decimal>,
        #[case] rejected: bool,
    ) {
        let mut errors = ValidationErrors::new();
        check_range(&mut errors, min, max, "interest_rate_max", "bad range");
        assert_eq!(errors.contains("interest_rate_max"), rejected);
        assert!(!errors.contains("interest_rate_min"));
    }

    #[rstest]
    #[case(dec!(0), "must be greater than 0")]
    #[case(dec!(-5), "must be greater than 0")]
    #[case(dec!(1.005), "must have at most 2 decimal places")]
    #[case(dec!(1000.00), "must have at most 5 digits")]
    fn test_decimal_rules(#[case] value: Decimal, #[case] message: &str) {
        let mut errors = ValidationErrors::new();
        check_decimal(&mut errors, "interest_rate", Some(value), 5, 2);
        assert_eq!(errors.messages("interest_rate").to_vec(), vec![message.to_string()]);
    }

    #[test]
    fn test_decimal_accepts_limits() {
        let mut errors = ValidationErrors::new();
        check_decimal(&mut errors, "interest_rate", Some(dec!(999.99)), 5, 2);
        check_decimal(&mut errors, "interest_rate", Some(dec!(0.01)), 5, 2);
        check_decimal(&mut errors, "interest_rate", None, 5, 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  BN01 ".to_string())), Some("BN01".to_string()));
        assert_eq!(clean_optional(Some("   ".to_string())), None);
        assert_eq!(clean_optional(None), None);
    }
}
