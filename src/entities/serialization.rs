/// serde helpers for partial-update payloads
use serde::{Deserialize, Deserializer};

/// Distinguish an absent key from an explicit `null`.
///
/// Used with `#[serde(default, deserialize_with = "double_option")]`:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// resolve a nullable patch field against the stored value
pub fn merge_nullable<T: Clone>(patch: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match patch {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

/// resolve a required patch field against the stored value
pub fn merge_required<T: Clone>(patch: &Option<T>, current: &T) -> T {
    patch.as_ref().unwrap_or(current).clone()
}
