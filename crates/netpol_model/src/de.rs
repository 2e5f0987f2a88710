//! Deserialization helpers for API objects.

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` like a missing field.
///
/// Client libraries that dump objects as dictionaries emit `null` for every
/// unset optional, where the API server would have omitted the key.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a protocol field, falling back to `TCP` when it is missing or `null`.
pub fn protocol_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| crate::DEFAULT_PROTOCOL.to_string()))
}
