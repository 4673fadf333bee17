//! Settings store trait definition.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};

/// A value held in a [`SettingsStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// An integer value.
    Int(i64),
    /// A string value.
    Str(String),
}

impl SettingValue {
    /// Name of the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "string",
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// A durable key-value store for small pieces of application state.
///
/// LocalSeal records which capability level produced the current protection
/// key here, and, for wrapped keys, the wrapped key blob.
///
/// # Invariants
///
/// - `put_all` applies every entry or none of them
/// - values written survive process restarts (for durable implementations)
///
/// # Implementors
///
/// - [`super::InMemorySettings`] - For testing
/// - [`super::FileSettings`] - JSON file on disk
pub trait SettingsStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>>;

    /// Writes all entries in one atomic update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be made durable.
    fn put_all(&self, entries: &[(&str, SettingValue)]) -> SettingsResult<()>;

    /// Removes the value stored under `key`. Returns true if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be made durable.
    fn remove(&self, key: &str) -> SettingsResult<bool>;

    /// Writes a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be made durable.
    fn put(&self, key: &str, value: SettingValue) -> SettingsResult<()> {
        self.put_all(&[(key, value)])
    }

    /// Reads an integer, returning `default` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TypeMismatch`] if a non-integer is stored.
    fn get_int(&self, key: &str, default: i64) -> SettingsResult<i64> {
        match self.get(key)? {
            None => Ok(default),
            Some(SettingValue::Int(value)) => Ok(value),
            Some(other) => Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }

    /// Reads a string, returning `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TypeMismatch`] if a non-string is stored.
    fn get_string(&self, key: &str) -> SettingsResult<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(SettingValue::Str(value)) => Ok(Some(value)),
            Some(other) => Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }
}
