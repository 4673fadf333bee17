//! In-memory settings store for testing.

use crate::error::SettingsResult;
use crate::settings::{SettingValue, SettingsStore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory settings store.
///
/// Suitable for unit tests and for simulating several process lifetimes
/// against the same state: share one instance between successive managers.
///
/// # Example
///
/// ```rust
/// use localseal_vault::{InMemorySettings, SettingsStore, SettingValue};
///
/// let settings = InMemorySettings::new();
/// settings.put("level", SettingValue::Int(23)).unwrap();
/// assert_eq!(settings.get_int("level", 0).unwrap(), 23);
/// assert_eq!(settings.get_int("missing", 19).unwrap(), 19);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl InMemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing values.
    ///
    /// Useful for testing upgrade scenarios.
    #[must_use]
    pub fn with_values(values: HashMap<String, SettingValue>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Returns a copy of all stored values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, SettingValue> {
        self.values.read().clone()
    }

    /// Removes every value.
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn put_all(&self, entries: &[(&str, SettingValue)]) -> SettingsResult<()> {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> SettingsResult<bool> {
        Ok(self.values.write().remove(key).is_some())
    }
}
