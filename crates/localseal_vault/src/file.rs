//! File-based settings store for persistent state.

use crate::error::SettingsResult;
use crate::settings::{SettingValue, SettingsStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A settings store backed by a JSON file.
///
/// Values are cached in memory and written through on every update.
///
/// # Durability
///
/// Each update writes the whole document to a sibling temporary file,
/// calls `File::sync_all()`, then renames it over the original, so a crash
/// leaves either the old or the new document on disk.
///
/// # Example
///
/// ```no_run
/// use localseal_vault::{FileSettings, SettingsStore, SettingValue};
/// use std::path::Path;
///
/// let settings = FileSettings::open(Path::new("settings.json")).unwrap();
/// settings.put("level", SettingValue::Int(23)).unwrap();
/// ```
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl FileSettings {
    /// Opens the store at `path`, creating an empty one if the file does
    /// not exist yet. The file itself is only created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> SettingsResult<Self> {
        let values = if path.exists() {
            let raw = fs::read(path)?;
            if raw.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, values: &BTreeMap<String, SettingValue>) -> SettingsResult<()> {
        let raw = serde_json::to_vec_pretty(values)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&raw)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn put_all(&self, entries: &[(&str, SettingValue)]) -> SettingsResult<()> {
        let mut values = self.values.write();
        let mut updated = values.clone();
        for (key, value) in entries {
            updated.insert((*key).to_string(), value.clone());
        }

        self.write_document(&updated)?;
        *values = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> SettingsResult<bool> {
        let mut values = self.values.write();
        if !values.contains_key(key) {
            return Ok(false);
        }

        let mut updated = values.clone();
        updated.remove(key);
        self.write_document(&updated)?;
        *values = updated;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use tempfile::tempdir;

    #[test]
    fn file_open_missing_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = FileSettings::open(&path).unwrap();
        assert_eq!(settings.get("level").unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = FileSettings::open(&path).unwrap();
        settings.put("level", SettingValue::Int(21)).unwrap();
        assert_eq!(settings.get_int("level", 0).unwrap(), 21);
        assert!(path.exists());
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let settings = FileSettings::open(&path).unwrap();
            settings
                .put_all(&[
                    ("blob", SettingValue::from("d3JhcHBlZA==")),
                    ("level", SettingValue::Int(19)),
                ])
                .unwrap();
        }

        {
            let settings = FileSettings::open(&path).unwrap();
            assert_eq!(
                settings.get_string("blob").unwrap().as_deref(),
                Some("d3JhcHBlZA==")
            );
            assert_eq!(settings.get_int("level", 0).unwrap(), 19);
        }
    }

    #[test]
    fn file_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = FileSettings::open(&path).unwrap();
        settings.put("level", SettingValue::Int(23)).unwrap();
        assert!(settings.remove("level").unwrap());
        assert!(!settings.remove("level").unwrap());

        let reopened = FileSettings::open(&path).unwrap();
        assert_eq!(reopened.get("level").unwrap(), None);
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("settings.json");

        let settings = FileSettings::open(&path).unwrap();
        settings.put("level", SettingValue::Int(1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_corrupted_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();

        let result = FileSettings::open(&path);
        assert!(matches!(result, Err(SettingsError::Corrupted(_))));
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = FileSettings::open(&path).unwrap();
        assert_eq!(settings.path(), path);
    }
}
