//! Per-user language preference store.
//!
//! The whole table lives in memory and is mirrored to a JSON file of the form
//! `{"<user_id>": {"user_id": <id>, "language": "<tag>"}}`, loaded once at
//! startup and rewritten in full on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{self, DEFAULT_LANG_CODE};
use crate::storage::json_file::{read_json_file, write_json_file};

/// Preference store failure. Logged, never shown to users.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: u64,
    pub language: String,
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    users: DashMap<u64, UserPreference>,
    /// Serializes snapshot + write so the file always reflects a consistent table.
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Loads the store from `path`.
    ///
    /// A missing file starts an empty store and creates the file. An unreadable
    /// or corrupt file is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = DashMap::new();
        let mut create = false;

        match read_json_file::<BTreeMap<String, UserPreference>>(&path) {
            Ok(Some(records)) => {
                for (key, record) in records {
                    match key.parse::<u64>() {
                        Ok(id) => {
                            users.insert(id, record);
                        }
                        Err(_) => log::warn!("Skipping preference record with bad key {:?}", key),
                    }
                }
                log::info!("Loaded {} user preferences from {}", users.len(), path.display());
            }
            Ok(None) => create = true,
            Err(e) => log::error!("Ignoring preference file {}: {}", path.display(), e),
        }

        let store = Self {
            path,
            users,
            write_lock: Mutex::new(()),
        };
        if create {
            if let Err(e) = store.flush() {
                log::error!("Failed to create preference file {}: {}", store.path.display(), e);
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Language tag for `user_id`, or the default when none is recorded.
    pub fn language(&self, user_id: u64) -> String {
        self.users
            .get(&user_id)
            .map(|record| record.language.clone())
            .unwrap_or_else(|| DEFAULT_LANG_CODE.to_string())
    }

    /// Records the language and rewrites the file before returning.
    ///
    /// Unsupported tags are stored as the default language. Write failures are
    /// logged; the in-memory value is kept either way.
    pub fn set_language(&self, user_id: u64, tag: &str) {
        let language = i18n::is_language_supported(tag).unwrap_or(DEFAULT_LANG_CODE).to_string();
        self.users.insert(user_id, UserPreference { user_id, language });

        if let Err(e) = self.flush() {
            log::error!("Failed to persist preference of user {}: {}", user_id, e);
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Writes the full table to disk.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let snapshot: BTreeMap<String, UserPreference> = self
            .users
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().clone()))
            .collect();
        write_json_file(&self.path, &snapshot)
    }
}
