//! Durable state: per-user preferences kept in a JSON file.

pub mod json_file;
pub mod prefs;

pub use prefs::{PersistenceError, PreferenceStore, UserPreference};
