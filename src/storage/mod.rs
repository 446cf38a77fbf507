//! Local key-value persistence.
//!
//! Every component reads and writes through one injected [`KeyValueStore`]
//! using the key names in [`keys`].

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Canonical key schema.
pub mod keys {
    /// Serialized list of every registered `UserRecord`.
    pub const USERS: &str = "cbikeai_users";
    /// Serialized active `Session`.
    pub const SESSION: &str = "cbikeai_session";
    /// Email kept for login prefill when remember-me was requested.
    pub const SAVED_EMAIL: &str = "savedEmail";
    /// `"true"` while a remembered email is stored.
    pub const REMEMBER_ME: &str = "rememberMe";
    /// Device preferences (`bikeType`, `experienceLevel`, ...), kept across logout.
    pub const PREFERENCES: &str = "cbikeai_preferences";
}

/// A string-to-string store local to the device.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists every stored key.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Reads and deserializes the JSON value stored under `key`.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(sonic_rs::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = sonic_rs::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_helpers_round_trip_through_store() {
        let store = MemoryStore::new();
        let mut prefs = BTreeMap::new();
        prefs.insert("bikeType".to_string(), "Urbana".to_string());

        set_json(&store, keys::PREFERENCES, &prefs).unwrap();
        let loaded: Option<BTreeMap<String, String>> = get_json(&store, keys::PREFERENCES).unwrap();

        assert_eq!(loaded, Some(prefs));
    }

    #[test]
    fn get_json_on_missing_key_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<Vec<String>> = get_json(&store, keys::USERS).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn get_json_on_corrupt_value_is_an_error() {
        let store = MemoryStore::new();
        store.set(keys::USERS, "{not json").unwrap();
        let loaded: Result<Option<Vec<String>>> = get_json(&store, keys::USERS);
        assert!(loaded.is_err());
    }
}
