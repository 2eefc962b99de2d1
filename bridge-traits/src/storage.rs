//! Key-value storage abstraction.
//!
//! Abstracts platform-specific persistent key-value storage:
//! - iOS: UserDefaults
//! - Android: SharedPreferences / DataStore
//! - Desktop: config files or an embedded database
//!
//! Values are opaque strings; callers own serialization. `multi_get` and
//! `multi_set` exist so related keys can be read or written as one batch,
//! but implementations give no transactional guarantee across keys —
//! partial writes are possible and readers must tolerate any subset of
//! keys being absent or malformed.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// String-keyed persistent storage trait.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value. Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Read several keys in one batch. Absent keys are simply omitted from
    /// the returned map.
    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await? {
                found.insert((*key).to_string(), value);
            }
        }
        Ok(found)
    }

    /// Write several pairs in one batch. Not atomic: a failure may leave a
    /// prefix of the pairs written.
    async fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<()> {
        for (key, value) in pairs {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
