//! HashMap-backed key-value store.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory [`KeyValueStore`].
///
/// Writes can be poisoned with [`fail_writes`](Self::fail_writes) to
/// exercise the core's best-effort persistence paths.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    writes_fail: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry before handing the store to the core.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Make every subsequent write fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Clone out the current contents, for assertions.
    pub fn dump(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            Err(BridgeError::Storage("write failure injected".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryKeyValueStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn multi_get_omits_absent_keys() {
        let store = MemoryKeyValueStore::new();
        store.seed("present", "yes");
        let found = store.multi_get(&["present", "absent"]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("present").map(String::as_str), Some("yes"));
    }

    #[tokio::test]
    async fn poisoned_writes_fail_but_reads_survive() {
        let store = MemoryKeyValueStore::new();
        store.seed("k", "v");
        store.fail_writes(true);
        assert!(store.set("k", "other").await.is_err());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
