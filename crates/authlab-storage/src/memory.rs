use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use authlab_core::{Error, GeneralStorage};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryStorageInner>,
}

#[derive(Default)]
struct MemoryStorageInner {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_alive(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeneralStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let now = Instant::now();
        let entries = self.inner.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_alive(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.inner
            .entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.entries.write().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, Error> {
        let now = Instant::now();
        let entry = self.inner.entries.write().await.remove(key);
        Ok(entry
            .filter(|entry| entry.is_alive(now))
            .map(|entry| entry.value))
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Instant::now();
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_alive(now));
        Ok((before - entries.len()) as u64)
    }
}
