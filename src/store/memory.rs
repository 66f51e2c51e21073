use crate::core::cache::CacheStore;
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= Instant::now())
    }
}

/// In-memory store, lost on exit. Used for tests and `backend: memory`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let cache = self.inner.lock().await;
        cache.values().filter(|entry| !entry.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cache = self.inner.lock().await;
        if cache.get(key).is_some_and(CacheValue::is_expired) {
            debug!("Cache entry expired for key: {}", key);
            cache.remove(key);
            return Ok(None);
        }
        Ok(cache.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut cache = self.inner.lock().await;
        cache.insert(
            key.to_string(),
            CacheValue {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut cache = self.inner.lock().await;
        match cache.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
