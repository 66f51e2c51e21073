use crate::core::cache::CacheStore;
use crate::core::error::{Error, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: Option<SystemTime>,
}

impl From<fjall::Error> for Error {
    fn from(e: fjall::Error) -> Self {
        Error::cache(e.to_string())
    }
}

/// Persistent store backed by a fjall partition.
pub struct DiskStore {
    // Keeps the keyspace journal alive for the partition's lifetime.
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| Error::cache(e.to_string()))?;

        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition("cache", PartitionCreateOptions::default())?;
        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }

    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        match self.partition.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        self.partition.insert(key, serde_json::to_vec(entry)?)?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(entry) = self.read_entry(key)? else {
            return Ok(None);
        };

        if entry.expires_at.is_some_and(|at| SystemTime::now() > at) {
            debug!("Cache entry expired for key: {}", key);
            self.partition.remove(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.write_entry(
            key,
            &CacheEntry {
                value,
                expires_at: None,
            },
        )
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let Some(mut entry) = self.read_entry(key)? else {
            return Ok(false);
        };
        entry.expires_at = Some(SystemTime::now() + ttl);
        self.write_entry(key, &entry)?;
        Ok(true)
    }
}
