pub mod disk;
pub mod memory;
pub mod rediskv;

use crate::core::cache::CacheStore;
use crate::core::config::{CacheBackend, CacheConfig};
use anyhow::{Context, Result, anyhow};
use disk::DiskStore;
use memory::MemoryStore;
use rediskv::RedisStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Opens the store selected by `config`. `data_path` is the fallback location for the disk backend.
pub async fn open_store(config: &CacheConfig, data_path: &Path) -> Result<Arc<dyn CacheStore>> {
    debug!("Opening {:?} cache store", config.backend);

    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
        CacheBackend::Disk => {
            let path = config
                .path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| data_path.join("cache"));
            Arc::new(
                DiskStore::open(&path)
                    .with_context(|| format!("Failed to open cache at {}", path.display()))?,
            )
        }
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow!("cache.redis_url is required for the redis backend"))?;
            Arc::new(
                RedisStore::connect(url)
                    .await
                    .context("Failed to connect to redis")?,
            )
        }
    };
    Ok(store)
}
