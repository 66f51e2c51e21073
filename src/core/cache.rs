//! Cache-aside layer over a TTL key/value store
//!
//! Values are stored as JSON strings so entries written by other tools sharing
//! the same store and key schema stay readable.

use crate::core::currency::CurrencyCode;
use crate::core::error::{Error, Result};
use crate::core::period::Period;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Raw key/value store with per-key expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Returns `false` when the store refused to set the expiration.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}

/// Outcome of a typed cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    /// Stored payload could not be decoded as `T`.
    Raw(String),
    Miss,
}

/// Typed cache-aside front for a [`CacheStore`].
///
/// Lookups and writes are not atomic: two callers computing the same key both
/// miss, both fetch, and the last write wins.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<CacheLookup<T>> {
        let Some(raw) = self.store.get(key).await? else {
            debug!("Cache MISS for key: {}", key);
            return Ok(CacheLookup::Miss);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache HIT for key: {}", key);
                Ok(CacheLookup::Hit(value))
            }
            Err(e) => {
                warn!(error = %e, "Cached payload for key {} is not decodable", key);
                Ok(CacheLookup::Raw(raw))
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.store.set(key, payload).await?;

        match self.store.expire(key, self.ttl).await {
            Ok(true) => {
                debug!("Cache PUT for key: {}", key);
                Ok(())
            }
            Ok(false) => Err(Error::CacheExpirationFailed(key.to_string())),
            Err(e) => {
                debug!(error = %e, "Expire failed for key: {}", key);
                Err(Error::CacheExpirationFailed(key.to_string()))
            }
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// Undecodable payloads are refetched and overwritten. Errors from `fetch`
    /// are returned as-is and nothing is cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let CacheLookup::Hit(cached) = self.get(key).await? {
            return Ok(cached);
        }

        let value = fetch().await?;
        self.set(key, &value).await?;
        Ok(value)
    }
}

/// Cache key builders. These must stay byte-for-byte stable.
pub mod keys {
    use super::*;

    pub fn accounts() -> String {
        "accountsWithForeignCurrencies".to_string()
    }

    pub fn transactions(account_id: &str, from: i64, to: i64) -> String {
        format!("transactions:{account_id}:{from}:{to}")
    }

    pub fn currency_rate(from: CurrencyCode, to: CurrencyCode) -> String {
        format!("currencyRate:{from}:{to}")
    }

    pub fn income_by_period(period: &Period, bank_id: &str) -> String {
        format!("taxcalc:incomeByPeriod:{}:{}", period.cache_key(), bank_id)
    }
}
