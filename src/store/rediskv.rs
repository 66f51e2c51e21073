use crate::core::cache::CacheStore;
use crate::core::error::{Error, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tracing::info;

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::cache(e.to_string())
    }
}

/// Store shared through a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to redis cache store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let reply: i64 = conn.expire(key, seconds).await?;
        Ok(expire_applied(reply))
    }
}

/// EXPIRE replies 1 when the timeout was set and 0 when the key does not exist.
fn expire_applied(reply: i64) -> bool {
    reply == 1
}
