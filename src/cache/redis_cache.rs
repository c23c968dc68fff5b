use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};

use super::{Cache, CacheError};

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(uri: &str) -> Result<RedisCache, CacheError> {
        let client = redis::Client::open(uri)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(RedisCache { connection })
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl Cache for RedisCache {
    #[tracing::instrument(skip(self))]
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let added: i64 = connection.sadd(key, member).await?;

        Ok(added > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_from_set(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let removed: i64 = connection.srem(key, member).await?;

        Ok(removed > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        let mut connection = self.connection.clone();
        let value: i64 = connection.incr(key, 1).await?;

        Ok(value)
    }

    #[tracing::instrument(skip(self))]
    async fn decrement(&self, key: &str) -> Result<i64, CacheError> {
        let mut connection = self.connection.clone();
        let value: i64 = connection.decr(key, 1).await?;

        Ok(value)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set_value(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        connection.set::<_, _, ()>(key, value).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key).await?;

        value.ok_or_else(|| CacheError::KeyNotFound { key: key.to_owned() })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_key(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(key).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let timestamp = at.timestamp().max(0) as usize;
        let applied: bool = connection.expire_at(key, timestamp).await?;

        Ok(applied)
    }
}

impl From<RedisError> for CacheError {
    fn from(error: RedisError) -> CacheError {
        CacheError::Unavailable(Box::new(error))
    }
}
