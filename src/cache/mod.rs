use std::fmt::{Debug, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::campaign::CampaignId;

pub mod memory;
pub mod redis_cache;

pub use self::memory::MemoryCache;
pub use self::redis_cache::RedisCache;

/// Atomic primitives against the shared in-memory store.
///
/// Every method is a single atomic operation on a single key. Nothing here is
/// atomic across keys; callers that touch more than one key must compensate
/// for partial failure themselves.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns `true` if `member` was not already in the set.
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    /// Returns `true` if `member` was in the set.
    async fn remove_from_set(&self, key: &str, member: &str) -> Result<bool, CacheError>;

    /// Returns the value after incrementing.
    async fn increment(&self, key: &str) -> Result<i64, CacheError>;

    /// Returns the value after decrementing.
    async fn decrement(&self, key: &str) -> Result<i64, CacheError>;

    async fn set_value(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    async fn get_value(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    async fn delete_key(&self, key: &str) -> Result<(), CacheError>;

    /// Returns `true` if the key existed and the expiry was applied.
    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<bool, CacheError>;
}

/// Keys holding the cached projections of a single campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignKeys {
    pub data: String,
    pub remaining: String,
    pub requesters: String,
}

impl CampaignKeys {
    pub fn new(campaign_id: CampaignId) -> CampaignKeys {
        CampaignKeys {
            data: format!("campaign:{}:data", campaign_id),
            remaining: format!("campaign:{}:remaining", campaign_id),
            requesters: format!("campaign:{}:requesters", campaign_id),
        }
    }
}

#[derive(Debug)]
pub enum CacheError {
    KeyNotFound { key: String },
    WrongType { key: String },
    Unavailable(Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound { .. })
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            CacheError::KeyNotFound { key } => write!(f, "key not found: {}", key),
            CacheError::WrongType { key } => write!(f, "wrong type for key: {}", key),
            CacheError::Unavailable(err) => write!(f, "cache unavailable: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Unavailable(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
