use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Cache, CacheError};

/// Single-process stand-in for the shared store.
///
/// Each operation holds the lock for its whole read-modify-write, which gives
/// the same per-key atomicity the remote store provides. It is only "shared"
/// between callers inside this process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum Value {
    Bytes(Vec<u8>),
    Members(HashSet<String>),
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }

    /// Members of the set at `key`, empty if absent.
    pub fn members(&self, key: &str) -> Result<HashSet<String>, CacheError> {
        let mut entries = self.lock()?;
        match live_entry(&mut entries, key) {
            None => Ok(HashSet::new()),
            Some(Entry {
                value: Value::Members(members),
                ..
            }) => Ok(members.clone()),
            Some(_) => Err(CacheError::WrongType { key: key.to_owned() }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".into()))
    }

    fn add(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let mut entries = self.lock()?;
        let current = match live_entry(&mut entries, key) {
            None => 0,
            Some(Entry {
                value: Value::Bytes(bytes),
                ..
            }) => parse_integer(key, bytes)?,
            Some(_) => return Err(CacheError::WrongType { key: key.to_owned() }),
        };

        let value = current.checked_add(delta).ok_or_else(|| {
            CacheError::Unavailable(format!("integer overflow on key {}", key).into())
        })?;

        // keep any pending expiry, like INCR/DECR do
        let expires_at = entries.get(key).and_then(|entry| entry.expires_at);
        entries.insert(
            key.to_owned(),
            Entry {
                value: Value::Bytes(value.to_string().into_bytes()),
                expires_at,
            },
        );

        Ok(value)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    #[tracing::instrument(skip(self))]
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        if live_entry(&mut entries, key).is_none() {
            entries.insert(
                key.to_owned(),
                Entry {
                    value: Value::Members(HashSet::new()),
                    expires_at: None,
                },
            );
        }

        match entries.get_mut(key) {
            Some(Entry {
                value: Value::Members(members),
                ..
            }) => Ok(members.insert(member.to_owned())),
            _ => Err(CacheError::WrongType { key: key.to_owned() }),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove_from_set(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        let removed = match live_entry(&mut entries, key) {
            None => return Ok(false),
            Some(Entry {
                value: Value::Members(members),
                ..
            }) => members.remove(member),
            Some(_) => return Err(CacheError::WrongType { key: key.to_owned() }),
        };

        // an emptied set no longer exists
        if matches!(entries.get(key), Some(Entry { value: Value::Members(members), .. }) if members.is_empty())
        {
            entries.remove(key);
        }

        Ok(removed)
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        self.add(key, 1)
    }

    #[tracing::instrument(skip(self))]
    async fn decrement(&self, key: &str) -> Result<i64, CacheError> {
        self.add(key, -1)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set_value(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_owned(),
            Entry {
                value: Value::Bytes(value.to_vec()),
                expires_at: None,
            },
        );

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let mut entries = self.lock()?;
        match live_entry(&mut entries, key) {
            None => Err(CacheError::KeyNotFound { key: key.to_owned() }),
            Some(Entry {
                value: Value::Bytes(bytes),
                ..
            }) => Ok(bytes.clone()),
            Some(_) => Err(CacheError::WrongType { key: key.to_owned() }),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_key(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.remove(key);

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        match live_entry(&mut entries, key) {
            None => Ok(false),
            Some(entry) => {
                entry.expires_at = Some(at);
                Ok(true)
            }
        }
    }
}

/// Looks up `key`, evicting it first if it has expired.
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let expired = matches!(entries.get(key), Some(Entry { expires_at: Some(at), .. }) if *at <= Utc::now());
    if expired {
        entries.remove(key);
        return None;
    }

    entries.get_mut(key)
}

fn parse_integer(key: &str, bytes: &[u8]) -> Result<i64, CacheError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| CacheError::WrongType { key: key.to_owned() })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn add_to_set_reports_new_members_only() {
        let cache = MemoryCache::new();

        assert!(cache.add_to_set("users", "alice").await.unwrap());
        assert!(!cache.add_to_set("users", "alice").await.unwrap());
        assert!(cache.add_to_set("users", "bob").await.unwrap());

        assert_eq!(cache.members("users").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn remove_from_set_reports_presence() {
        let cache = MemoryCache::new();
        cache.add_to_set("users", "alice").await.unwrap();

        assert!(cache.remove_from_set("users", "alice").await.unwrap());
        assert!(!cache.remove_from_set("users", "alice").await.unwrap());
        assert!(!cache.remove_from_set("nobody", "alice").await.unwrap());
        assert!(cache.members("users").unwrap().is_empty());
    }

    #[tokio::test]
    async fn counters_operate_on_integer_text() {
        let cache = MemoryCache::new();
        cache.set_value("remaining", b"1").await.unwrap();

        assert_eq!(cache.decrement("remaining").await.unwrap(), 0);
        assert_eq!(cache.decrement("remaining").await.unwrap(), -1);
        assert_eq!(cache.increment("remaining").await.unwrap(), 0);
        assert_eq!(cache.get_value("remaining").await.unwrap(), b"0".to_vec());
    }

    #[tokio::test]
    async fn counters_start_from_zero_when_absent() {
        let cache = MemoryCache::new();

        assert_eq!(cache.increment("fresh").await.unwrap(), 1);
        assert_eq!(cache.decrement("other").await.unwrap(), -1);
    }

    #[tokio::test]
    async fn counters_reject_non_integer_values() {
        let cache = MemoryCache::new();
        cache.set_value("data", b"{\"name\":\"x\"}").await.unwrap();
        cache.add_to_set("users", "alice").await.unwrap();

        assert!(matches!(
            cache.increment("data").await,
            Err(CacheError::WrongType { .. })
        ));
        assert!(matches!(
            cache.decrement("users").await,
            Err(CacheError::WrongType { .. })
        ));
    }

    #[tokio::test]
    async fn get_value_of_missing_key_is_not_found() {
        let cache = MemoryCache::new();

        let err = cache.get_value("missing").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_key_removes_any_entry() {
        let cache = MemoryCache::new();
        cache.set_value("data", b"x").await.unwrap();
        cache.add_to_set("users", "alice").await.unwrap();

        cache.delete_key("data").await.unwrap();
        cache.delete_key("users").await.unwrap();
        cache.delete_key("never-existed").await.unwrap();

        assert!(cache.get_value("data").await.unwrap_err().is_not_found());
        assert!(cache.members("users").unwrap().is_empty());
    }

    #[tokio::test]
    async fn expire_at_hides_key_once_passed() {
        let cache = MemoryCache::new();
        cache.set_value("past", b"1").await.unwrap();
        cache.set_value("future", b"1").await.unwrap();

        assert!(cache
            .expire_at("past", Utc::now() - Duration::seconds(1))
            .await
            .unwrap());
        assert!(cache
            .expire_at("future", Utc::now() + Duration::hours(1))
            .await
            .unwrap());
        assert!(!cache.expire_at("missing", Utc::now()).await.unwrap());

        assert!(cache.get_value("past").await.unwrap_err().is_not_found());
        assert_eq!(cache.get_value("future").await.unwrap(), b"1".to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_are_not_lost() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        cache.set_value("remaining", b"1000").await.unwrap();

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.decrement("remaining").await.unwrap() })
            })
            .collect();
        let mut observed = vec![];
        for task in tasks {
            observed.push(task.await.unwrap());
        }
        observed.sort_unstable();
        observed.dedup();

        assert_eq!(observed.len(), 100);
        assert_eq!(cache.get_value("remaining").await.unwrap(), b"900".to_vec());
    }
}
