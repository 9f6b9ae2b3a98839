//! TTL cache with per-entry expiration.
//!
//! Two instances back the provider: a short-lived one for decoded feeds and
//! a long-lived one for derived boards. Entries are evicted lazily on the
//! next `get` for their key; there is no background sweep and no capacity
//! bound.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct ExpiringCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Store `value` under `key` with the cache's default TTL.
    pub async fn insert(&self, key: &str, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    /// Store `value` under `key`, expiring `ttl` from now. Overwrites any
    /// existing entry for the key.
    pub async fn insert_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Return the live value for `key`, or nothing. An expired entry is
    /// removed on the way out and reported as absent, not as an error.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // The entry was stale under the read lock. Re-check under the write
        // lock: a concurrent insert may have replaced it in the meantime.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }
}
