// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory expiring key-value cache.
//!
//! Backs the session cache: OAuth state tokens and issued access tokens.
//! Entries are process-local and are lost on restart. Expired entries are
//! invisible to readers immediately and are physically removed either lazily
//! on access or by the janitor task.

use crate::models::SessionEntry;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Cache holding both kinds of session entries.
pub type SessionCache = ExpiringCache<SessionEntry>;

#[derive(Clone)]
struct Expiring<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Expiring<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent map with a per-entry time-to-live.
///
/// Cloning is cheap and yields a handle to the same entries.
pub struct ExpiringCache<V> {
    entries: Arc<DashMap<String, Expiring<V>>>,
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> ExpiringCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, expiring after `ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries
            .insert(key.into(), Expiring { value, expires_at });
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }
        // The read guard is dropped before removal to avoid deadlocking the shard.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    /// Remove `key` and return its value if it was still live.
    ///
    /// Concurrent callers racing on the same key see at most one `Some`.
    pub fn take(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(_, entry)| entry.value)
    }

    /// Remove `key`, live or not.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a background task purging expired entries every `every`.
    ///
    /// The task stops once every handle to the cache has been dropped.
    pub fn spawn_janitor(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let entries: Weak<DashMap<String, Expiring<V>>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let cache = ExpiringCache { entries };
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(
                        purged,
                        remaining = cache.len(),
                        "Purged expired cache entries"
                    );
                }
            }
        })
    }
}
