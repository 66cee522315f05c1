// crates/rbac-gate-core/src/runtime/cache.rs
// ============================================================================
// Module: Ownership Cache
// Description: Time-bounded key/value store with lazy and swept expiry.
// Purpose: Avoid an authoritative-store round-trip on every ownership check.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`TtlCache`] stores values with an absolute expiry. Reads treat expired
//! entries as absent, so correctness never depends on the background sweep;
//! the sweep only reclaims memory. All operations are in-memory and bounded.
//!
//! Time is read from `tokio::time::Instant` so tests can drive expiry with a
//! paused clock.
//!
//! # Invariants
//! - An entry is never returned at or after its expiry instant.
//! - `set` always overwrites; `delete` is a no-op when the key is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::model::PrincipalId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default lifetime of an ownership entry.
pub const DEFAULT_OWNERSHIP_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval between background eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cache of resource owners keyed by `<type>:<id>:author`.
pub type OwnershipCache = TtlCache<PrincipalId>;

/// Stored value and its absolute expiry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// Cached value.
    value: V,
    /// Instant at which the entry stops being observable.
    expires_at: Instant,
}

/// Concurrent time-bounded cache.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Entries guarded by a reader/writer lock.
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    /// Lifetime applied by [`TtlCache::set_default`].
    default_ttl: Duration,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_OWNERSHIP_TTL)
    }
}

impl<V> TtlCache<V> {
    /// Creates an empty cache with the given default entry lifetime.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Returns the default entry lifetime.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.write().insert(
            key.into(),
            CacheEntry {
                value,
                expires_at,
            },
        );
    }

    /// Stores `value` under `key` with the default lifetime.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Removes `key` unconditionally.
    pub fn delete(&self, key: &str) {
        self.write().remove(key);
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Acquires the read lock; a poisoned lock still holds whole entries.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the write lock; a poisoned lock still holds whole entries.
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Returns the live value for `key`, or `None` if absent or expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.read()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }
}

impl<V: Send + Sync + 'static> TtlCache<V> {
    /// Spawns a background task that evicts expired entries every
    /// `interval`.
    ///
    /// The task holds only a weak reference and exits once the cache is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.evict_expired();
            }
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
