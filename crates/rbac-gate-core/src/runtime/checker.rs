// crates/rbac-gate-core/src/runtime/checker.rs
// ============================================================================
// Module: Cached Ownership Checker
// Description: Cache-first resource checker backed by an owner source.
// Purpose: Resolve ownership with at most one store lookup per TTL window.
// Dependencies: crate::{interfaces, model, runtime::cache}, tokio
// ============================================================================

//! ## Overview
//! [`CachedOwnershipChecker`] is the canonical [`ResourceChecker`]. It
//! answers from the shared ownership cache when it can and falls back to the
//! authoritative [`OwnerSource`] on a miss, caching the owner it finds.
//!
//! Mutation paths invalidate entries through [`spawn_invalidation`]. The
//! invalidation task is not awaited, so a reader racing a mutation may see
//! the old owner for at most one TTL window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::interfaces::OwnerSource;
use crate::interfaces::OwnershipError;
use crate::interfaces::ResourceChecker;
use crate::model::DecisionScope;
use crate::model::PrincipalId;
use crate::runtime::cache::OwnershipCache;

// ============================================================================
// SECTION: Cache Keys
// ============================================================================

/// Builds the ownership cache key for a resource.
#[must_use]
pub fn ownership_cache_key(resource_type: &str, resource_id: &str) -> String {
    format!("{resource_type}:{resource_id}:author")
}

/// Removes a resource's ownership entry on a background task.
///
/// Callers must not await the returned handle on the mutation path.
pub fn spawn_invalidation(
    cache: &Arc<OwnershipCache>,
    resource_type: &str,
    resource_id: &str,
) -> JoinHandle<()> {
    let cache = Arc::clone(cache);
    let key = ownership_cache_key(resource_type, resource_id);
    tokio::spawn(async move {
        cache.delete(&key);
    })
}

// ============================================================================
// SECTION: Checker
// ============================================================================

/// Cache-first ownership checker for one resource type.
///
/// # Invariants
/// - A missing resource yields `Ok(false)` and is not cached.
/// - Source failures propagate and never populate the cache.
pub struct CachedOwnershipChecker<S> {
    /// Resource type used to build cache keys.
    resource_type: String,
    /// Authoritative owner lookup.
    source: S,
    /// Shared ownership cache.
    cache: Arc<OwnershipCache>,
    /// Lifetime of entries written by this checker.
    ttl: Duration,
}

impl<S> CachedOwnershipChecker<S> {
    /// Creates a checker using the cache's default TTL.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, source: S, cache: Arc<OwnershipCache>) -> Self {
        let ttl = cache.default_ttl();
        Self {
            resource_type: resource_type.into(),
            source,
            cache,
            ttl,
        }
    }

    /// Overrides the lifetime of entries written by this checker.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the resource type this checker serves.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

#[async_trait]
impl<S: OwnerSource> ResourceChecker for CachedOwnershipChecker<S> {
    async fn check_ownership(
        &self,
        scope: &DecisionScope,
        resource_id: &str,
        user_id: PrincipalId,
    ) -> Result<bool, OwnershipError> {
        let key = ownership_cache_key(&self.resource_type, resource_id);
        if let Some(owner) = self.cache.get(&key) {
            return Ok(owner == user_id);
        }
        let Some(owner) = scope.run(self.source.load_owner(resource_id)).await?? else {
            return Ok(false);
        };
        self.cache.set(key, owner, self.ttl);
        Ok(owner == user_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;
    use crate::interfaces::SourceError;

    /// Source that always fails.
    struct BrokenSource;

    #[async_trait]
    impl OwnerSource for BrokenSource {
        async fn load_owner(&self, _: &str) -> Result<Option<PrincipalId>, SourceError> {
            Err(SourceError::Unavailable("down".to_string()))
        }
    }

    #[test]
    fn cache_key_uses_author_suffix() {
        assert_eq!(ownership_cache_key("posts", "42"), "posts:42:author");
    }

    #[tokio::test]
    async fn source_failure_is_not_cached() {
        let cache = Arc::new(OwnershipCache::default());
        let checker = CachedOwnershipChecker::new("posts", BrokenSource, Arc::clone(&cache));
        let result = checker.check_ownership(&DecisionScope::new(), "1", PrincipalId::new(1)).await;
        assert!(matches!(result, Err(OwnershipError::Source(SourceError::Unavailable(_)))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn invalidation_removes_entry() {
        let cache = Arc::new(OwnershipCache::default());
        cache.set_default(ownership_cache_key("posts", "5"), PrincipalId::new(3));
        spawn_invalidation(&cache, "posts", "5").await.unwrap();
        assert!(cache.get("posts:5:author").is_none());
    }
}
