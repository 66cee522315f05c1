// crates/rbac-gate-core/tests/registry.rs
// ============================================================================
// Module: Resource Checker Registry Tests
// Description: Registration, replacement, and removal of resource checkers.
// ============================================================================
//! ## Overview
//! Validates last-write-wins registration and concurrent lookups.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use std::sync::Arc;

use common::CountingSource;
use rbac_gate_core::CachedOwnershipChecker;
use rbac_gate_core::DecisionScope;
use rbac_gate_core::OwnershipCache;
use rbac_gate_core::PrincipalId;
use rbac_gate_core::ResourceChecker;
use rbac_gate_core::ResourceCheckerRegistry;

fn checker_for(owner: u64) -> Arc<dyn ResourceChecker> {
    Arc::new(CachedOwnershipChecker::new(
        "posts",
        CountingSource::with_owner("1", owner),
        Arc::new(OwnershipCache::default()),
    ))
}

#[tokio::test]
async fn last_registration_wins() {
    let registry = ResourceCheckerRegistry::new();
    assert!(registry.register("posts", checker_for(1)).is_none());
    assert!(registry.register("posts", checker_for(2)).is_some());

    let checker = registry.lookup("posts").unwrap();
    let owned = checker.check_ownership(&DecisionScope::new(), "1", PrincipalId::new(2)).await;
    assert!(owned.unwrap());
}

#[test]
fn unregister_removes_checker() {
    let registry = ResourceCheckerRegistry::new();
    registry.register("posts", checker_for(1));
    registry.register("albums", checker_for(1));

    assert_eq!(registry.resource_types(), vec!["albums".to_string(), "posts".to_string()]);
    assert!(registry.unregister("posts").is_some());
    assert!(registry.lookup("posts").is_none());
    assert!(registry.unregister("posts").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_see_registered_checker() {
    let registry = Arc::new(ResourceCheckerRegistry::new());
    registry.register("posts", checker_for(5));

    let mut handles = Vec::new();
    for _ in 0 .. 16 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move { registry.lookup("posts").is_some() }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }
}
