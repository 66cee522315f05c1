// crates/rbac-gate-core/src/runtime/registry.rs
// ============================================================================
// Module: Resource Checker Registry
// Description: Concurrent map from resource type to ownership checker.
// Purpose: Support heterogeneous ownership semantics without hardcoding them.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Checkers are registered once at startup and read on every request. The
//! map sits behind a reader/writer lock, so lookups never block each other.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::interfaces::ResourceChecker;

/// Registry of resource checkers keyed by resource type.
///
/// # Invariants
/// - At most one checker per resource type; the last registration wins.
#[derive(Default)]
pub struct ResourceCheckerRegistry {
    /// Checkers keyed by resource type.
    checkers: RwLock<BTreeMap<String, Arc<dyn ResourceChecker>>>,
}

impl ResourceCheckerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `checker` for `resource_type`, returning any checker it
    /// replaced.
    pub fn register(
        &self,
        resource_type: impl Into<String>,
        checker: Arc<dyn ResourceChecker>,
    ) -> Option<Arc<dyn ResourceChecker>> {
        self.checkers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource_type.into(), checker)
    }

    /// Returns the checker registered for `resource_type`.
    #[must_use]
    pub fn lookup(&self, resource_type: &str) -> Option<Arc<dyn ResourceChecker>> {
        self.checkers.read().unwrap_or_else(PoisonError::into_inner).get(resource_type).cloned()
    }

    /// Removes and returns the checker registered for `resource_type`.
    pub fn unregister(&self, resource_type: &str) -> Option<Arc<dyn ResourceChecker>> {
        self.checkers.write().unwrap_or_else(PoisonError::into_inner).remove(resource_type)
    }

    /// Returns the registered resource types in sorted order.
    #[must_use]
    pub fn resource_types(&self) -> Vec<String> {
        self.checkers.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }
}

impl std::fmt::Debug for ResourceCheckerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCheckerRegistry")
            .field("resource_types", &self.resource_types())
            .finish()
    }
}
