// crates/rbac-gate-core/src/runtime/policy.rs
// ============================================================================
// Module: Reloadable Policy
// Description: Policy evaluator handle that can be replaced at runtime.
// Purpose: Hot-swap the active policy without rebuilding the checker.
// Dependencies: crate::{interfaces, model}
// ============================================================================

//! ## Overview
//! [`ReloadablePolicy`] forwards every evaluation to the evaluator active at
//! call time. A swap affects only evaluations that start after it.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::interfaces::EvaluationError;
use crate::interfaces::PolicyEvaluator;
use crate::model::PolicyInput;

/// Swappable policy evaluator.
pub struct ReloadablePolicy {
    /// Currently active evaluator.
    active: RwLock<Arc<dyn PolicyEvaluator>>,
}

impl ReloadablePolicy {
    /// Wraps an initial evaluator.
    #[must_use]
    pub fn new(initial: Arc<dyn PolicyEvaluator>) -> Self {
        Self {
            active: RwLock::new(initial),
        }
    }

    /// Replaces the active evaluator and returns the previous one.
    pub fn swap(&self, next: Arc<dyn PolicyEvaluator>) -> Arc<dyn PolicyEvaluator> {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Returns the currently active evaluator.
    #[must_use]
    pub fn current(&self) -> Arc<dyn PolicyEvaluator> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl PolicyEvaluator for ReloadablePolicy {
    fn evaluate(&self, input: &PolicyInput) -> Result<bool, EvaluationError> {
        self.current().evaluate(input)
    }
}
