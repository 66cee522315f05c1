// crates/rbac-gate-core/src/runtime/permission.rs
// ============================================================================
// Module: Permission Checker
// Description: Ownership resolution plus policy evaluation for one request.
// Purpose: Produce a single allow/deny verdict that fails closed on error.
// Dependencies: crate::{interfaces, model, runtime::registry}
// ============================================================================

//! ## Overview
//! [`PermissionChecker::check_permission`] resolves ownership when a checker
//! is registered for the resource type, serializes the decision input, and
//! asks the policy evaluator for a verdict. Verdicts are never cached; only
//! ownership facts are.
//!
//! # Invariants
//! - `Ok(true)` is returned only when every stage succeeded.
//! - `resource.is_owner` is set iff a checker is registered for the type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::interfaces::EvaluationError;
use crate::interfaces::OwnershipError;
use crate::interfaces::PolicyEvaluator;
use crate::model::DeadlineElapsed;
use crate::model::DecisionScope;
use crate::model::PermissionInput;
use crate::runtime::registry::ResourceCheckerRegistry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission check failures. Every variant is an internal failure, never a
/// denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The resource checker could not determine ownership.
    #[error("ownership check for {resource_type} failed: {source}")]
    Ownership {
        /// Resource type whose checker failed.
        resource_type: String,
        /// Underlying checker error.
        source: OwnershipError,
    },
    /// The policy evaluator failed or rejected the input.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// The decision deadline elapsed.
    #[error("permission check cancelled: {0}")]
    Cancelled(#[from] DeadlineElapsed),
}

impl PermissionError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ownership {
                source: OwnershipError::Cancelled(_),
                ..
            }
            | Self::Cancelled(_) => "cancelled",
            Self::Ownership {
                ..
            } => "checker_failure",
            Self::Evaluation(_) => "evaluation_error",
        }
    }
}

// ============================================================================
// SECTION: Permission Checker
// ============================================================================

/// Combines the checker registry and the policy evaluator.
#[derive(Clone)]
pub struct PermissionChecker {
    /// Resource checkers keyed by resource type.
    registry: Arc<ResourceCheckerRegistry>,
    /// Active policy evaluator.
    policy: Arc<dyn PolicyEvaluator>,
}

impl PermissionChecker {
    /// Creates a permission checker.
    #[must_use]
    pub fn new(registry: Arc<ResourceCheckerRegistry>, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self {
            registry,
            policy,
        }
    }

    /// Returns the checker registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ResourceCheckerRegistry> {
        &self.registry
    }

    /// Decides whether the principal in `input` may perform its action.
    ///
    /// `input.resource.is_owner` is overwritten with the resolved ownership
    /// fact, or cleared when no checker is registered.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] when ownership cannot be resolved, the
    /// evaluator fails, or the scope deadline elapses.
    pub async fn check_permission(
        &self,
        scope: &DecisionScope,
        input: &mut PermissionInput,
    ) -> Result<bool, PermissionError> {
        scope.ensure_active()?;
        input.resource.is_owner = None;

        if let Some(checker) = self.registry.lookup(&input.resource.resource_type) {
            let is_owner = checker
                .check_ownership(scope, &input.resource.id, input.user.id)
                .await
                .map_err(|source| PermissionError::Ownership {
                    resource_type: input.resource.resource_type.clone(),
                    source,
                })?;
            input.resource.is_owner = Some(is_owner);
        }

        scope.ensure_active()?;
        let document = input.to_policy_input()?;
        Ok(self.policy.evaluate(&document)?)
    }
}

impl std::fmt::Debug for PermissionChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionChecker")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
