// crates/rbac-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: RBAC Gate Interfaces
// Description: Backend-agnostic interfaces for ownership and policy decisions.
// Purpose: Define the contract surfaces used by the RBAC Gate runtime.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! Interfaces define how RBAC Gate integrates with resource stores and policy
//! runtimes without embedding backend-specific details. Implementations must
//! fail closed: an ambiguous answer is an error, never a permit.
//!
//! Absence and failure are distinct. An [`OwnerSource`] that cannot find a
//! resource returns `Ok(None)`; one that cannot reach its store returns
//! [`SourceError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::model::DeadlineElapsed;
use crate::model::DecisionScope;
use crate::model::PolicyInput;
use crate::model::PrincipalId;

// ============================================================================
// SECTION: Owner Source
// ============================================================================

/// Authoritative-store errors unrelated to resource absence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The store could not be reached.
    #[error("owner source unavailable: {0}")]
    Unavailable(String),
    /// The store returned an error.
    #[error("owner source error: {0}")]
    Store(String),
}

/// Authoritative lookup of a resource's owner.
#[async_trait]
pub trait OwnerSource: Send + Sync {
    /// Loads the owner of `resource_id`.
    ///
    /// Returns `Ok(None)` when the resource does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the store fails for any other reason.
    async fn load_owner(&self, resource_id: &str) -> Result<Option<PrincipalId>, SourceError>;
}

// ============================================================================
// SECTION: Resource Checker
// ============================================================================

/// Ownership resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    /// The authoritative lookup failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The decision deadline elapsed before ownership was resolved.
    #[error("ownership resolution cancelled: {0}")]
    Cancelled(#[from] DeadlineElapsed),
}

/// Per-resource-type ownership capability.
///
/// # Invariants
/// - A resource that does not exist is reported as `Ok(false)`.
/// - Store failures surface as errors and are never treated as denials.
#[async_trait]
pub trait ResourceChecker: Send + Sync {
    /// Returns whether `user_id` owns `resource_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError`] when ownership cannot be determined.
    async fn check_ownership(
        &self,
        scope: &DecisionScope,
        resource_id: &str,
        user_id: PrincipalId,
    ) -> Result<bool, OwnershipError>;
}

// ============================================================================
// SECTION: Policy Evaluator
// ============================================================================

/// Policy evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The decision input could not be encoded or decoded.
    #[error("invalid policy input: {0}")]
    InvalidInput(String),
    /// The evaluator reported a fault.
    #[error("policy evaluation failed: {0}")]
    Failed(String),
}

/// Opaque policy evaluator.
///
/// # Invariants
/// - Deterministic and side-effect free for a given input.
/// - Safe to call concurrently and repeatedly.
pub trait PolicyEvaluator: Send + Sync {
    /// Evaluates the structured decision input.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] when the input is malformed or the
    /// evaluator faults.
    fn evaluate(&self, input: &PolicyInput) -> Result<bool, EvaluationError>;
}
