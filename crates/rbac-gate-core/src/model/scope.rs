// crates/rbac-gate-core/src/model/scope.rs
// ============================================================================
// Module: Decision Scope
// Description: Per-request context carried through every decision stage.
// Purpose: Propagate request identity and cancellation deadlines.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A [`DecisionScope`] travels with a single authorization request. Every
//! suspend point (authentication, ownership resolution, policy evaluation)
//! observes its deadline so an abandoned or slow request stops promptly
//! instead of completing a useless check. Dropping the request future cancels
//! all in-flight stages as well; the deadline covers requests that stay
//! connected but stall.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Returned when a decision stage outlives the request deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decision deadline elapsed")]
pub struct DeadlineElapsed;

/// Per-request decision context.
///
/// # Invariants
/// - Once the deadline passes, every subsequent stage fails closed.
#[derive(Debug, Clone, Default)]
pub struct DecisionScope {
    /// Request identifier for audit correlation.
    request_id: Option<String>,
    /// Absolute deadline for the whole decision.
    deadline: Option<Instant>,
}

impl DecisionScope {
    /// Builds an unbounded scope with no request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns a copy whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Returns a copy with an explicit absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the request identifier, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns the absolute deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails fast when the deadline has already passed.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineElapsed`] when the scope is expired.
    pub fn ensure_active(&self) -> Result<(), DeadlineElapsed> {
        if self.is_expired() { Err(DeadlineElapsed) } else { Ok(()) }
    }

    /// Drives a suspend point to completion within the scope deadline.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineElapsed`] when the deadline passes first.
    pub async fn run<F>(&self, stage: F) -> Result<F::Output, DeadlineElapsed>
    where
        F: Future,
    {
        match self.deadline {
            Some(deadline) => {
                tokio::time::timeout_at(deadline, stage).await.map_err(|_| DeadlineElapsed)
            }
            None => Ok(stage.await),
        }
    }
}
