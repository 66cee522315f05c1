// crates/rbac-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Support
// Description: Shared fakes for permission-decision tests.
// Purpose: Reduce duplication across rbac-gate-core integration tests.
// ============================================================================
//! ## Overview
//! Counting owner sources and recording policy evaluators.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Test helpers are selectively used across suites."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use rbac_gate_core::EvaluationError;
use rbac_gate_core::OwnerSource;
use rbac_gate_core::PermissionInput;
use rbac_gate_core::PolicyEvaluator;
use rbac_gate_core::PolicyInput;
use rbac_gate_core::PrincipalId;
use rbac_gate_core::SourceError;

/// Owner source backed by a map that counts lookups.
#[derive(Clone, Default)]
pub struct CountingSource {
    /// Owners keyed by resource id.
    owners: Arc<Mutex<BTreeMap<String, PrincipalId>>>,
    /// Number of `load_owner` calls.
    lookups: Arc<AtomicUsize>,
    /// When set, every lookup fails.
    failure: Option<SourceError>,
    /// Artificial latency per lookup.
    delay: Option<Duration>,
}

impl CountingSource {
    /// Source that knows a single resource owner.
    pub fn with_owner(resource_id: &str, owner: u64) -> Self {
        let source = Self::default();
        source.insert(resource_id, owner);
        source
    }

    /// Source whose every lookup fails with `error`.
    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Source that sleeps before answering.
    pub fn slow(resource_id: &str, owner: u64, delay: Duration) -> Self {
        let source = Self::with_owner(resource_id, owner);
        Self {
            delay: Some(delay),
            ..source
        }
    }

    /// Sets the owner of `resource_id`.
    pub fn insert(&self, resource_id: &str, owner: u64) {
        self.owners.lock().unwrap().insert(resource_id.to_string(), PrincipalId::new(owner));
    }

    /// Deletes `resource_id` from the store.
    pub fn remove(&self, resource_id: &str) {
        self.owners.lock().unwrap().remove(resource_id);
    }

    /// Returns the number of lookups performed.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OwnerSource for CountingSource {
    async fn load_owner(&self, resource_id: &str) -> Result<Option<PrincipalId>, SourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.owners.lock().unwrap().get(resource_id).copied())
    }
}

/// Evaluator that records inputs and delegates to a closure.
pub struct RecordingPolicy<F> {
    /// Decision function over the decoded input.
    decide: F,
    /// Every decoded input seen.
    pub seen: Mutex<Vec<serde_json::Value>>,
}

impl<F> RecordingPolicy<F>
where
    F: Fn(&PermissionInput) -> Result<bool, EvaluationError> + Send + Sync,
{
    /// Wraps a decision function.
    pub fn new(decide: F) -> Arc<Self> {
        Arc::new(Self {
            decide,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Returns the number of evaluations.
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Returns the most recent input document.
    pub fn last(&self) -> serde_json::Value {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

impl<F> PolicyEvaluator for RecordingPolicy<F>
where
    F: Fn(&PermissionInput) -> Result<bool, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, input: &PolicyInput) -> Result<bool, EvaluationError> {
        self.seen.lock().unwrap().push(input.as_value().clone());
        let decoded: PermissionInput = input.decode()?;
        (self.decide)(&decoded)
    }
}

/// Owner may act; admins may act on anything.
pub fn owner_or_admin(input: &PermissionInput) -> Result<bool, EvaluationError> {
    Ok(input.user.role == "admin" || input.resource.is_owner == Some(true))
}

/// Moderators and admins may act regardless of ownership.
pub fn moderator_or_admin(input: &PermissionInput) -> Result<bool, EvaluationError> {
    Ok(matches!(input.user.role.as_str(), "moderator" | "admin"))
}
