// crates/rbac-gate-core/src/model/input.rs
// ============================================================================
// Module: Permission Decision Input
// Description: Canonical fact bundle handed to policy evaluators.
// Purpose: Provide a stable, declarative input contract for policy rules.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`PermissionInput`] is built fresh for every request and discarded once
//! the verdict is returned. Its serialized form is the structured-fact
//! document policy evaluators reason over:
//!
//! ```json
//! {
//!   "action": "PUT:/posts/:id",
//!   "resource": { "type": "posts", "id": "42", "is_owner": true },
//!   "user": { "id": 7, "role": "user" }
//! }
//! ```
//!
//! `resource.is_owner` is omitted entirely when no resource checker is
//! registered for the resource type.

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::interfaces::EvaluationError;
use crate::model::identifiers::PrincipalId;

/// Resource identifier used when an action targets a collection rather than
/// a specific instance.
pub const COLLECTION_RESOURCE_ID: &str = "0";

// ============================================================================
// SECTION: Decision Input
// ============================================================================

/// Per-request permission decision input.
///
/// # Invariants
/// - `resource.is_owner` is `Some` only after a resource checker ran.
/// - `user.id` is resolved by authentication before construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInput {
    /// Action label in `METHOD:route-template` form.
    pub action: String,
    /// Facts about the targeted resource.
    pub resource: ResourceFacts,
    /// Facts about the requesting principal.
    pub user: UserFacts,
}

/// Resource facts for a decision input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFacts {
    /// Resource category (registry lookup key).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource identifier or [`COLLECTION_RESOURCE_ID`].
    pub id: String,
    /// Ownership verdict when a resource checker ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_owner: Option<bool>,
}

/// Principal facts for a decision input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacts {
    /// Principal identifier.
    pub id: PrincipalId,
    /// Principal role label.
    pub role: String,
}

impl PermissionInput {
    /// Builds a decision input with ownership left undetermined.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        user_id: PrincipalId,
        role: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            resource: ResourceFacts {
                resource_type: resource_type.into(),
                id: resource_id.into(),
                is_owner: None,
            },
            user: UserFacts {
                id: user_id,
                role: role.into(),
            },
        }
    }

    /// Returns true when the action targets a collection.
    #[must_use]
    pub fn is_collection_action(&self) -> bool {
        self.resource.id == COLLECTION_RESOURCE_ID
    }

    /// Serializes the input into the structured-fact form consumed by
    /// policy evaluators.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidInput`] when serialization fails.
    pub fn to_policy_input(&self) -> Result<PolicyInput, EvaluationError> {
        serde_json::to_value(self)
            .map(PolicyInput::from_value)
            .map_err(|err| EvaluationError::InvalidInput(err.to_string()))
    }
}

// ============================================================================
// SECTION: Policy Input
// ============================================================================

/// Serialized decision input handed to a [`crate::PolicyEvaluator`].
///
/// # Invariants
/// - Evaluators treat the document as untrusted and decode it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PolicyInput(Value);

impl PolicyInput {
    /// Wraps a raw JSON document.
    #[must_use]
    pub const fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Returns the raw JSON document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Decodes the document into a typed structure.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidInput`] when the document does not
    /// match the requested shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EvaluationError> {
        T::deserialize(&self.0).map_err(|err| EvaluationError::InvalidInput(err.to_string()))
    }
}
