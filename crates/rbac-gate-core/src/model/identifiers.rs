// crates/rbac-gate-core/src/model/identifiers.rs
// ============================================================================
// Module: RBAC Gate Identifiers
// Description: Principal identifiers used in decision inputs and caches.
// Purpose: Provide a strongly typed, serializable principal identifier.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Principal identifiers are opaque unsigned integers resolved by
//! authentication. They serialize as plain numbers on the wire so policy
//! evaluators see `user.id` as an integer.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Principal (user) identifier.
///
/// # Invariants
/// - Serializes transparently as an unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(u64);

impl PrincipalId {
    /// Creates a principal identifier from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PrincipalId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
