// crates/rbac-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: RBAC Gate Runtime
// Description: Ownership cache, resource checkers, and the permission checker.
// Purpose: Execute permission decisions against registered checkers and policy.
// Dependencies: crate::{model, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules implement the permission-decision flow: an optional
//! ownership lookup through a registered [`ResourceChecker`], assembly of the
//! decision input, and a single call into the active policy evaluator.
//!
//! [`ResourceChecker`]: crate::interfaces::ResourceChecker

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod checker;
pub mod permission;
pub mod policy;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::DEFAULT_OWNERSHIP_TTL;
pub use cache::DEFAULT_SWEEP_INTERVAL;
pub use cache::OwnershipCache;
pub use cache::TtlCache;
pub use checker::CachedOwnershipChecker;
pub use checker::ownership_cache_key;
pub use checker::spawn_invalidation;
pub use permission::PermissionChecker;
pub use permission::PermissionError;
pub use policy::ReloadablePolicy;
pub use registry::ResourceCheckerRegistry;
