// crates/rbac-gate-core/src/lib.rs
// ============================================================================
// Module: RBAC Gate Core Library
// Description: Public API surface for the permission-decision engine.
// Purpose: Expose decision inputs, interfaces, and runtime components.
// Dependencies: crate::{model, interfaces, runtime}
// ============================================================================

//! ## Overview
//! RBAC Gate core decides whether a principal may perform an action on a
//! resource. It resolves resource ownership through pluggable checkers backed
//! by a time-bounded cache, assembles a declarative decision input, and hands
//! it to an opaque policy evaluator. Every error path fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod model;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::*;

pub use interfaces::EvaluationError;
pub use interfaces::OwnerSource;
pub use interfaces::OwnershipError;
pub use interfaces::PolicyEvaluator;
pub use interfaces::ResourceChecker;
pub use interfaces::SourceError;
pub use runtime::CachedOwnershipChecker;
pub use runtime::DEFAULT_OWNERSHIP_TTL;
pub use runtime::DEFAULT_SWEEP_INTERVAL;
pub use runtime::OwnershipCache;
pub use runtime::PermissionChecker;
pub use runtime::PermissionError;
pub use runtime::ReloadablePolicy;
pub use runtime::ResourceCheckerRegistry;
pub use runtime::TtlCache;
pub use runtime::ownership_cache_key;
pub use runtime::spawn_invalidation;
