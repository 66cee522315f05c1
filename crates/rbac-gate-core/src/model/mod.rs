// crates/rbac-gate-core/src/model/mod.rs
// ============================================================================
// Module: RBAC Gate Model
// Description: Data model shared by the permission-decision engine.
// Purpose: Group identifiers, decision inputs, and per-request scopes.
// Dependencies: serde, tokio
// ============================================================================

//! ## Overview
//! Canonical data types exchanged between the pipeline, the permission
//! checker, resource checkers, and policy evaluators.

pub mod identifiers;
pub mod input;
pub mod scope;

pub use identifiers::PrincipalId;
pub use input::COLLECTION_RESOURCE_ID;
pub use input::PermissionInput;
pub use input::PolicyInput;
pub use input::ResourceFacts;
pub use input::UserFacts;
pub use scope::DeadlineElapsed;
pub use scope::DecisionScope;
