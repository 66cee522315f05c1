// crates/rbac-gate-config/src/lib.rs
// ============================================================================
// Module: RBAC Gate Config Library
// Description: Canonical config model, validation, and policy adapters.
// Purpose: Single source of truth for rbac-gate.toml semantics.
// Dependencies: rbac-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `rbac-gate-config` defines the canonical configuration model for RBAC
//! Gate. It provides strict, fail-closed validation, the rule-based policy
//! evaluators selected by `[policy]`, and a canonical example file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
pub use policy::*;
