// crates/rbac-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for rbac-gate-config.
// =============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    reason = "Test helpers are selectively used across suites."
)]

use rbac_gate_config::ConfigError;
use rbac_gate_config::RbacGateConfig;
use rbac_gate_core::PermissionInput;
use rbac_gate_core::PolicyInput;
use rbac_gate_core::PrincipalId;

/// Parses and validates a TOML string.
pub fn parse(toml_str: &str) -> Result<RbacGateConfig, ConfigError> {
    RbacGateConfig::parse(toml_str)
}

/// Asserts that parsing fails with an invalid-config error containing `needle`.
pub fn assert_invalid(toml_str: &str, needle: &str) -> Result<(), String> {
    match parse(toml_str) {
        Err(ConfigError::Invalid(message)) if message.contains(needle) => Ok(()),
        Err(other) => Err(format!("expected invalid config containing {needle:?}, got {other}")),
        Ok(_) => Err(format!("expected invalid config containing {needle:?}, got success")),
    }
}

/// Builds a serialized decision input.
pub fn document(
    action: &str,
    resource_type: &str,
    resource_id: &str,
    is_owner: Option<bool>,
    user: u64,
    role: &str,
) -> PolicyInput {
    let mut input =
        PermissionInput::new(action, resource_type, resource_id, PrincipalId::new(user), role);
    input.resource.is_owner = is_owner;
    input.to_policy_input().unwrap()
}
