// crates/rbac-gate-config/src/policy.rs
// ============================================================================
// Module: Policy Engine Adapters
// Description: Deterministic rule-based policy evaluators.
// Purpose: Provide swappable, fail-closed permission policies from config.
// Dependencies: rbac-gate-core, serde
// ============================================================================

//! ## Overview
//! Policy engine adapters that decide permission requests from the structured
//! decision input. The document handed to the evaluator is untrusted: it is
//! decoded back into a typed [`PermissionInput`] and a malformed document is
//! an evaluation error, never a deny.
//!
//! Static rules are evaluated in order and the first matching rule's effect
//! wins. Within a rule, each non-empty criterion must match; empty lists act
//! as wildcards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rbac_gate_core::EvaluationError;
use rbac_gate_core::PermissionInput;
use rbac_gate_core::PolicyEvaluator;
use rbac_gate_core::PolicyInput;
use rbac_gate_core::PrincipalId;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Policy Model
// ============================================================================

/// Policy engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEngine {
    /// Permit every request.
    PermitAll,
    /// Deny every request.
    #[default]
    DenyAll,
    /// Evaluate ordered static rules.
    Static,
}

/// Static policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticPolicyConfig {
    /// Decision when no rule matches.
    #[serde(default = "default_static_effect")]
    pub default: PolicyEffect,
    /// Ordered list of policy rules.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Default for StaticPolicyConfig {
    fn default() -> Self {
        Self {
            default: default_static_effect(),
            rules: Vec::new(),
        }
    }
}

impl StaticPolicyConfig {
    /// Validates static policy configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when defaults or rules are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.default == PolicyEffect::Error {
            return Err("static policy default must be permit or deny".to_string());
        }
        for (idx, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|err| format!("policy.static.rules[{idx}]: {err}"))?;
        }
        Ok(())
    }

    /// Evaluates the rules against a decoded decision input.
    fn evaluate(&self, input: &PermissionInput) -> Result<bool, EvaluationError> {
        for rule in &self.rules {
            if rule.matches(input) {
                return rule.effect.to_verdict(rule.error_message.as_deref());
            }
        }
        self.default.to_verdict(None)
    }
}

/// Policy rule effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    /// Allow the request.
    Permit,
    /// Deny the request.
    Deny,
    /// Raise a policy evaluation error.
    Error,
}

impl PolicyEffect {
    /// Converts the effect into a verdict.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Failed`] when the effect is `error`.
    fn to_verdict(self, error_message: Option<&str>) -> Result<bool, EvaluationError> {
        match self {
            Self::Permit => Ok(true),
            Self::Deny => Ok(false),
            Self::Error => Err(EvaluationError::Failed(
                error_message.unwrap_or("policy rule error").to_string(),
            )),
        }
    }
}

/// Policy rule for static evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRule {
    /// Effect to apply when the rule matches.
    pub effect: PolicyEffect,
    /// Error message when effect is `error`.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Actions in `METHOD:route-template` form.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Resource types.
    #[serde(default)]
    pub resource_types: Vec<String>,
    /// Resource identifiers.
    #[serde(default)]
    pub resource_ids: Vec<String>,
    /// Principal roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Principal identifiers.
    #[serde(default)]
    pub users: Vec<PrincipalId>,
    /// Require a resolved ownership fact that is true.
    #[serde(default)]
    pub require_owner: bool,
}

impl PolicyRule {
    /// Validates rule configuration for internal consistency.
    fn validate(&self) -> Result<(), String> {
        let has_selector = !self.actions.is_empty()
            || !self.resource_types.is_empty()
            || !self.resource_ids.is_empty()
            || !self.roles.is_empty()
            || !self.users.is_empty()
            || self.require_owner;
        if !has_selector {
            return Err("rule must include at least one match criterion".to_string());
        }
        if self.effect == PolicyEffect::Error
            && self.error_message.as_deref().unwrap_or("").is_empty()
        {
            return Err("error effect requires error_message".to_string());
        }
        for action in &self.actions {
            if !is_action_label(action) {
                return Err(format!("invalid action label: {action}"));
            }
        }
        if self.resource_types.iter().chain(&self.roles).any(|value| value.trim().is_empty()) {
            return Err("resource_types and roles must be non-empty".to_string());
        }
        Ok(())
    }

    /// Returns true when every configured criterion matches the input.
    fn matches(&self, input: &PermissionInput) -> bool {
        if !self.actions.is_empty() && !self.actions.iter().any(|action| action == &input.action)
        {
            return false;
        }
        if !self.resource_types.is_empty()
            && !self
                .resource_types
                .iter()
                .any(|resource_type| resource_type == &input.resource.resource_type)
        {
            return false;
        }
        if !self.resource_ids.is_empty()
            && !self.resource_ids.iter().any(|resource_id| resource_id == &input.resource.id)
        {
            return false;
        }
        if !self.roles.is_empty() && !self.roles.iter().any(|role| role == &input.user.role) {
            return false;
        }
        if !self.users.is_empty() && !self.users.contains(&input.user.id) {
            return false;
        }
        if self.require_owner && input.resource.is_owner != Some(true) {
            return false;
        }
        true
    }
}

/// Returns true for labels of the form `METHOD:/path`.
pub(crate) fn is_action_label(value: &str) -> bool {
    value.split_once(':').is_some_and(|(method, path)| {
        !method.is_empty()
            && method.bytes().all(|byte| byte.is_ascii_uppercase())
            && path.starts_with('/')
    })
}

/// Returns the default static policy effect.
const fn default_static_effect() -> PolicyEffect {
    PolicyEffect::Deny
}

// ============================================================================
// SECTION: Evaluator Adapter
// ============================================================================

/// Runtime policy evaluator built from configuration.
#[derive(Debug, Clone)]
pub enum RulePolicy {
    /// Permit every request.
    PermitAll,
    /// Deny every request.
    DenyAll,
    /// Static rule evaluation.
    Static(StaticPolicyConfig),
}

impl PolicyEvaluator for RulePolicy {
    fn evaluate(&self, input: &PolicyInput) -> Result<bool, EvaluationError> {
        let decoded: PermissionInput = input.decode()?;
        match self {
            Self::PermitAll => Ok(true),
            Self::DenyAll => Ok(false),
            Self::Static(policy) => policy.evaluate(&decoded),
        }
    }
}
