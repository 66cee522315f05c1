// crates/rbac-gate-config/src/config.rs
// ============================================================================
// Module: RBAC Gate Configuration
// Description: Configuration loading and validation for RBAC Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: rbac-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: the gateway never starts
//! with a partially understood policy or principal table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::policy::PolicyEngine;
use crate::policy::RulePolicy;
use crate::policy::StaticPolicyConfig;
use crate::policy::is_action_label;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "rbac-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RBAC_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured principals.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a bearer token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Maximum number of exempt route entries.
pub(crate) const MAX_EXEMPT_ROUTES: usize = 128;
/// Minimum decision deadline in milliseconds.
pub(crate) const MIN_DECISION_TIMEOUT_MS: u64 = 100;
/// Maximum decision deadline in milliseconds.
pub(crate) const MAX_DECISION_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// RBAC Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RbacGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer-token principal table.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Ownership cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Permission policy configuration.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl RbacGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then `RBAC_GATE_CONFIG`, then
    /// `rbac-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.cache.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Per-request decision deadline in milliseconds.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,
    /// Routes admitted without authentication or permission checks.
    #[serde(default)]
    pub exempt_routes: Vec<String>,
    /// Decision audit configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            decision_timeout_ms: default_decision_timeout_ms(),
            exempt_routes: Vec::new(),
            audit: AuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Returns the per-request decision deadline.
    #[must_use]
    pub const fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if !(MIN_DECISION_TIMEOUT_MS ..= MAX_DECISION_TIMEOUT_MS)
            .contains(&self.decision_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "decision_timeout_ms must be between {MIN_DECISION_TIMEOUT_MS} and \
                 {MAX_DECISION_TIMEOUT_MS}"
            )));
        }
        if self.exempt_routes.len() > MAX_EXEMPT_ROUTES {
            return Err(ConfigError::Invalid("too many exempt routes".to_string()));
        }
        for route in &self.exempt_routes {
            if !route.starts_with('/') && !is_action_label(route) {
                return Err(ConfigError::Invalid(format!(
                    "exempt route must be a route template or METHOD:template: {route}"
                )));
            }
        }
        self.audit.validate()
    }
}

/// Decision audit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Emit one JSON line per pipeline outcome.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// Bearer-token principal table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Principals keyed by bearer token.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

impl AuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.principals.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid("too many auth principals".to_string()));
        }
        let mut seen = BTreeSet::new();
        for principal in &self.principals {
            principal.validate()?;
            if !seen.insert(principal.token.as_str()) {
                return Err(ConfigError::Invalid("duplicate auth token".to_string()));
            }
        }
        Ok(())
    }
}

/// Bearer token mapped to a principal.
#[derive(Clone, Deserialize)]
pub struct PrincipalConfig {
    /// Bearer token presented by the principal.
    pub token: String,
    /// Principal identifier.
    pub id: u64,
    /// Principal role label.
    pub role: String,
}

impl std::fmt::Debug for PrincipalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalConfig")
            .field("token", &"<redacted>")
            .field("id", &self.id)
            .field("role", &self.role)
            .finish()
    }
}

impl PrincipalConfig {
    /// Validates principal configuration constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
        }
        if self.token.len() > MAX_AUTH_TOKEN_LENGTH {
            return Err(ConfigError::Invalid("auth token too long".to_string()));
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("auth token must not contain whitespace".to_string()));
        }
        if self.id == 0 {
            return Err(ConfigError::Invalid("auth.principals.id must be positive".to_string()));
        }
        if self.role.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.principals.role must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Ownership cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of an ownership entry in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    /// Interval between background eviction sweeps in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl CacheConfig {
    /// Returns the ownership entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Returns the sweep interval.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Validates cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_ms == 0 {
            return Err(ConfigError::Invalid("cache.ttl_ms must be greater than zero".to_string()));
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.sweep_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Policy engine configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PolicyConfig {
    /// Policy engine selection.
    #[serde(default)]
    pub engine: PolicyEngine,
    /// Static policy configuration.
    #[serde(default, rename = "static")]
    pub static_policy: Option<StaticPolicyConfig>,
}

impl PolicyConfig {
    /// Validates policy configuration for internal consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.engine {
            PolicyEngine::Static => {
                let Some(static_policy) = &self.static_policy else {
                    return Err(ConfigError::Invalid(
                        "policy.engine=static requires policy.static".to_string(),
                    ));
                };
                static_policy.validate().map_err(ConfigError::Invalid)?;
            }
            PolicyEngine::PermitAll | PolicyEngine::DenyAll => {
                if self.static_policy.is_some() {
                    return Err(ConfigError::Invalid(
                        "policy.static only allowed when engine=static".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Builds the runtime policy evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is missing static policy data.
    pub fn build_policy(&self) -> Result<RulePolicy, ConfigError> {
        match self.engine {
            PolicyEngine::PermitAll => Ok(RulePolicy::PermitAll),
            PolicyEngine::DenyAll => Ok(RulePolicy::DenyAll),
            PolicyEngine::Static => {
                let static_policy = self.static_policy.clone().ok_or_else(|| {
                    ConfigError::Invalid("policy.static is required for static engine".to_string())
                })?;
                Ok(RulePolicy::Static(static_policy))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default maximum request body size in bytes.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default decision deadline in milliseconds.
pub(crate) const fn default_decision_timeout_ms() -> u64 {
    2_000
}

/// Default audit toggle.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}

/// Default ownership entry lifetime in milliseconds.
pub(crate) const fn default_cache_ttl_ms() -> u64 {
    5 * 60 * 1_000
}

/// Default sweep interval in milliseconds.
pub(crate) const fn default_sweep_interval_ms() -> u64 {
    10 * 60 * 1_000
}

// ============================================================================
// SECTION: Tests
// ============================================================================
