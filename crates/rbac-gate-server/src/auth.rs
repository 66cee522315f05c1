// crates/rbac-gate-server/src/auth.rs
// ============================================================================
// Module: Gateway Authentication
// Description: Bearer-token authentication for inbound HTTP requests.
// Purpose: Resolve a principal from credentials, failing closed.
// Dependencies: rbac-gate-config, rbac-gate-core, sha2
// ============================================================================

//! ## Overview
//! Authentication turns an `Authorization` header into a [`Principal`]. A
//! request without the header is [`AuthError::MissingCredential`]; anything
//! else that does not resolve to a configured principal is
//! [`AuthError::InvalidCredential`]. Raw tokens never leave this module:
//! callers see only a SHA-256 fingerprint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use rbac_gate_config::AuthConfig;
use rbac_gate_core::PrincipalId;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Principal
// ============================================================================

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// Principal identifier.
    pub id: PrincipalId,
    /// Role label.
    pub role: String,
    /// SHA-256 fingerprint of the presented token.
    #[serde(skip)]
    pub token_fingerprint: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credential")]
    MissingCredential,
    /// The credential was malformed or unknown.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

impl AuthError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential(_) => "invalid_credential",
        }
    }
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Credential resolution interface.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves the `Authorization` header value into a principal.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credential is missing or invalid.
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError>;
}

// ============================================================================
// SECTION: Static Tokens
// ============================================================================

/// Principal entry keyed by token.
#[derive(Clone)]
struct TokenEntry {
    /// Principal identifier.
    id: PrincipalId,
    /// Role label.
    role: String,
}

/// Authenticator backed by the configured token table.
pub struct StaticTokenAuthenticator {
    /// Principals keyed by bearer token.
    principals: BTreeMap<String, TokenEntry>,
}

impl StaticTokenAuthenticator {
    /// Builds the token table from auth configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let principals = config
            .principals
            .iter()
            .map(|principal| {
                (
                    principal.token.clone(),
                    TokenEntry {
                        id: PrincipalId::new(principal.id),
                        role: principal.role.clone(),
                    },
                )
            })
            .collect();
        Self {
            principals,
        }
    }

    /// Returns the number of configured principals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Returns true when no principals are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let token = parse_bearer_token(authorization)?;
        let entry = self
            .principals
            .get(token)
            .ok_or_else(|| AuthError::InvalidCredential("unknown bearer token".to_string()))?;
        Ok(Principal {
            id: entry.id,
            role: entry.role.clone(),
            token_fingerprint: Some(token_fingerprint(token)),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the token from a `Bearer` authorization header.
///
/// # Errors
///
/// Returns [`AuthError::MissingCredential`] when the header is absent and
/// [`AuthError::InvalidCredential`] when it is oversized or malformed.
pub fn parse_bearer_token(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingCredential)?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::InvalidCredential("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidCredential("invalid authorization header".to_string()));
    }
    Ok(token)
}

/// Returns the lowercase hex SHA-256 fingerprint of a token.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
