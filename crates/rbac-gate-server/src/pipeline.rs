// crates/rbac-gate-server/src/pipeline.rs
// ============================================================================
// Module: Authorization Pipeline
// Description: Authenticate, classify, check, and enforce for one request.
// Purpose: Map every failure to a fixed status and halt, failing closed.
// Dependencies: rbac-gate-core, axum
// ============================================================================

//! ## Overview
//! The pipeline runs strictly in order:
//!
//! 1. Exempt route: bypass authentication and permission checks.
//! 2. Authenticate: missing or invalid credentials reject with 401.
//! 3. Classify the request into a decision input.
//! 4. Check permission: error rejects with 500, deny with 403.
//!
//! Exemptions match by exact equality against the route template or the
//! full `METHOD:template` action, never by prefix. Every outcome emits one
//! audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use rbac_gate_core::COLLECTION_RESOURCE_ID;
use rbac_gate_core::DecisionScope;
use rbac_gate_core::PermissionChecker;
use rbac_gate_core::PermissionInput;

use crate::audit::AuditSink;
use crate::audit::DecisionAuditEvent;
use crate::audit::DecisionAuditEventParams;
use crate::audit::DecisionOutcome;
use crate::auth::AuthError;
use crate::auth::Authenticator;
use crate::auth::Principal;

// ============================================================================
// SECTION: Exemptions
// ============================================================================

/// Exact-match route exemptions.
#[derive(Debug, Clone, Default)]
pub struct RouteExemptions {
    /// Route templates or `METHOD:template` actions.
    routes: BTreeSet<String>,
}

impl RouteExemptions {
    /// Builds exemptions from configured entries.
    #[must_use]
    pub fn from_routes<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true when the template or action is exempt.
    #[must_use]
    pub fn is_exempt(&self, route_template: &str, action: &str) -> bool {
        self.routes.contains(route_template) || self.routes.contains(action)
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Transport-neutral view of an inbound request.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// HTTP method.
    pub method: String,
    /// Request path as received.
    pub path: String,
    /// Matched route template in `:param` form.
    pub route_template: String,
    /// Value of the `id` path parameter, if any.
    pub resource_id: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Request identifier.
    pub request_id: String,
}

impl PipelineRequest {
    /// Returns the action label `METHOD:template`.
    #[must_use]
    pub fn action(&self) -> String {
        format!("{}:{}", self.method, self.route_template)
    }

    /// Returns the first path segment of the request path.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.path.split('/').find(|segment| !segment.is_empty()).unwrap_or_default()
    }

    /// Returns the `id` parameter or the collection sentinel.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_deref().unwrap_or(COLLECTION_RESOURCE_ID)
    }
}

/// Renders an axum route template (`/posts/{id}`) as `/posts/:id`.
#[must_use]
pub fn render_route_template(template: &str) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
            Some(name) => format!(":{}", name.trim_start_matches('*')),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Request halted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Status applied to the response.
    pub status: StatusCode,
    /// Stable reason label.
    pub reason: &'static str,
    /// Client-facing message.
    pub message: &'static str,
}

impl Rejection {
    /// Missing or invalid credential.
    fn unauthenticated(error: &AuthError) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            reason: error.kind(),
            message: match error {
                AuthError::MissingCredential => "missing credential",
                AuthError::InvalidCredential(_) => "invalid credential",
            },
        }
    }

    /// Policy verdict was deny.
    const fn denied() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            reason: "denied",
            message: "permission denied",
        }
    }

    /// Internal failure during the decision.
    const fn internal(reason: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason,
            message: "authorization check failed",
        }
    }
}

/// Pipeline outcome for one request.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Exempt route; no principal resolved.
    Bypassed,
    /// Permission granted.
    Admitted {
        /// Authenticated principal.
        principal: Principal,
        /// Decision input with ownership resolved.
        input: PermissionInput,
    },
    /// Request halted.
    Rejected(Rejection),
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Request-scoped authorization pipeline.
pub struct AuthorizationPipeline {
    /// Exempt routes.
    exemptions: RouteExemptions,
    /// Credential resolution.
    authenticator: Arc<dyn Authenticator>,
    /// Ownership plus policy decision.
    checker: PermissionChecker,
    /// Decision audit sink.
    audit: Arc<dyn AuditSink>,
    /// Per-request decision deadline.
    decision_timeout: Duration,
    /// Counter for generated request identifiers.
    request_counter: AtomicU64,
}

impl AuthorizationPipeline {
    /// Builds a pipeline.
    #[must_use]
    pub fn new(
        exemptions: RouteExemptions,
        authenticator: Arc<dyn Authenticator>,
        checker: PermissionChecker,
        audit: Arc<dyn AuditSink>,
        decision_timeout: Duration,
    ) -> Self {
        Self {
            exemptions,
            authenticator,
            checker,
            audit,
            decision_timeout,
            request_counter: AtomicU64::new(0),
        }
    }

    /// Returns a fresh process-local request identifier.
    pub fn next_request_id(&self) -> String {
        let value = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("req-{value}")
    }

    /// Runs the pipeline for one request.
    pub async fn authorize(&self, request: &PipelineRequest) -> PipelineOutcome {
        let action = request.action();
        let mut audit = DecisionAuditEventParams {
            request_id: request.request_id.clone(),
            action: action.clone(),
            resource_type: request.resource_type().to_string(),
            resource_id: request.resource_id().to_string(),
            principal_id: None,
            role: None,
            token_fingerprint: None,
            outcome: DecisionOutcome::Bypassed,
            status: StatusCode::OK.as_u16(),
            reason: None,
        };

        if self.exemptions.is_exempt(&request.route_template, &action) {
            audit.reason = Some("exempt_route");
            self.audit.record(&DecisionAuditEvent::new(audit));
            return PipelineOutcome::Bypassed;
        }

        let scope = DecisionScope::new()
            .with_request_id(request.request_id.clone())
            .with_timeout(self.decision_timeout);
        let outcome = self.decide(&scope, request, action, &mut audit).await;
        match &outcome {
            PipelineOutcome::Admitted {
                ..
            } => audit.outcome = DecisionOutcome::Admitted,
            PipelineOutcome::Rejected(rejection) => {
                audit.outcome = DecisionOutcome::Rejected;
                audit.status = rejection.status.as_u16();
                audit.reason = Some(rejection.reason);
            }
            PipelineOutcome::Bypassed => {}
        }
        self.audit.record(&DecisionAuditEvent::new(audit));
        outcome
    }

    /// Authenticates and checks permission for a non-exempt request.
    async fn decide(
        &self,
        scope: &DecisionScope,
        request: &PipelineRequest,
        action: String,
        audit: &mut DecisionAuditEventParams,
    ) -> PipelineOutcome {
        let authenticated =
            scope.run(self.authenticator.authenticate(request.authorization.as_deref())).await;
        let principal = match authenticated {
            Ok(Ok(principal)) => principal,
            Ok(Err(error)) => return PipelineOutcome::Rejected(Rejection::unauthenticated(&error)),
            Err(_) => return PipelineOutcome::Rejected(Rejection::internal("cancelled")),
        };
        audit.principal_id = Some(principal.id.get());
        audit.role = Some(principal.role.clone());
        audit.token_fingerprint.clone_from(&principal.token_fingerprint);

        let mut input = PermissionInput::new(
            action,
            request.resource_type(),
            request.resource_id(),
            principal.id,
            principal.role.clone(),
        );
        match self.checker.check_permission(scope, &mut input).await {
            Ok(true) => PipelineOutcome::Admitted {
                principal,
                input,
            },
            Ok(false) => PipelineOutcome::Rejected(Rejection::denied()),
            Err(error) => PipelineOutcome::Rejected(Rejection::internal(error.kind())),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, template: &str, id: Option<&str>) -> PipelineRequest {
        PipelineRequest {
            method: "PUT".to_string(),
            path: path.to_string(),
            route_template: template.to_string(),
            resource_id: id.map(str::to_string),
            authorization: None,
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn renders_axum_captures_as_colon_params() {
        assert_eq!(render_route_template("/posts/{id}"), "/posts/:id");
        assert_eq!(render_route_template("/files/{*rest}"), "/files/:rest");
        assert_eq!(render_route_template("/posts"), "/posts");
    }

    #[test]
    fn classifies_type_and_id() {
        let classified = request("/posts/42", "/posts/:id", Some("42"));
        assert_eq!(classified.action(), "PUT:/posts/:id");
        assert_eq!(classified.resource_type(), "posts");
        assert_eq!(classified.resource_id(), "42");

        let collection = request("/posts", "/posts", None);
        assert_eq!(collection.resource_id(), COLLECTION_RESOURCE_ID);
    }

    #[test]
    fn exemptions_match_exactly() {
        let exemptions = RouteExemptions::from_routes(["GET:/posts", "/health"]);
        assert!(exemptions.is_exempt("/posts", "GET:/posts"));
        assert!(!exemptions.is_exempt("/posts", "POST:/posts"));
        assert!(!exemptions.is_exempt("/posts/:id", "GET:/posts/:id"));
        assert!(exemptions.is_exempt("/health", "POST:/health"));
    }
}
