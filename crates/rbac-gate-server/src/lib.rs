// crates/rbac-gate-server/src/lib.rs
// ============================================================================
// Module: RBAC Gate Server Library
// Description: HTTP gateway enforcing permission decisions per request.
// Purpose: Expose the pipeline, middleware, audit sinks, and server root.
// Dependencies: rbac-gate-config, rbac-gate-core, axum, tokio
// ============================================================================

//! ## Overview
//! The gateway authenticates each request, classifies it into a permission
//! decision input, and enforces the verdict before any handler runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod middleware;
pub mod pipeline;
pub mod posts;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::DecisionAuditEvent;
pub use audit::DecisionOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AuthError;
pub use auth::Authenticator;
pub use auth::Principal;
pub use auth::StaticTokenAuthenticator;
pub use middleware::authorize_request;
pub use pipeline::AuthorizationPipeline;
pub use pipeline::PipelineOutcome;
pub use pipeline::PipelineRequest;
pub use pipeline::Rejection;
pub use pipeline::RouteExemptions;
pub use posts::PostOwnerSource;
pub use posts::PostService;
pub use posts::PostStore;
pub use server::GatewayServer;
pub use server::ServerError;
