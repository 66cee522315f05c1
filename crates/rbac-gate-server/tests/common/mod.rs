// crates/rbac-gate-server/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared gateway fixtures for server integration tests.
// Purpose: Spawn a loopback gateway with a recording audit sink.
// Dependencies: rbac-gate-config, rbac-gate-core, rbac-gate-server, reqwest
// ============================================================================

//! ## Overview
//! [`spawn_gateway`] binds `127.0.0.1:0`, serves the gateway on a background
//! task, and returns handles to the shared cache, posts service, and audit
//! log so tests can observe side effects directly.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use rbac_gate_config::RbacGateConfig;
use rbac_gate_config::config_toml_example;
use rbac_gate_core::DecisionScope;
use rbac_gate_core::OwnershipCache;
use rbac_gate_core::OwnershipError;
use rbac_gate_core::PrincipalId;
use rbac_gate_core::ResourceChecker;
use rbac_gate_core::SourceError;
use rbac_gate_server::AuditSink;
use rbac_gate_server::DecisionAuditEvent;
use rbac_gate_server::GatewayServer;
use rbac_gate_server::PostService;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Tokens
// ============================================================================

/// Token for principal 7 with role `user`.
pub const ALICE: &str = "alice-token";
/// Token for principal 9 with role `user`.
pub const MALLORY: &str = "mallory-token";
/// Token for principal 20 with role `moderator`.
pub const MODERATOR: &str = "mod-token";
/// Token for principal 1 with role `admin`.
pub const ADMIN: &str = "root-token";

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<DecisionAuditEvent>>,
}

impl RecordingAuditSink {
    /// Returns a snapshot of recorded events.
    pub fn events(&self) -> Vec<DecisionAuditEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the most recent event.
    pub fn last(&self) -> DecisionAuditEvent {
        self.events().pop().unwrap()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

// ============================================================================
// SECTION: Checkers
// ============================================================================

/// Checker whose ownership store is always unreachable.
#[derive(Debug, Default)]
pub struct FailingChecker;

#[async_trait]
impl ResourceChecker for FailingChecker {
    async fn check_ownership(
        &self,
        _scope: &DecisionScope,
        _resource_id: &str,
        _principal: PrincipalId,
    ) -> Result<bool, OwnershipError> {
        Err(SourceError::Unavailable("store offline".to_string()).into())
    }
}

/// Checker that never answers before the decision deadline.
#[derive(Debug, Default)]
pub struct StallingChecker;

#[async_trait]
impl ResourceChecker for StallingChecker {
    async fn check_ownership(
        &self,
        scope: &DecisionScope,
        _resource_id: &str,
        _principal: PrincipalId,
    ) -> Result<bool, OwnershipError> {
        scope.run(tokio::time::sleep(Duration::from_secs(30))).await?;
        Ok(true)
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Running gateway bound to a loopback port.
pub struct TestGateway {
    /// Base URL such as `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Shared ownership cache.
    pub cache: Arc<OwnershipCache>,
    /// Posts service backing the routes.
    pub posts: Arc<PostService>,
    /// Recorded audit events.
    pub audit: Arc<RecordingAuditSink>,
    /// HTTP client.
    pub client: Client,
    /// Server task.
    join: JoinHandle<()>,
}

impl TestGateway {
    /// Returns an absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Returns the example configuration.
pub fn example_config() -> RbacGateConfig {
    RbacGateConfig::parse(&config_toml_example()).unwrap()
}

/// Spawns a gateway for the example configuration.
pub async fn spawn_gateway() -> TestGateway {
    spawn_gateway_with(example_config(), |_| {}).await
}

/// Spawns a gateway after letting `customize` adjust the built server.
pub async fn spawn_gateway_with<F>(config: RbacGateConfig, customize: F) -> TestGateway
where
    F: FnOnce(&GatewayServer),
{
    let audit = Arc::new(RecordingAuditSink::default());
    let server = GatewayServer::with_audit_sink(config, Arc::clone(&audit) as Arc<dyn AuditSink>)
        .unwrap();
    customize(&server);
    let cache = Arc::clone(server.cache());
    let posts = Arc::clone(server.posts());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let join = tokio::spawn(async move {
        let _ = server.serve_on(listener).await;
    });
    TestGateway {
        base_url: format!("http://{addr}"),
        cache,
        posts,
        audit,
        client: Client::new(),
        join,
    }
}
