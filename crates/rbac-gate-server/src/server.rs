// crates/rbac-gate-server/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: Composition root and HTTP surface for RBAC Gate.
// Purpose: Wire cache, checkers, policy, and pipeline behind axum routes.
// Dependencies: rbac-gate-config, rbac-gate-core, axum, tokio
// ============================================================================

//! ## Overview
//! [`GatewayServer::from_config`] builds exactly one ownership cache, one
//! checker registry, one authenticator, and one reloadable policy, and
//! registers the `posts` ownership checker. Every route sits behind the
//! authorization middleware.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::FromRef;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use rbac_gate_config::PolicyEngine;
use rbac_gate_config::RbacGateConfig;
use rbac_gate_core::CachedOwnershipChecker;
use rbac_gate_core::OwnershipCache;
use rbac_gate_core::PermissionChecker;
use rbac_gate_core::PolicyEvaluator;
use rbac_gate_core::ReloadablePolicy;
use rbac_gate_core::ResourceChecker;
use rbac_gate_core::ResourceCheckerRegistry;
use serde_json::json;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::Authenticator;
use crate::auth::Principal;
use crate::auth::StaticTokenAuthenticator;
use crate::middleware::authorize_request;
use crate::middleware::error_response;
use crate::pipeline::AuthorizationPipeline;
use crate::pipeline::RouteExemptions;
use crate::posts::POSTS_RESOURCE_TYPE;
use crate::posts::PostOwnerSource;
use crate::posts::PostService;
use crate::posts::PostStore;
use crate::posts::create_post;
use crate::posts::delete_post;
use crate::posts::get_post;
use crate::posts::list_posts;
use crate::posts::update_post;

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// RBAC Gate HTTP server.
pub struct GatewayServer {
    /// Validated configuration.
    config: RbacGateConfig,
    /// Process-wide ownership cache.
    cache: Arc<OwnershipCache>,
    /// Resource checkers keyed by type.
    registry: Arc<ResourceCheckerRegistry>,
    /// Active policy evaluator.
    policy: Arc<ReloadablePolicy>,
    /// Authorization pipeline shared by all routes.
    pipeline: Arc<AuthorizationPipeline>,
    /// Posts mutation path.
    posts: Arc<PostService>,
}

impl GatewayServer {
    /// Builds a server from configuration with the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: RbacGateConfig) -> Result<Self, ServerError> {
        let audit = build_audit_sink(&config)?;
        Self::with_audit_sink(config, audit)
    }

    /// Builds a server from configuration with an explicit audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn with_audit_sink(
        config: RbacGateConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let rules =
            config.policy.build_policy().map_err(|err| ServerError::Config(err.to_string()))?;
        let policy = Arc::new(ReloadablePolicy::new(Arc::new(rules)));

        let cache = Arc::new(OwnershipCache::new(config.cache.ttl()));
        let registry = Arc::new(ResourceCheckerRegistry::new());
        let store = Arc::new(PostStore::new());
        registry.register(
            POSTS_RESOURCE_TYPE,
            Arc::new(CachedOwnershipChecker::new(
                POSTS_RESOURCE_TYPE,
                PostOwnerSource::new(Arc::clone(&store)),
                Arc::clone(&cache),
            )),
        );
        let posts = Arc::new(PostService::new(store, Arc::clone(&cache)));

        let authenticator = StaticTokenAuthenticator::from_config(&config.auth);
        emit_startup_warnings(&config, &authenticator);
        let authenticator: Arc<dyn Authenticator> = Arc::new(authenticator);
        let evaluator: Arc<dyn PolicyEvaluator> = policy.clone();
        let checker = PermissionChecker::new(Arc::clone(&registry), evaluator);
        let pipeline = Arc::new(AuthorizationPipeline::new(
            RouteExemptions::from_routes(config.server.exempt_routes.iter().cloned()),
            authenticator,
            checker,
            audit,
            config.server.decision_timeout(),
        ));

        Ok(Self {
            config,
            cache,
            registry,
            policy,
            pipeline,
            posts,
        })
    }

    /// Registers an additional resource checker.
    pub fn register_checker(
        &self,
        resource_type: impl Into<String>,
        checker: Arc<dyn ResourceChecker>,
    ) -> Option<Arc<dyn ResourceChecker>> {
        self.registry.register(resource_type, checker)
    }

    /// Returns the shared ownership cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<OwnershipCache> {
        &self.cache
    }

    /// Returns the reloadable policy handle.
    #[must_use]
    pub const fn policy(&self) -> &Arc<ReloadablePolicy> {
        &self.policy
    }

    /// Returns the posts service.
    #[must_use]
    pub const fn posts(&self) -> &Arc<PostService> {
        &self.posts
    }

    /// Builds the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState {
            posts: Arc::clone(&self.posts),
            policy: Arc::clone(&self.policy),
            config_path: self.config.source_path.clone(),
        };
        Router::new()
            .route("/posts", get(list_posts).post(create_post))
            .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
            .route("/auth/whoami", get(whoami))
            .route("/admin/policy/reload", post(reload_policy))
            .route_layer(middleware::from_fn_with_state(
                Arc::clone(&self.pipeline),
                authorize_request,
            ))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes))
            .with_state(state)
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let sweeper = self.cache.spawn_sweeper(self.config.cache.sweep_interval());
        let app = self.router();
        let result = axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()));
        sweeper.abort();
        result
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    /// Posts mutation path.
    posts: Arc<PostService>,
    /// Active policy evaluator.
    policy: Arc<ReloadablePolicy>,
    /// Config file backing policy reloads.
    config_path: Option<PathBuf>,
}

impl FromRef<AppState> for Arc<PostService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.posts)
    }
}

/// `GET /auth/whoami`
async fn whoami(principal: Option<Extension<Principal>>) -> Response {
    match principal {
        Some(Extension(principal)) => Json(principal).into_response(),
        None => error_response(StatusCode::UNAUTHORIZED, "missing credential"),
    }
}

/// `POST /admin/policy/reload`
///
/// Re-reads and validates the whole config file but applies only its
/// `[policy]` section. Principals, exempt routes, and server settings keep
/// their startup values until restart.
async fn reload_policy(State(state): State<AppState>) -> Response {
    let Some(path) = state.config_path else {
        return error_response(StatusCode::CONFLICT, "no config file to reload");
    };
    let loaded = tokio::task::spawn_blocking(move || load_policy(&path)).await;
    match loaded {
        Ok(Ok((engine, policy))) => {
            state.policy.swap(Arc::new(policy));
            Json(json!({
                "status": "reloaded",
                "engine": engine,
                "applied": ["policy"],
                "restart_required_for": ["auth", "cache", "server"],
            }))
            .into_response()
        }
        Ok(Err(err)) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "policy reload failed"),
    }
}

/// Reads the config file and builds its policy.
fn load_policy(
    path: &Path,
) -> Result<(PolicyEngine, rbac_gate_config::RulePolicy), rbac_gate_config::ConfigError> {
    let config = RbacGateConfig::load(Some(path))?;
    let policy = config.policy.build_policy()?;
    Ok((config.policy.engine, policy))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &RbacGateConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    let audit = &config.server.audit;
    if !audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &audit.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Returns warnings for risky configuration.
fn startup_warnings(
    config: &RbacGateConfig,
    authenticator: &StaticTokenAuthenticator,
) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if authenticator.is_empty() {
        warnings.push(
            "no auth principals configured; every non-exempt request will be rejected with 401",
        );
    }
    if config.policy.engine == PolicyEngine::PermitAll {
        warnings.push("policy.engine=permit_all admits every authenticated request");
    }
    if config.server.bind_addr().is_ok_and(|addr| !addr.ip().is_loopback()) {
        warnings.push("listening on a non-loopback address without TLS");
    }
    warnings
}

/// Writes startup warnings to stderr.
fn emit_startup_warnings(config: &RbacGateConfig, authenticator: &StaticTokenAuthenticator) {
    let mut stderr = io::stderr();
    for warning in startup_warnings(config, authenticator) {
        let _ = writeln!(stderr, "rbac-gate: WARNING: {warning}");
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
