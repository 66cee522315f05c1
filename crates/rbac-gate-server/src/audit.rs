// crates/rbac-gate-server/src/audit.rs
// ============================================================================
// Module: Decision Audit Logging
// Description: Structured audit events for authorization pipeline outcomes.
// Purpose: Emit redacted decision logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every pipeline outcome produces exactly one [`DecisionAuditEvent`]. Events
//! are serialized as JSON lines so deployments can route them to their
//! preferred logging pipeline. Tokens are never logged; only their
//! fingerprints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pipeline outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Permission granted; request forwarded.
    Admitted,
    /// Exempt route; no checks performed.
    Bypassed,
    /// Request halted with an error status.
    Rejected,
}

/// Decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier.
    pub request_id: String,
    /// Action label in `METHOD:template` form.
    pub action: String,
    /// Resource type.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Principal identifier when authenticated.
    pub principal_id: Option<u64>,
    /// Principal role when authenticated.
    pub role: Option<String>,
    /// Bearer token fingerprint (sha256).
    pub token_fingerprint: Option<String>,
    /// Pipeline outcome.
    pub outcome: DecisionOutcome,
    /// HTTP status applied by the pipeline.
    pub status: u16,
    /// Failure or denial reason label.
    pub reason: Option<&'static str>,
}

/// Inputs required to construct a decision audit event.
pub struct DecisionAuditEventParams {
    /// Request identifier.
    pub request_id: String,
    /// Action label.
    pub action: String,
    /// Resource type.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Principal identifier when authenticated.
    pub principal_id: Option<u64>,
    /// Principal role when authenticated.
    pub role: Option<String>,
    /// Bearer token fingerprint.
    pub token_fingerprint: Option<String>,
    /// Pipeline outcome.
    pub outcome: DecisionOutcome,
    /// HTTP status applied by the pipeline.
    pub status: u16,
    /// Failure or denial reason label.
    pub reason: Option<&'static str>,
}

impl DecisionAuditEvent {
    /// Creates a new decision audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: DecisionAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "authorization_decision",
            timestamp_ms,
            request_id: params.request_id,
            action: params.action,
            resource_type: params.resource_type,
            resource_id: params.resource_id,
            principal_id: params.principal_id,
            role: params.role,
            token_fingerprint: params.token_fingerprint,
            outcome: params.outcome,
            status: params.status,
            reason: params.reason,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for pipeline decisions.
pub trait AuditSink: Send + Sync {
    /// Records a decision audit event.
    fn record(&self, event: &DecisionAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
