// crates/rbac-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `rbac-gate.toml`. The owner-or-admin rules for posts and
//! the moderator rules mirror the roles `user`, `moderator`, and `admin`.
//!
//! Post reads are listed under `exempt_routes` so anonymous clients can
//! browse. Removing those two entries puts reads behind the same policy as
//! writes.

/// Returns a canonical example `rbac-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576
decision_timeout_ms = 2000
exempt_routes = ["GET:/posts", "GET:/posts/:id"]

[server.audit]
enabled = true

[[auth.principals]]
token = "alice-token"
id = 7
role = "user"

[[auth.principals]]
token = "mallory-token"
id = 9
role = "user"

[[auth.principals]]
token = "mod-token"
id = 20
role = "moderator"

[[auth.principals]]
token = "root-token"
id = 1
role = "admin"

[cache]
ttl_ms = 300000
sweep_interval_ms = 600000

[policy]
engine = "static"

[policy.static]
default = "deny"

[[policy.static.rules]]
effect = "permit"
roles = ["admin"]

[[policy.static.rules]]
effect = "permit"
actions = ["GET:/posts", "POST:/posts", "GET:/posts/:id", "GET:/auth/whoami"]

[[policy.static.rules]]
effect = "permit"
actions = ["PUT:/posts/:id", "DELETE:/posts/:id"]
require_owner = true

[[policy.static.rules]]
effect = "permit"
actions = ["DELETE:/posts/:id"]
roles = ["moderator"]
"#,
    )
}
