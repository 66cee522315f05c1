//! Rule-based policy tests for rbac-gate-config.
// crates/rbac-gate-config/tests/policy_rules.rs
// =============================================================================
// Module: Policy Rule Tests
// Description: Ordered static rules, ownership criteria, and fail-closed errors.
// Purpose: Ensure configured policies decide permission inputs deterministically.
// =============================================================================

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use rbac_gate_config::RulePolicy;
use rbac_gate_config::config_toml_example;
use rbac_gate_core::EvaluationError;
use rbac_gate_core::PolicyEvaluator;
use rbac_gate_core::PolicyInput;
use serde_json::json;

mod common;

use common::assert_invalid;
use common::document;
use common::parse;

type TestResult = Result<(), String>;

fn example_policy() -> RulePolicy {
    parse(&config_toml_example()).unwrap().policy.build_policy().unwrap()
}

#[test]
fn owner_may_update_own_post() {
    let policy = example_policy();
    let input = document("PUT:/posts/:id", "posts", "42", Some(true), 7, "user");
    assert!(policy.evaluate(&input).unwrap());
}

#[test]
fn non_owner_user_is_denied() {
    let policy = example_policy();
    let input = document("PUT:/posts/:id", "posts", "42", Some(false), 9, "user");
    assert!(!policy.evaluate(&input).unwrap());
}

#[test]
fn missing_ownership_fact_does_not_satisfy_require_owner() {
    let policy = example_policy();
    let input = document("PUT:/posts/:id", "posts", "42", None, 7, "user");
    assert!(!policy.evaluate(&input).unwrap());
}

#[test]
fn admin_may_do_anything() {
    let policy = example_policy();
    let input = document("DELETE:/posts/:id", "posts", "42", Some(false), 1, "admin");
    assert!(policy.evaluate(&input).unwrap());
}

#[test]
fn moderator_may_delete_but_not_update() {
    let policy = example_policy();
    let delete = document("DELETE:/posts/:id", "posts", "42", Some(false), 20, "moderator");
    let update = document("PUT:/posts/:id", "posts", "42", Some(false), 20, "moderator");
    assert!(policy.evaluate(&delete).unwrap());
    assert!(!policy.evaluate(&update).unwrap());
}

#[test]
fn role_only_rule_decides_unowned_resource_type() {
    let config = parse(
        r#"
[policy]
engine = "static"

[policy.static]
default = "deny"

[[policy.static.rules]]
effect = "permit"
actions = ["DELETE:/comments/:id"]
roles = ["moderator", "admin"]
"#,
    )
    .unwrap();
    let policy = config.policy.build_policy().unwrap();
    let moderator = document("DELETE:/comments/:id", "comments", "3", None, 20, "moderator");
    let user = document("DELETE:/comments/:id", "comments", "3", None, 7, "user");
    assert!(policy.evaluate(&moderator).unwrap());
    assert!(!policy.evaluate(&user).unwrap());
}

#[test]
fn first_matching_rule_wins() {
    let config = parse(
        r#"
[policy]
engine = "static"

[policy.static]
default = "permit"

[[policy.static.rules]]
effect = "deny"
users = [9]

[[policy.static.rules]]
effect = "permit"
roles = ["user"]
"#,
    )
    .unwrap();
    let policy = config.policy.build_policy().unwrap();
    assert!(!policy.evaluate(&document("GET:/posts", "posts", "0", None, 9, "user")).unwrap());
    assert!(policy.evaluate(&document("GET:/posts", "posts", "0", None, 7, "user")).unwrap());
}

#[test]
fn resource_id_criterion_matches_exactly() {
    let config = parse(
        r#"
[policy]
engine = "static"

[policy.static]
default = "deny"

[[policy.static.rules]]
effect = "permit"
resource_types = ["posts"]
resource_ids = ["42"]
"#,
    )
    .unwrap();
    let policy = config.policy.build_policy().unwrap();
    assert!(policy.evaluate(&document("GET:/posts/:id", "posts", "42", None, 7, "user")).unwrap());
    let other = document("GET:/posts/:id", "posts", "420", None, 7, "user");
    assert!(!policy.evaluate(&other).unwrap());
}

#[test]
fn error_effect_fails_evaluation() {
    let config = parse(
        r#"
[policy]
engine = "static"

[policy.static]
default = "permit"

[[policy.static.rules]]
effect = "error"
error_message = "legacy route"
actions = ["GET:/legacy"]
"#,
    )
    .unwrap();
    let policy = config.policy.build_policy().unwrap();
    let input = document("GET:/legacy", "legacy", "0", None, 7, "user");
    let err = policy.evaluate(&input).unwrap_err();
    assert_eq!(err, EvaluationError::Failed("legacy route".to_string()));
}

#[test]
fn malformed_document_is_an_error_not_a_deny() {
    let malformed = PolicyInput::from_value(json!({ "action": "GET:/posts" }));
    for policy in [RulePolicy::PermitAll, RulePolicy::DenyAll, example_policy()] {
        let err = policy.evaluate(&malformed).unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidInput(_)));
    }
}

#[test]
fn constant_engines_ignore_facts() {
    let input = document("DELETE:/posts/:id", "posts", "1", Some(false), 9, "user");
    assert!(RulePolicy::PermitAll.evaluate(&input).unwrap());
    assert!(!RulePolicy::DenyAll.evaluate(&input).unwrap());
}

#[test]
fn rule_without_criteria_is_rejected() -> TestResult {
    assert_invalid(
        "[policy]\nengine = \"static\"\n[policy.static]\n[[policy.static.rules]]\n\
         effect = \"permit\"\n",
        "at least one match criterion",
    )
}

#[test]
fn error_rule_requires_message() -> TestResult {
    assert_invalid(
        "[policy]\nengine = \"static\"\n[policy.static]\n[[policy.static.rules]]\n\
         effect = \"error\"\nroles = [\"user\"]\n",
        "requires error_message",
    )
}

#[test]
fn error_default_is_rejected() -> TestResult {
    assert_invalid(
        "[policy]\nengine = \"static\"\n[policy.static]\ndefault = \"error\"\n",
        "must be permit or deny",
    )
}

#[test]
fn malformed_action_label_is_rejected() -> TestResult {
    assert_invalid(
        "[policy]\nengine = \"static\"\n[policy.static]\n[[policy.static.rules]]\n\
         effect = \"permit\"\nactions = [\"posts\"]\n",
        "invalid action label",
    )
}
