// crates/rbac-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and offline policy evaluation.
// Purpose: Ensure bounded reads and policy eval fail closed on bad inputs.
// Dependencies: rbac-gate-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Covers `policy eval` verdicts against the example configuration, bounded
//! input reads, and the command-line surface.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use rbac_gate_config::RbacGateConfig;
use rbac_gate_config::config_toml_example;
use serde_json::json;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::PolicyCommand;
use super::ReadLimitError;
use super::config_summary;
use super::evaluate_input_file;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes the example config into `dir` and loads it.
fn example_config(dir: &TempDir) -> RbacGateConfig {
    let path = dir.path().join("rbac-gate.toml");
    fs::write(&path, config_toml_example()).unwrap();
    RbacGateConfig::load(Some(&path)).unwrap()
}

/// Writes a decision input file and returns its path.
fn write_input(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn policy_eval_reports_owner_and_non_owner_verdicts() {
    let dir = tempfile::tempdir().unwrap();
    let config = example_config(&dir);
    let owner = write_input(
        dir.path(),
        "owner.json",
        &json!({
            "action": "PUT:/posts/:id",
            "resource": { "type": "posts", "id": "42", "is_owner": true },
            "user": { "id": 7, "role": "user" }
        }),
    );
    let stranger = write_input(
        dir.path(),
        "stranger.json",
        &json!({
            "action": "PUT:/posts/:id",
            "resource": { "type": "posts", "id": "42", "is_owner": false },
            "user": { "id": 9, "role": "user" }
        }),
    );
    assert!(evaluate_input_file(&config, &owner).unwrap());
    assert!(!evaluate_input_file(&config, &stranger).unwrap());
}

#[test]
fn policy_eval_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = example_config(&dir);
    let missing_user = write_input(
        dir.path(),
        "bad.json",
        &json!({ "action": "GET:/posts", "resource": { "type": "posts", "id": "0" } }),
    );
    let err = evaluate_input_file(&config, &missing_user).unwrap_err();
    assert!(err.to_string().contains("policy evaluation failed"));

    let not_json = dir.path().join("junk.json");
    fs::write(&not_json, b"{ nope").unwrap();
    let err = evaluate_input_file(&config, &not_json).unwrap_err();
    assert!(err.to_string().contains("invalid decision input json"));
}

#[test]
fn read_bytes_with_limit_rejects_oversized_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.json");
    fs::write(&path, vec![b' '; 32]).unwrap();

    assert_eq!(read_bytes_with_limit(&path, 32).unwrap().len(), 32);
    match read_bytes_with_limit(&path, 31) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 32);
            assert_eq!(limit, 31);
        }
        other => panic!("expected size rejection, got {other:?}"),
    }
    assert!(matches!(
        read_bytes_with_limit(&dir.path().join("absent.json"), 32),
        Err(ReadLimitError::Io(_))
    ));
}

#[test]
fn config_summary_names_engine_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let summary = config_summary(&example_config(&dir));
    assert!(summary[0].starts_with("config ok: "));
    assert!(summary.contains(&"principals: 4".to_string()));
    assert!(summary.contains(&"exempt routes: 2".to_string()));
    assert!(summary.contains(&"policy engine: static (4 rules)".to_string()));
}

#[test]
fn parses_nested_subcommands() {
    let cli = Cli::try_parse_from([
        "rbac-gate",
        "policy",
        "eval",
        "--input",
        "decision.json",
        "--config",
        "gate.toml",
    ])
    .unwrap();
    let Commands::Policy {
        command: PolicyCommand::Eval(command),
    } = cli.command
    else {
        panic!("expected policy eval");
    };
    assert_eq!(command.input, PathBuf::from("decision.json"));
    assert_eq!(command.config.config, Some(PathBuf::from("gate.toml")));

    let cli = Cli::try_parse_from(["rbac-gate", "config", "check"]).unwrap();
    assert!(matches!(cli.command, Commands::Config {
        command: ConfigCommand::Check(_)
    }));

    assert!(Cli::try_parse_from(["rbac-gate", "policy", "eval"]).is_err());
}
