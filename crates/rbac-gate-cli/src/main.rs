// crates/rbac-gate-cli/src/main.rs
// ============================================================================
// Module: RBAC Gate CLI Entry Point
// Description: Command dispatcher for serving and offline policy checks.
// Purpose: Run the gateway, validate configuration, and evaluate decisions.
// Dependencies: clap, rbac-gate-config, rbac-gate-core, rbac-gate-server, tokio
// ============================================================================

//! ## Overview
//! `rbac-gate serve` runs the HTTP gateway. `rbac-gate config check` loads
//! and validates a configuration file. `rbac-gate policy eval` evaluates the
//! configured policy against a permission decision input read from disk and
//! prints the verdict; a deny verdict is still a successful run.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rbac_gate_config::RbacGateConfig;
use rbac_gate_core::PolicyEvaluator;
use rbac_gate_core::PolicyInput;
use rbac_gate_server::GatewayServer;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a decision input file for `policy eval`.
const MAX_DECISION_INPUT_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "rbac-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the RBAC Gate HTTP gateway.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Offline policy utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to rbac-gate.toml or `RBAC_GATE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a configuration file.
    Check(ConfigArgs),
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Evaluate the configured policy against a decision input file.
    Eval(PolicyEvalCommand),
}

/// Arguments for `policy eval`.
#[derive(Args, Debug)]
struct PolicyEvalCommand {
    /// Permission decision input JSON file.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command: ConfigCommand::Check(args),
        } => command_config_check(&args),
        Commands::Policy {
            command: PolicyCommand::Eval(command),
        } => command_policy_eval(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let server = tokio::task::spawn_blocking(move || GatewayServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("gateway init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("gateway init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("gateway failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config check` command.
fn command_config_check(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    for line in config_summary(&config) {
        write_stdout_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `policy eval` command.
fn command_policy_eval(command: &PolicyEvalCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let permitted = evaluate_input_file(&config, &command.input)?;
    write_stdout_line(if permitted { "allow" } else { "deny" })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<RbacGateConfig> {
    RbacGateConfig::load(path).map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Renders the `config check` summary lines.
fn config_summary(config: &RbacGateConfig) -> Vec<String> {
    let source = config
        .source_path
        .as_ref()
        .map_or_else(|| "<inline>".to_string(), |path| path.display().to_string());
    let engine = serde_json::to_value(config.policy.engine)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    let rules = config.policy.static_policy.as_ref().map_or(0, |policy| policy.rules.len());
    vec![
        format!("config ok: {source}"),
        format!("bind: {}", config.server.bind),
        format!("principals: {}", config.auth.principals.len()),
        format!("exempt routes: {}", config.server.exempt_routes.len()),
        format!("policy engine: {engine} ({rules} rules)"),
    ]
}

/// Evaluates the configured policy against a decision input file.
fn evaluate_input_file(config: &RbacGateConfig, input: &Path) -> CliResult<bool> {
    let bytes = read_bytes_with_limit(input, MAX_DECISION_INPUT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", input.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{} is {size} bytes, exceeding the {limit} byte limit",
            input.display()
        )),
    })?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid decision input json: {err}")))?;
    let policy = config
        .policy
        .build_policy()
        .map_err(|err| CliError::new(format!("policy build failed: {err}")))?;
    policy
        .evaluate(&PolicyInput::from_value(value))
        .map_err(|err| CliError::new(format!("policy evaluation failed: {err}")))
}

/// Reads a file while enforcing a maximum byte size.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("rbac-gate: {message}"));
    ExitCode::FAILURE
}
