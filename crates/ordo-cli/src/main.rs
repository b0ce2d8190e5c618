#![forbid(unsafe_code)]

mod cmd;
mod manifest;
mod output;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use ordo_core::config::{UserConfig, load_project_config, load_user_config};
use ordo_core::error::ErrorCode;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "ordo",
    author,
    version,
    about = "ordo: dependency-ordered test execution",
    long_about = None
)]
struct Cli {
    /// Log at debug level (ignored when `ORDO_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ordering",
        about = "Print group and unit execution order",
        long_about = "Order groups and units so every element runs after everything it depends on.",
        after_help = "EXAMPLES:\n    # Order a manifest\n    ordo order ordo.toml\n\n    # Emit machine-readable output\n    ordo order ordo.toml --json"
    )]
    Order(cmd::order::OrderArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "Print the run plan",
        long_about = "Print the group-ordered run plan, optionally narrowed to requested units and their prerequisites.",
        after_help = "EXAMPLES:\n    # Plan everything\n    ordo plan ordo.toml\n\n    # Plan one unit and what it needs\n    ordo plan ordo.toml --only Api.logout"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Validation",
        about = "Validate a manifest",
        long_about = "Report cycles, ambiguous dependency names and advisory issues. Exits non-zero on fatal errors.",
        after_help = "EXAMPLES:\n    # Check a manifest\n    ordo check ordo.toml"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Runtime",
        about = "Decide whether a unit would be skipped",
        long_about = "Evaluate the skip decision for one unit against a JSON file of recorded results.",
        after_help = "EXAMPLES:\n    # Evaluate Class.Test against recorded results\n    ordo skip ordo.toml Class.Test --results results.json"
    )]
    Skip(cmd::skip::SkipArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    ordo completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Logs go to stderr so stdout stays parseable.
///
/// `ORDO_LOG` is an `EnvFilter` directive and wins over `--verbose`;
/// `ORDO_LOG_FORMAT=json` switches to one JSON object per event.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ORDO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var_os("DEBUG").is_some() {
            "ordo=debug,info"
        } else {
            "ordo=info,warn"
        })
    });
    let json = env::var("ORDO_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let user = load_user_config().unwrap_or_else(|err| {
        warn!("ignoring user config: {err:#}");
        UserConfig::default()
    });
    let output = resolve_output_mode(cli.format, cli.json, user.output.as_deref());

    let project_root = env::current_dir().context("Failed to resolve working directory")?;
    let config = match load_project_config(&project_root) {
        Ok(config) => config,
        Err(err) => {
            render_error(
                output,
                &CliError::coded(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };
    debug!(?config, ?output, "configuration resolved");

    match cli.command {
        Commands::Order(ref args) => cmd::order::run_order(args, output, &config),
        Commands::Plan(ref args) => cmd::plan::run_plan(args, output, &config),
        Commands::Check(ref args) => cmd::check::run_check(args, output, &config),
        Commands::Skip(ref args) => cmd::skip::run_skip(args, output, &config),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["ordo", "order", "m.toml", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Order(_)));
    }

    #[test]
    fn format_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["ordo", "--format", "text", "check", "m.toml"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn plan_accepts_repeated_only() {
        let cli = Cli::parse_from([
            "ordo", "plan", "m.toml", "--only", "Api.login", "--only", "Db.seed",
        ]);
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.only, vec!["Api.login", "Db.seed"]),
            other => panic!("expected plan, got {other:?}"),
        }
    }

    #[test]
    fn skip_requires_results() {
        assert!(Cli::try_parse_from(["ordo", "skip", "m.toml", "G.a"]).is_err());
        assert!(
            Cli::try_parse_from(["ordo", "skip", "m.toml", "G.a", "--results", "r.json"]).is_ok()
        );
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["ordo", "order", "m.toml"],
            vec!["ordo", "plan", "m.toml"],
            vec!["ordo", "check", "m.toml"],
            vec!["ordo", "skip", "m.toml", "G.a", "--results", "r.json"],
            vec!["ordo", "completions", "bash"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse: {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["ordo", "check", "m.toml", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
