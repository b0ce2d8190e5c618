//! `ordo skip`: would this unit run, given these recorded results?

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use ordo_core::error::ErrorCode;
use ordo_core::skip::SkipEvaluator;
use ordo_core::{OrdoConfig, Outcome, SkipVerdict, UnitId};
use serde::Serialize;

use crate::cmd::load_manifest;
use crate::output::{CliError, OutputMode, field, render_error, render_mode};

#[derive(Args, Debug)]
pub struct SkipArgs {
    /// Path to the manifest (TOML).
    pub manifest: PathBuf,

    /// Unit to evaluate, as `group.unit`.
    #[arg(value_name = "GROUP.UNIT")]
    pub unit: String,

    /// JSON object mapping `group.unit` keys to `passed`, `failed` or `skipped`.
    #[arg(long)]
    pub results: PathBuf,
}

#[derive(Debug, Serialize)]
struct SkipOutput {
    unit: String,
    skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    verdict: SkipVerdict,
}

/// Execute `ordo skip`.
pub fn run_skip(args: &SkipArgs, output: OutputMode, config: &OrdoConfig) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest, output)?;

    let Some(id) = UnitId::parse(&args.unit) else {
        render_error(
            output,
            &CliError::coded(
                format!("'{}' is not a GROUP.UNIT key", args.unit),
                ErrorCode::UnitNotFound,
            ),
        )?;
        bail!("invalid unit key '{}'", args.unit);
    };

    let Some(unit) = manifest.unit(&id.group, &id.name) else {
        render_error(
            output,
            &CliError::coded(
                format!("unit '{id}' is not declared in {}", args.manifest.display()),
                ErrorCode::UnitNotFound,
            ),
        )?;
        bail!("unit '{id}' not found");
    };

    let results = match load_results(&args.results) {
        Ok(results) => results,
        Err(err) => {
            render_error(output, &CliError::new(format!("{err:#}")))?;
            return Err(err);
        }
    };
    let group = manifest.group(unit.group());
    let verdict =
        SkipEvaluator::from_config(&config.skip).evaluate(&unit, group.as_ref(), &results);

    let payload = SkipOutput {
        unit: id.to_string(),
        skip: verdict.is_skip(),
        reason: verdict.reason().map(ToString::to_string),
        verdict,
    };

    render_mode(output, &payload, render_skip_text, render_skip_pretty)
}

fn load_results(path: &Path) -> anyhow::Result<BTreeMap<String, Outcome>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn render_skip_text(payload: &SkipOutput, w: &mut dyn Write) -> std::io::Result<()> {
    match &payload.reason {
        Some(reason) => writeln!(w, "skip {}: {reason}", payload.unit),
        None => writeln!(w, "run {}", payload.unit),
    }
}

fn render_skip_pretty(payload: &SkipOutput, w: &mut dyn Write) -> std::io::Result<()> {
    field(w, "unit", &payload.unit)?;
    field(w, "verdict", if payload.skip { "skip" } else { "run" })?;
    if let Some(reason) = &payload.reason {
        field(w, "reason", reason)?;
    }
    Ok(())
}
