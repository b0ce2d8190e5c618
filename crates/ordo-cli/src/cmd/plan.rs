//! `ordo plan`: the group-ordered run plan, optionally narrowed to a request.

use std::io::Write;
use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use ordo_core::error::ErrorCode;
use ordo_core::{OrdoConfig, RunPlan, UnitId, plan_run};
use serde::Serialize;

use crate::cmd::{issue_lines, load_manifest, order_failure, write_issues};
use crate::output::{CliError, OutputMode, field, render_error, render_mode, section};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the manifest (TOML).
    pub manifest: PathBuf,

    /// Run only these units (`group.unit`) and what they need.
    #[arg(long = "only", value_name = "GROUP.UNIT")]
    pub only: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    #[serde(flatten)]
    plan: RunPlan,
    #[serde(skip)]
    issue_lines: Vec<String>,
}

/// Execute `ordo plan`.
pub fn run_plan(args: &PlanArgs, output: OutputMode, config: &OrdoConfig) -> anyhow::Result<()> {
    let requested = match parse_requested(&args.only) {
        Ok(ids) => ids,
        Err(bad) => {
            render_error(
                output,
                &CliError::coded(
                    format!("'{bad}' is not a GROUP.UNIT key"),
                    ErrorCode::UnitNotFound,
                ),
            )?;
            bail!("invalid unit key '{bad}'");
        }
    };

    let manifest = load_manifest(&args.manifest, output)?;
    let plan = plan_run(
        &manifest.groups(),
        &manifest.units(),
        requested.as_deref(),
        &config.planning,
    )
    .map_err(|e| order_failure(output, e))?;

    let payload = PlanOutput {
        issue_lines: issue_lines(&plan.issues, &config.diagnostics),
        plan,
    };

    render_mode(output, &payload, render_plan_text, render_plan_pretty)
}

/// `None` when nothing was requested (plan everything).
fn parse_requested(only: &[String]) -> Result<Option<Vec<UnitId>>, String> {
    if only.is_empty() {
        return Ok(None);
    }
    only.iter()
        .map(|key| UnitId::parse(key).ok_or_else(|| key.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn render_plan_text(payload: &PlanOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for group in &payload.plan.groups {
        for unit in &group.units {
            writeln!(w, "{}", unit.id)?;
        }
    }
    write_issues(w, &payload.issue_lines)
}

fn render_plan_pretty(payload: &PlanOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let plan = &payload.plan;
    section(w, "Run plan")?;
    field(w, "requested", plan.requested.to_string())?;
    field(w, "scheduled", plan.scheduled.to_string())?;

    for group in &plan.groups {
        writeln!(w)?;
        let mut flags = Vec::new();
        if group.serialized {
            flags.push("serialized");
        }
        if group.implicit {
            flags.push("implicit");
        }
        if flags.is_empty() {
            writeln!(w, "{}", group.name)?;
        } else {
            writeln!(w, "{} ({})", group.name, flags.join(", "))?;
        }
        for unit in &group.units {
            writeln!(w, "  - {}", unit.name())?;
        }
    }

    if !payload.issue_lines.is_empty() {
        writeln!(w)?;
        section(w, &format!("Issues ({})", payload.issue_lines.len()))?;
        write_issues(w, &payload.issue_lines)?;
    }
    Ok(())
}
