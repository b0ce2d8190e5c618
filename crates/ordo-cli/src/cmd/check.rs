//! `ordo check`: validate a manifest without producing an order.
//!
//! Both graphs are checked even if the first one fails, so one run reports
//! every fatal problem. Exits non-zero when any fatal error was found.

use std::io::Write;
use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use ordo_core::{Issue, OrdoConfig, order_groups, order_units};
use serde::Serialize;

use crate::cmd::{issue_lines, load_manifest, write_issues};
use crate::output::{CliError, OutputMode, render_mode, section};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the manifest (TOML).
    pub manifest: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    ok: bool,
    groups: usize,
    units: usize,
    errors: Vec<CliError>,
    issues: Vec<Issue>,
    #[serde(skip)]
    issue_lines: Vec<String>,
}

/// Execute `ordo check`.
pub fn run_check(args: &CheckArgs, output: OutputMode, config: &OrdoConfig) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest, output)?;
    let groups = manifest.groups();
    let units = manifest.units();

    let mut errors = Vec::new();
    let mut issues = Vec::new();

    match order_groups(&groups) {
        Ok(ordering) => issues.extend(ordering.issues),
        Err(err) => errors.push(CliError::from(&err)),
    }
    match order_units(&units) {
        Ok(ordering) => issues.extend(ordering.issues),
        Err(err) => errors.push(CliError::from(&err)),
    }

    let payload = CheckOutput {
        ok: errors.is_empty(),
        groups: groups.len(),
        units: units.len(),
        errors,
        issue_lines: issue_lines(&issues, &config.diagnostics),
        issues,
    };

    render_mode(output, &payload, render_check_text, render_check_pretty)?;

    if !payload.ok {
        bail!("{} fatal error(s) in {}", payload.errors.len(), args.manifest.display());
    }
    Ok(())
}

fn render_check_text(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for error in &payload.errors {
        writeln!(w, "{}", error.headline())?;
    }
    write_issues(w, &payload.issue_lines)?;
    if payload.ok {
        writeln!(w, "ok: {} groups, {} units", payload.groups, payload.units)?;
    }
    Ok(())
}

fn render_check_pretty(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    section(
        w,
        &format!("Checked {} groups, {} units", payload.groups, payload.units),
    )?;

    if payload.ok {
        writeln!(w, "✓ No fatal errors.")?;
    }
    for error in &payload.errors {
        writeln!(w, "✗ {}", error.headline())?;
        if let Some(hint) = error.hint {
            writeln!(w, "    hint: {hint}")?;
        }
    }

    if !payload.issue_lines.is_empty() {
        writeln!(w)?;
        section(w, &format!("Issues ({})", payload.issue_lines.len()))?;
        write_issues(w, &payload.issue_lines)?;
    }
    Ok(())
}
