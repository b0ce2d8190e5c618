//! `ordo order`: print the group order and the unit order.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ordo_core::{Issue, OrdoConfig, order_groups, order_units};
use serde::Serialize;

use crate::cmd::{issue_lines, load_manifest, order_failure, write_issues};
use crate::output::{OutputMode, field, render_mode, section};

#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Path to the manifest (TOML).
    pub manifest: PathBuf,
}

#[derive(Debug, Serialize)]
struct OrderOutput {
    groups: Vec<String>,
    units: Vec<String>,
    issues: Vec<Issue>,
    fingerprint: String,
    #[serde(skip)]
    issue_lines: Vec<String>,
}

/// Execute `ordo order`.
pub fn run_order(args: &OrderArgs, output: OutputMode, config: &OrdoConfig) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest, output)?;

    let groups = order_groups(&manifest.groups()).map_err(|e| order_failure(output, e))?;
    let units = order_units(&manifest.units()).map_err(|e| order_failure(output, e))?;

    let mut issues = groups.issues.clone();
    issues.extend(units.issues.iter().cloned());

    let payload = OrderOutput {
        groups: groups.labels(),
        units: units.labels(),
        fingerprint: units.fingerprint(),
        issue_lines: issue_lines(&issues, &config.diagnostics),
        issues,
    };

    render_mode(output, &payload, render_order_text, render_order_pretty)
}

fn render_order_text(payload: &OrderOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "groups: {}", payload.groups.join(" "))?;
    for unit in &payload.units {
        writeln!(w, "{unit}")?;
    }
    write_issues(w, &payload.issue_lines)
}

fn render_order_pretty(payload: &OrderOutput, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, "Group order")?;
    if payload.groups.is_empty() {
        writeln!(w, "(no groups declared)")?;
    }
    for (idx, group) in payload.groups.iter().enumerate() {
        writeln!(w, "{:>4}. {group}", idx + 1)?;
    }

    writeln!(w)?;
    section(w, "Unit order")?;
    for (idx, unit) in payload.units.iter().enumerate() {
        writeln!(w, "{:>4}. {unit}", idx + 1)?;
    }
    field(w, "fingerprint", &payload.fingerprint)?;

    if !payload.issue_lines.is_empty() {
        writeln!(w)?;
        section(w, &format!("Issues ({})", payload.issue_lines.len()))?;
        write_issues(w, &payload.issue_lines)?;
    }
    Ok(())
}
