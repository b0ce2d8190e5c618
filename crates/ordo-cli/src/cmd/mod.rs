pub mod check;
pub mod completions;
pub mod order;
pub mod plan;
pub mod skip;

use std::io::{self, Write};
use std::path::Path;

use ordo_core::config::DiagnosticsConfig;
use ordo_core::error::ErrorCode;
use ordo_core::{Issue, OrderError};

use crate::manifest::Manifest;
use crate::output::{CliError, OutputMode, render_error};

/// Load the manifest, reporting parse failures in the active output mode.
pub(crate) fn load_manifest(path: &Path, output: OutputMode) -> anyhow::Result<Manifest> {
    Manifest::load(path).or_else(|err| {
        render_error(
            output,
            &CliError::coded(format!("{err:#}"), ErrorCode::ManifestParseError),
        )?;
        Err(err)
    })
}

/// Report a fatal ordering error and turn it into the command's error.
pub(crate) fn order_failure(output: OutputMode, err: OrderError) -> anyhow::Error {
    match render_error(output, &CliError::from(&err)) {
        Ok(()) => err.into(),
        Err(render_err) => render_err,
    }
}

/// Issues rendered for humans, prefixed according to config.
pub(crate) fn issue_lines(issues: &[Issue], diagnostics: &DiagnosticsConfig) -> Vec<String> {
    issues
        .iter()
        .map(|issue| diagnostics.decorate(&issue.message))
        .collect()
}

pub(crate) fn write_issues(w: &mut dyn Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(w, "{line}")?;
    }
    Ok(())
}
