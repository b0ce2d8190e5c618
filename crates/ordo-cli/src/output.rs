//! Output modes and rendering shared by every subcommand.
//!
//! Each command builds one serializable payload and hands it to
//! [`render_mode`] together with a text renderer (compact, pipe friendly) and
//! a pretty renderer (sections for a terminal). JSON needs no renderer.
//!
//! The mode comes from the first source that names a valid one: `--format`,
//! the hidden `--json` flag, the `FORMAT` env var, `output` in the user
//! config. Without any of those it is pretty on a terminal and text when
//! piped.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use ordo_core::OrderError;
use ordo_core::error::ErrorCode;
use serde::Serialize;

const SECTION_RULE: char = '=';
const FIELD_WIDTH: usize = 11;

/// Write `title` underlined to its own width.
pub fn section(w: &mut dyn Write, title: &str) -> io::Result<()> {
    let rule: String = std::iter::repeat_n(SECTION_RULE, title.chars().count()).collect();
    writeln!(w, "{title}\n{rule}")
}

/// Write an indented `label  value` line.
pub fn field(w: &mut dyn Write, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(w, "  {label:<width$}{value}", width = FIELD_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and numbering for a terminal.
    Pretty,
    /// One fact per line.
    Text,
    Json,
}

impl OutputMode {
    fn from_name(raw: &str) -> Option<Self> {
        Self::from_str(raw.trim(), true).ok()
    }
}

/// Every place an output mode can come from, highest precedence first.
#[derive(Debug, Default)]
struct ModeSources<'a> {
    flag: Option<OutputMode>,
    json: bool,
    env: Option<&'a str>,
    user: Option<&'a str>,
    tty: bool,
}

impl ModeSources<'_> {
    /// Unknown names in `env` or `user` are ignored, not rejected.
    fn resolve(&self) -> OutputMode {
        self.flag
            .or_else(|| self.json.then_some(OutputMode::Json))
            .or_else(|| self.env.and_then(OutputMode::from_name))
            .or_else(|| self.user.and_then(OutputMode::from_name))
            .unwrap_or(if self.tty {
                OutputMode::Pretty
            } else {
                OutputMode::Text
            })
    }
}

pub fn resolve_output_mode(
    flag: Option<OutputMode>,
    json: bool,
    user: Option<&str>,
) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    ModeSources {
        flag,
        json,
        env: env.as_deref(),
        user,
        tty: io::stdout().is_terminal(),
    }
    .resolve()
}

/// Render `value` to stdout in `mode`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    render_to(&mut io::stdout().lock(), mode, value, text, pretty)
}

fn render_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(value, out)?,
        OutputMode::Pretty => pretty(value, out)?,
    }
    out.flush()?;
    Ok(())
}

/// A user-facing failure: optional stable code, message, optional hint.
///
/// Fatal ordering errors, manifest and config failures all travel as this
/// shape, in JSON under an `"error"` key.
#[derive(Debug, Serialize)]
pub struct CliError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn coded(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            code: Some(code.code()),
            message: message.into(),
            hint: code.hint(),
        }
    }

    /// `error[E2003]: message`, or `error: message` without a code.
    pub fn headline(&self) -> String {
        match self.code {
            Some(code) => format!("error[{code}]: {}", self.message),
            None => format!("error: {}", self.message),
        }
    }
}

impl From<&OrderError> for CliError {
    fn from(err: &OrderError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

/// Write `error` to stderr in `mode`.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    write_error(&mut io::stderr().lock(), mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        serde_json::to_writer_pretty(&mut *out, &serde_json::json!({ "error": error }))?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "{}", error.headline())?;
    if let Some(hint) = error.hint {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}
