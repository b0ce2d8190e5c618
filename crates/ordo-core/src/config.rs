//! Project and user settings.
//!
//! Every key is optional; an absent file or section means defaults.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// Default explanation attached to every skip verdict.
pub const DEFAULT_SKIP_REASON: &str = "One or more dependencies were skipped or had failed.";

/// Prefix the CLI puts in front of every issue when `prefix_issues` is set.
pub const ISSUE_PREFIX: &str = "[ORDERER WARNING]";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdoConfig {
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub skip: SkipConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Pull in every unit of the groups a requested unit's group depends on.
    #[serde(default = "default_true")]
    pub expand_group_dependencies: bool,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            expand_group_dependencies: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipConfig {
    #[serde(default = "default_skip_reason")]
    pub reason: String,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            reason: default_skip_reason(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub prefix_issues: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            prefix_issues: default_true(),
        }
    }
}

impl DiagnosticsConfig {
    /// Render an issue message the way the CLI prints it.
    #[must_use]
    pub fn decorate(&self, message: &str) -> String {
        if self.prefix_issues {
            format!("{ISSUE_PREFIX} {message}")
        } else {
            message.to_string()
        }
    }
}

/// Per-user preferences that apply to every project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode when neither a flag nor `FORMAT` picks one.
    #[serde(default)]
    pub output: Option<String>,
}

/// Project settings file, relative to the project root.
pub const PROJECT_CONFIG: &str = ".ordo/config.toml";

/// Load [`PROJECT_CONFIG`] under `project_root`. A missing file yields defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<OrdoConfig> {
    read_toml_or_default(&project_root.join(PROJECT_CONFIG))
}

/// Load `ordo/config.toml` from the platform config directory.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    dirs::config_dir().map_or_else(
        || Ok(UserConfig::default()),
        |dir| read_toml_or_default(&dir.join("ordo").join("config.toml")),
    )
}

fn read_toml_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}

fn default_skip_reason() -> String {
    DEFAULT_SKIP_REASON.to_string()
}
