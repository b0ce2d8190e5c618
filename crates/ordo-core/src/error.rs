//! Fatal errors and their stable codes.
//!
//! Codes group by concern: `E1xxx` input files, `E2xxx` graph and lifecycle,
//! `E3xxx` result recording.

use std::fmt;

use crate::model::UnitState;

/// Stable identifier attached to every fatal error the CLI reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ManifestParseError,
    AmbiguousDependency,
    CycleDetected,
    UnitNotFound,
    LedgerConflict,
    InvalidStateTransition,
}

impl ErrorCode {
    /// The `E####` form printed in `error[..]` headlines and JSON.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ManifestParseError => "E1004",
            Self::AmbiguousDependency => "E2004",
            Self::CycleDetected => "E2003",
            Self::UnitNotFound => "E2001",
            Self::LedgerConflict => "E3004",
            Self::InvalidStateTransition => "E2002",
        }
    }

    /// One-line summary of the category.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ManifestParseError => "Manifest parse error",
            Self::AmbiguousDependency => "Ambiguous dependency name",
            Self::CycleDetected => "Circular dependency",
            Self::UnitNotFound => "Unit not found",
            Self::LedgerConflict => "Result already recorded",
            Self::InvalidStateTransition => "Invalid state transition",
        }
    }

    /// What to change to make the error go away, where there is a general answer.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .ordo/config.toml and retry."),
            Self::ManifestParseError => Some("Check the manifest against the documented schema."),
            Self::AmbiguousDependency => {
                Some("Rename one of the units so the dependency name matches exactly one.")
            }
            Self::CycleDetected => Some("Remove one dependency on the reported path."),
            Self::UnitNotFound => None,
            Self::LedgerConflict => Some("Each unit may record its outcome only once per run."),
            Self::InvalidStateTransition => {
                Some("Follow valid transitions: not-run -> running -> passed|failed, or not-run -> skipped.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal errors raised while ordering units or recording their results.
///
/// Advisory problems (missing dependencies, unserialized groups) are not
/// errors; they travel as [`crate::Issue`] values next to a successful result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// A dependency name matched more than one candidate in its scope.
    #[error(
        "multiple candidates named '{name}' in scope '{scope}' ({count} found); dependency names must be unique"
    )]
    AmbiguousDependency {
        name: String,
        scope: String,
        count: usize,
    },

    /// The dependency relation contains a cycle.
    ///
    /// `path` starts and ends with the same label.
    #[error("circular dependency: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    /// A second outcome was recorded for the same ledger key.
    #[error("result for '{key}' already recorded")]
    LedgerConflict { key: String },

    /// A unit tried to move between states the lifecycle does not allow.
    #[error("unit '{unit}' cannot move from {from} to {to}")]
    InvalidTransition {
        unit: String,
        from: UnitState,
        to: UnitState,
    },
}

impl OrderError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AmbiguousDependency { .. } => ErrorCode::AmbiguousDependency,
            Self::CircularDependency { .. } => ErrorCode::CycleDetected,
            Self::LedgerConflict { .. } => ErrorCode::LedgerConflict,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
        }
    }
}
