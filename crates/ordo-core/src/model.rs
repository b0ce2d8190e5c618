//! Units, groups and run outcomes.
//!
//! A [`Unit`] is the smallest orderable piece of work (a test method). Units
//! live in a [`Group`] (a class or collection) and name their dependencies by
//! unit name; those names resolve inside the unit's own group. Groups name
//! their dependencies by group name, resolved globally.
//!
//! Ledger keys are `"<group>.<unit>"`. The group part may itself contain dots
//! (`tests.api.Users`); unit names may not.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Separator between the group and unit parts of a ledger key.
pub const KEY_SEPARATOR: char = '.';

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Scoped identity of a unit: its group plus its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub group: String,
    pub name: String,
}

impl UnitId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Ledger key under which this unit's outcome is recorded.
    #[must_use]
    pub fn ledger_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.group, self.name)
    }

    /// Parse a `"<group>.<unit>"` key. The unit is everything after the last dot.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let (group, name) = key.rsplit_once(KEY_SEPARATOR)?;
        if group.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(group, name))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.group, self.name)
    }
}

/// Prefix shared by every ledger key of units in `group`.
#[must_use]
pub fn group_key_prefix(group: &str) -> String {
    format!("{group}{KEY_SEPARATOR}")
}

// ---------------------------------------------------------------------------
// Unit / Group
// ---------------------------------------------------------------------------

/// A single orderable unit with its declared dependency names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Names of units in the same group that must pass first, in declaration order.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Unit {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UnitId::new(group, name),
            depends_on: Vec::new(),
        }
    }

    /// Builder-style helper to declare dependencies.
    #[must_use]
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.id.group
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Ledger key of a declared dependency, resolved within this unit's group.
    #[must_use]
    pub fn dependency_key(&self, dependency: &str) -> String {
        format!("{}{KEY_SEPARATOR}{dependency}", self.id.group)
    }
}

/// A named collection of units that can itself depend on other groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Whether concurrent execution is disabled for this group.
    #[serde(default)]
    pub serialized: bool,
    /// Names of groups that must pass first, in declaration order.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serialized: false,
            depends_on: Vec::new(),
        }
    }

    #[must_use]
    pub const fn serialized(mut self, serialized: bool) -> Self {
        self.serialized = serialized;
        self
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Namespace in which a dependency name is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Unit dependencies: only units of the named group are candidates.
    SameGroup(String),
    /// Group dependencies: every group is a candidate.
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameGroup(group) => f.write_str(group),
            Self::Global => f.write_str("<global>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes and lifecycle
// ---------------------------------------------------------------------------

/// Recorded result of a unit that finished (or was skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Per-unit lifecycle.
///
/// ```text
/// NotRun ──► Running ──► Passed | Failed
///    └──────► Skipped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitState {
    NotRun,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl UnitState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not-run",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `not-run -> running`
    /// - `not-run -> skipped`
    /// - `running -> passed`
    /// - `running -> failed`
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::NotRun, Self::Running | Self::Skipped)
                | (Self::Running, Self::Passed | Self::Failed)
        )
    }

    /// Terminal states carry an outcome; `NotRun` and `Running` do not.
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Passed => Some(Outcome::Passed),
            Self::Failed => Some(Outcome::Failed),
            Self::Skipped => Some(Outcome::Skipped),
            Self::NotRun | Self::Running => None,
        }
    }
}

impl From<Outcome> for UnitState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => Self::Passed,
            Outcome::Failed => Self::Failed,
            Outcome::Skipped => Self::Skipped,
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Outcome {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "passed" | "pass" => Ok(Self::Passed),
            "failed" | "fail" => Ok(Self::Failed),
            "skipped" | "skip" => Ok(Self::Skipped),
            _ => Err(ParseEnumError {
                expected: "outcome",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Group, Outcome, Unit, UnitId, UnitState, group_key_prefix};
    use std::str::FromStr;

    #[test]
    fn ledger_keys_join_group_and_name() {
        let unit = Unit::new("Suite", "login");
        assert_eq!(unit.id.ledger_key(), "Suite.login");
        assert_eq!(unit.dependency_key("setup"), "Suite.setup");
        assert_eq!(group_key_prefix("Suite"), "Suite.");
    }

    #[test]
    fn parse_splits_on_last_dot() {
        let id = UnitId::parse("tests.api.Users.create").expect("valid key");
        assert_eq!(id.group, "tests.api.Users");
        assert_eq!(id.name, "create");
        assert!(UnitId::parse("nodot").is_none());
        assert!(UnitId::parse(".name").is_none());
        assert!(UnitId::parse("group.").is_none());
    }

    #[test]
    fn builders_accumulate_dependencies() {
        let unit = Unit::new("G", "a").depends_on(["b", "c"]);
        assert_eq!(unit.depends_on, vec!["b", "c"]);

        let group = Group::new("G").serialized(true).depends_on(["H"]);
        assert!(group.serialized);
        assert_eq!(group.depends_on, vec!["H"]);
    }

    #[test]
    fn outcome_parses_case_insensitively() {
        assert_eq!(Outcome::from_str(" Passed ").expect("parse"), Outcome::Passed);
        assert_eq!(Outcome::from_str("FAIL").expect("parse"), Outcome::Failed);
        assert!(Outcome::from_str("flaky").is_err());
    }

    #[test]
    fn outcome_json_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Outcome::Skipped).expect("serialize"),
            "\"skipped\""
        );
        assert_eq!(
            serde_json::to_string(&UnitState::NotRun).expect("serialize"),
            "\"not-run\""
        );
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(UnitState::NotRun.can_transition_to(UnitState::Running));
        assert!(UnitState::NotRun.can_transition_to(UnitState::Skipped));
        assert!(UnitState::Running.can_transition_to(UnitState::Passed));
        assert!(UnitState::Running.can_transition_to(UnitState::Failed));

        assert!(!UnitState::NotRun.can_transition_to(UnitState::Passed));
        assert!(!UnitState::Running.can_transition_to(UnitState::Skipped));
        assert!(!UnitState::Passed.can_transition_to(UnitState::Running));
        assert!(!UnitState::Skipped.can_transition_to(UnitState::Running));
        assert!(!UnitState::Failed.can_transition_to(UnitState::Failed));
    }

    #[test]
    fn terminal_states_carry_outcomes() {
        assert_eq!(UnitState::Passed.outcome(), Some(Outcome::Passed));
        assert_eq!(UnitState::Running.outcome(), None);
        assert_eq!(UnitState::from(Outcome::Failed), UnitState::Failed);
    }
}
