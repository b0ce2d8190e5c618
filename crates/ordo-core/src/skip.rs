//! Runtime skip decision.
//!
//! Evaluated once per unit, immediately before the host runs it, against the
//! outcomes recorded so far. A unit runs only if every group its group
//! depends on has fully passed and every unit it depends on has passed.
//! Anything else, including a dependency that never recorded a result,
//! skips the unit.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::{DEFAULT_SKIP_REASON, SkipConfig};
use crate::ledger::Ledger;
use crate::model::{Group, Outcome, Unit, UnitId, group_key_prefix};

/// Whether the blocking dependency is a unit or a whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyLevel {
    Unit,
    Group,
}

/// Why a dependency blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    /// No result recorded (for a group: no unit of it recorded anything).
    Missing,
    Failed,
    Skipped,
}

impl BlockState {
    const fn describe(self) -> &'static str {
        match self {
            Self::Missing => "has no recorded result",
            Self::Failed => "failed",
            Self::Skipped => "was skipped",
        }
    }

    /// The block caused by a recorded `outcome`, or `None` if it passed.
    #[must_use]
    pub const fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Passed => None,
            Outcome::Failed => Some(Self::Failed),
            Outcome::Skipped => Some(Self::Skipped),
        }
    }
}

/// The first dependency that blocked a unit, plus the configured message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    pub message: String,
    pub level: DependencyLevel,
    /// Ledger key for units, group name for groups.
    pub dependency: String,
    pub state: BlockState,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DependencyLevel::Unit => "Unit",
            DependencyLevel::Group => "Group",
        };
        write!(
            f,
            "{} {level} '{}' {}.",
            self.message,
            self.dependency,
            self.state.describe()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SkipVerdict {
    Run,
    Skip(SkipReason),
}

impl SkipVerdict {
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }

    #[must_use]
    pub const fn reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Run => None,
            Self::Skip(reason) => Some(reason),
        }
    }
}

/// Skip decision with a configurable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEvaluator {
    message: String,
}

impl Default for SkipEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_REASON)
    }
}

impl SkipEvaluator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &SkipConfig) -> Self {
        Self::new(config.reason.clone())
    }

    /// Decide whether `unit` may run given the outcomes in `ledger`.
    ///
    /// `group` is the unit's own group; when supplied, its group-level
    /// dependencies are checked before the unit's own.
    pub fn evaluate<L>(&self, unit: &Unit, group: Option<&Group>, ledger: &L) -> SkipVerdict
    where
        L: Ledger + ?Sized,
    {
        if let Some(group) = group {
            for dependency in &group.depends_on {
                if let Some(state) = group_block(dependency, ledger) {
                    return self.skip(unit, DependencyLevel::Group, dependency.clone(), state);
                }
            }
        }

        for dependency in &unit.depends_on {
            let key = unit.dependency_key(dependency);
            let state = match ledger.outcome(&key) {
                Some(outcome) => BlockState::from_outcome(outcome),
                None => Some(BlockState::Missing),
            };
            if let Some(state) = state {
                return self.skip(unit, DependencyLevel::Unit, key, state);
            }
        }

        SkipVerdict::Run
    }

    fn skip(
        &self,
        unit: &Unit,
        level: DependencyLevel,
        dependency: String,
        state: BlockState,
    ) -> SkipVerdict {
        let reason = SkipReason {
            message: self.message.clone(),
            level,
            dependency,
            state,
        };
        debug!(unit = %unit.id, %reason, "skipping unit");
        SkipVerdict::Skip(reason)
    }
}

/// A dependency group passes only if it recorded at least one outcome and
/// every recorded outcome passed. Units of the group that have not recorded
/// anything yet do not block.
///
/// The prefix scan also matches nested groups (`Db.Extra.x` under `Db.`),
/// so keys are filtered on their parsed group.
fn group_block<L>(group: &str, ledger: &L) -> Option<BlockState>
where
    L: Ledger + ?Sized,
{
    let outcomes: Vec<Outcome> = ledger
        .outcomes_with_prefix(&group_key_prefix(group))
        .into_iter()
        .filter(|(key, _)| UnitId::parse(key).is_some_and(|id| id.group == group))
        .map(|(_, outcome)| outcome)
        .collect();
    if outcomes.is_empty() {
        return Some(BlockState::Missing);
    }
    outcomes.into_iter().find_map(BlockState::from_outcome)
}

/// [`SkipEvaluator::evaluate`] with the default message.
pub fn evaluate<L>(unit: &Unit, group: Option<&Group>, ledger: &L) -> SkipVerdict
where
    L: Ledger + ?Sized,
{
    SkipEvaluator::default().evaluate(unit, group, ledger)
}

/// Returns `true` if `unit` must be skipped.
pub fn should_skip<L>(unit: &Unit, group: Option<&Group>, ledger: &L) -> bool
where
    L: Ledger + ?Sized,
{
    evaluate(unit, group, ledger).is_skip()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResultLedger;

    fn ledger(entries: &[(&str, Outcome)]) -> ResultLedger {
        entries
            .iter()
            .map(|(key, outcome)| ((*key).to_string(), *outcome))
            .collect()
    }

    #[test]
    fn no_dependencies_always_runs() {
        let unit = Unit::new("Class", "free");
        assert!(!should_skip(&unit, None, &ResultLedger::new()));
        assert!(!should_skip(
            &unit,
            None,
            &ledger(&[("Class.other", Outcome::Failed)])
        ));
    }

    #[test]
    fn failed_dependency_skips() {
        let unit = Unit::new("Class", "Test").depends_on(["Dep1"]);
        let results = ledger(&[("Class.Dep1", Outcome::Failed)]);

        let verdict = evaluate(&unit, None, &results);
        let reason = verdict.reason().expect("skip");
        assert_eq!(reason.dependency, "Class.Dep1");
        assert_eq!(reason.state, BlockState::Failed);
        assert_eq!(
            reason.to_string(),
            "One or more dependencies were skipped or had failed. Unit 'Class.Dep1' failed."
        );
    }

    #[test]
    fn missing_or_skipped_dependency_skips() {
        let unit = Unit::new("Class", "Test").depends_on(["Dep1", "Dep2"]);

        let missing = ledger(&[("Class.Dep1", Outcome::Passed)]);
        let verdict = evaluate(&unit, None, &missing);
        assert_eq!(verdict.reason().map(|r| r.state), Some(BlockState::Missing));

        let skipped = ledger(&[
            ("Class.Dep1", Outcome::Passed),
            ("Class.Dep2", Outcome::Skipped),
        ]);
        let verdict = evaluate(&unit, None, &skipped);
        assert_eq!(verdict.reason().map(|r| r.state), Some(BlockState::Skipped));
    }

    #[test]
    fn all_passed_runs() {
        let unit = Unit::new("Class", "Test").depends_on(["Dep1", "Dep2"]);
        let results = ledger(&[
            ("Class.Dep1", Outcome::Passed),
            ("Class.Dep2", Outcome::Passed),
        ]);
        assert_eq!(evaluate(&unit, None, &results), SkipVerdict::Run);
    }

    #[test]
    fn dependency_keys_are_scoped_to_own_group() {
        let unit = Unit::new("Class", "Test").depends_on(["Dep1"]);
        let results = ledger(&[("Other.Dep1", Outcome::Passed)]);
        assert!(should_skip(&unit, None, &results));
    }

    #[test]
    fn group_without_results_skips() {
        let group = Group::new("Api").serialized(true).depends_on(["Db"]);
        let unit = Unit::new("Api", "login");

        let verdict = evaluate(&unit, Some(&group), &ResultLedger::new());
        let reason = verdict.reason().expect("skip");
        assert_eq!(reason.level, DependencyLevel::Group);
        assert_eq!(reason.dependency, "Db");
        assert_eq!(reason.state, BlockState::Missing);
    }

    #[test]
    fn group_with_all_passed_runs() {
        let group = Group::new("Api").depends_on(["Db"]);
        let unit = Unit::new("Api", "login");
        let results = ledger(&[
            ("Db.migrate", Outcome::Passed),
            ("Db.seed", Outcome::Passed),
            ("DbTools.x", Outcome::Failed),
        ]);
        assert!(!should_skip(&unit, Some(&group), &results));
    }

    #[test]
    fn group_with_one_failure_skips() {
        let group = Group::new("Api").depends_on(["Db"]);
        let unit = Unit::new("Api", "login");
        let results = ledger(&[
            ("Db.migrate", Outcome::Passed),
            ("Db.seed", Outcome::Failed),
        ]);

        let verdict = evaluate(&unit, Some(&group), &results);
        assert_eq!(verdict.reason().map(|r| r.state), Some(BlockState::Failed));
    }

    #[test]
    fn nested_group_results_do_not_count_for_parent() {
        let group = Group::new("Api").depends_on(["Db"]);
        let unit = Unit::new("Api", "login");
        let results = ledger(&[
            ("Db.migrate", Outcome::Passed),
            ("Db.Extra.x", Outcome::Failed),
        ]);
        assert_eq!(evaluate(&unit, Some(&group), &results), SkipVerdict::Run);

        let only_nested = ledger(&[("Db.Extra.x", Outcome::Passed)]);
        let verdict = evaluate(&unit, Some(&group), &only_nested);
        assert_eq!(verdict.reason().map(|r| r.state), Some(BlockState::Missing));
    }

    #[test]
    fn partially_recorded_group_counts_as_passed() {
        // Db = {migrate, seed}; only migrate has a result so far.
        let group = Group::new("Api").depends_on(["Db"]);
        let unit = Unit::new("Api", "login");
        let results = ledger(&[("Db.migrate", Outcome::Passed)]);
        assert_eq!(evaluate(&unit, Some(&group), &results), SkipVerdict::Run);
    }

    #[test]
    fn outcome_conversion_never_blocks_on_pass() {
        assert_eq!(BlockState::from_outcome(Outcome::Passed), None);
        assert_eq!(
            BlockState::from_outcome(Outcome::Failed),
            Some(BlockState::Failed)
        );
        assert_eq!(
            BlockState::from_outcome(Outcome::Skipped),
            Some(BlockState::Skipped)
        );
    }

    #[test]
    fn group_check_precedes_unit_check() {
        let group = Group::new("Api").depends_on(["Db"]);
        let unit = Unit::new("Api", "logout").depends_on(["login"]);
        let results = ledger(&[("Db.seed", Outcome::Failed)]);

        let verdict = evaluate(&unit, Some(&group), &results);
        assert_eq!(
            verdict.reason().map(|r| r.level),
            Some(DependencyLevel::Group)
        );
    }

    #[test]
    fn configured_message_is_used() {
        let evaluator = SkipEvaluator::from_config(&SkipConfig {
            reason: "Upstream did not pass.".into(),
        });
        let unit = Unit::new("Class", "Test").depends_on(["Dep1"]);

        let verdict = evaluator.evaluate(&unit, None, &ResultLedger::new());
        assert_eq!(
            verdict.reason().map(ToString::to_string).as_deref(),
            Some("Upstream did not pass. Unit 'Class.Dep1' has no recorded result.")
        );
    }

    #[test]
    fn verdict_serializes_with_tag() {
        let json = serde_json::to_value(SkipVerdict::Run).expect("serialize");
        assert_eq!(json["verdict"], "run");
    }
}
