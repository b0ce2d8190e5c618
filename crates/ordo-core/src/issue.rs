//! Non-fatal diagnostics collected while building graphs and resolving requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of advisory problem an [`Issue`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A declared dependency name matched nothing in scope; no edge was added.
    MissingDependency,
    /// A group takes part in a dependency edge but may run concurrently.
    UnserializedGroup,
    /// A requested unit (or its group) is absent from the graph.
    UndiscoveredRequest,
}

/// A diagnostic that never affects pass/fail or ordering success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    /// `owner_kind` is `"unit"` or `"group"`; `owner` is its display label.
    pub fn missing_dependency(owner_kind: &str, dependency: &str, owner: &str) -> Self {
        Self {
            kind: IssueKind::MissingDependency,
            message: format!("Dependency '{dependency}' for {owner_kind} '{owner}' not found."),
        }
    }

    pub fn unserialized_group(group: &str) -> Self {
        Self {
            kind: IssueKind::UnserializedGroup,
            message: format!(
                "Group '{group}' has dependencies (or is depended on) and does not have serialized \
                 execution enabled; its order is not guaranteed."
            ),
        }
    }

    pub fn undiscovered(owner_kind: &str, label: &str) -> Self {
        Self {
            kind: IssueKind::UndiscoveredRequest,
            message: format!(
                "Requested {owner_kind} '{label}' was not discovered; its dependencies are unknown."
            ),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_message() {
        let issue = Issue::missing_dependency("unit", "X", "Suite.B");
        assert_eq!(issue.kind, IssueKind::MissingDependency);
        assert_eq!(issue.to_string(), "Dependency 'X' for unit 'Suite.B' not found.");
    }

    #[test]
    fn issues_serialize_with_snake_case_kind() {
        let issue = Issue::unserialized_group("Db");
        let json = serde_json::to_value(&issue).expect("serialize");
        assert_eq!(json["kind"], "unserialized_group");
        assert!(
            json["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("Group 'Db'"))
        );
    }
}
