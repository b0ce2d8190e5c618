//! Deterministic execution order for units and groups.
//!
//! Ordering is a pure function of its input: build the graph, refuse cycles,
//! then sort so every element follows everything it depends on. Build issues
//! are forwarded untouched; they never make ordering fail.

use tracing::{info, instrument};

use crate::builder::{BuiltGraph, Dependent, build_group_graph, build_unit_graph};
use crate::error::OrderError;
use crate::graph::DirectedGraph;
use crate::identity::IdentityPolicy;
use crate::issue::Issue;
use crate::model::{Group, Unit};

/// A successful ordering plus the advisory issues found while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering<T> {
    /// Elements in execution order; dependencies first.
    pub sequence: Vec<T>,
    pub issues: Vec<Issue>,
}

impl<T: Dependent> Ordering<T> {
    /// Display labels of the sequence, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.sequence.iter().map(Dependent::label).collect()
    }

    /// BLAKE3 hash of the ordered labels.
    ///
    /// Two runs over the same declarations produce the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for element in &self.sequence {
            hasher.update(element.label().as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }
}

/// Sort an already built graph, failing on the first cycle.
///
/// # Errors
///
/// Returns [`OrderError::CircularDependency`] with the labels of the cycle
/// path when the graph is not acyclic.
pub fn order_graph<T, P>(graph: &DirectedGraph<T, P>) -> Result<Vec<T>, OrderError>
where
    T: Dependent,
    P: IdentityPolicy<T>,
{
    if let Some(cycle) = graph.find_cycle() {
        return Err(OrderError::CircularDependency {
            path: cycle.iter().map(Dependent::label).collect(),
        });
    }
    Ok(graph.topological_sort())
}

fn order_built<T, P>(built: BuiltGraph<T, P>) -> Result<Ordering<T>, OrderError>
where
    T: Dependent,
    P: IdentityPolicy<T>,
{
    let sequence = order_graph(&built.graph)?;
    info!(
        kind = T::KIND,
        ordered = sequence.len(),
        issues = built.issues.len(),
        "ordering complete"
    );
    Ok(Ordering {
        sequence,
        issues: built.issues,
    })
}

/// Order units so each runs after the units it depends on.
///
/// # Errors
///
/// Fails on an ambiguous dependency name or a dependency cycle.
#[instrument(skip_all, fields(units = units.len()))]
pub fn order_units(units: &[Unit]) -> Result<Ordering<Unit>, OrderError> {
    order_built(build_unit_graph(units)?)
}

/// Order groups so each runs after the groups it depends on.
///
/// # Errors
///
/// Fails on an ambiguous dependency name or a dependency cycle.
#[instrument(skip_all, fields(groups = groups.len()))]
pub fn order_groups(groups: &[Group]) -> Result<Ordering<Group>, OrderError> {
    order_built(build_group_graph(groups)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;

    fn scenario_a() -> Vec<Unit> {
        vec![
            Unit::new("Suite", "A").depends_on(["B", "C"]),
            Unit::new("Suite", "B").depends_on(["D"]),
            Unit::new("Suite", "C").depends_on(["D"]),
            Unit::new("Suite", "D").depends_on(["E"]),
            Unit::new("Suite", "E"),
        ]
    }

    fn position(labels: &[String], label: &str) -> usize {
        labels
            .iter()
            .position(|l| l == label)
            .unwrap_or_else(|| panic!("{label} missing from {labels:?}"))
    }

    #[test]
    fn orders_diamond_dependencies_first() {
        let ordering = order_units(&scenario_a()).expect("acyclic");
        let labels = ordering.labels();

        assert_eq!(labels.len(), 5);
        assert!(position(&labels, "Suite.E") < position(&labels, "Suite.D"));
        assert!(position(&labels, "Suite.D") < position(&labels, "Suite.B"));
        assert!(position(&labels, "Suite.D") < position(&labels, "Suite.C"));
        assert!(position(&labels, "Suite.B") < position(&labels, "Suite.A"));
        assert!(position(&labels, "Suite.C") < position(&labels, "Suite.A"));
        assert!(ordering.issues.is_empty());
    }

    #[test]
    fn cycle_is_fatal_with_full_path() {
        let units = [
            Unit::new("Suite", "A").depends_on(["B"]),
            Unit::new("Suite", "B").depends_on(["C"]),
            Unit::new("Suite", "C").depends_on(["A"]),
        ];

        let err = order_units(&units).expect_err("cyclic");
        assert_eq!(
            err.to_string(),
            "circular dependency: Suite.A -> Suite.B -> Suite.C -> Suite.A"
        );
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let units = [Unit::new("Suite", "A").depends_on(["A"])];
        let err = order_units(&units).expect_err("self loop");
        assert_eq!(
            err,
            OrderError::CircularDependency {
                path: vec!["Suite.A".into(), "Suite.A".into()],
            }
        );
    }

    #[test]
    fn issues_are_forwarded_not_fatal() {
        let units = [
            Unit::new("Suite", "A"),
            Unit::new("Suite", "B").depends_on(["X"]),
        ];

        let ordering = order_units(&units).expect("missing dependency is advisory");
        assert_eq!(ordering.sequence.len(), 2);
        assert_eq!(ordering.issues.len(), 1);
        assert_eq!(ordering.issues[0].kind, IssueKind::MissingDependency);
    }

    #[test]
    fn groups_order_independently_of_units() {
        let groups = [
            Group::new("Ui").serialized(true).depends_on(["Api"]),
            Group::new("Api").serialized(true).depends_on(["Db"]),
            Group::new("Db").serialized(true),
        ];

        let ordering = order_groups(&groups).expect("acyclic");
        assert_eq!(ordering.labels(), vec!["Db", "Api", "Ui"]);
        assert!(ordering.issues.is_empty());
    }

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let first = order_units(&scenario_a()).expect("acyclic");
        let second = order_units(&scenario_a()).expect("acyclic");
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert!(first.fingerprint().starts_with("blake3:"));

        let mut reversed = first.clone();
        reversed.sequence.reverse();
        assert_ne!(first.fingerprint(), reversed.fingerprint());
    }
}
