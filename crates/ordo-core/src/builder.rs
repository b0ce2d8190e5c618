//! Graph construction from declared dependency names.
//!
//! # Overview
//!
//! Hosts hand over the full universe of units (or groups), each carrying the
//! names it depends on. The builder resolves every name inside the owner's
//! [`Scope`] and turns it into an edge:
//!
//! | candidates in scope | result                                  |
//! |---------------------|-----------------------------------------|
//! | 0                   | [`Issue`] (`MissingDependency`), no edge |
//! | 1                   | edge `owner → dependency`               |
//! | more than 1         | fatal [`OrderError::AmbiguousDependency`] |
//!
//! Group graphs get one extra pass: every group touching an edge that is not
//! serialized produces an `UnserializedGroup` issue, because declared order
//! means nothing if the host may run the groups concurrently.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument, warn};

use crate::error::OrderError;
use crate::graph::DirectedGraph;
use crate::identity::{GroupIdentity, IdentityPolicy, UnitIdentity};
use crate::issue::Issue;
use crate::model::{Group, Scope, Unit};

// ---------------------------------------------------------------------------
// Dependent
// ---------------------------------------------------------------------------

/// Anything that declares dependencies by name within a scope.
pub trait Dependent: Clone {
    /// `"unit"` or `"group"`, used in diagnostics.
    const KIND: &'static str;

    /// Name other elements use to depend on this one.
    fn name(&self) -> &str;

    /// Declared dependency names, in declaration order.
    fn declared_dependencies(&self) -> &[String];

    /// Scope in which this element's dependency names resolve, and in which
    /// it can itself be found.
    fn scope(&self) -> Scope;

    /// Display label for diagnostics and cycle paths.
    fn label(&self) -> String;
}

impl Dependent for Unit {
    const KIND: &'static str = "unit";

    fn name(&self) -> &str {
        &self.id.name
    }

    fn declared_dependencies(&self) -> &[String] {
        &self.depends_on
    }

    fn scope(&self) -> Scope {
        Scope::SameGroup(self.id.group.clone())
    }

    fn label(&self) -> String {
        self.id.to_string()
    }
}

impl Dependent for Group {
    const KIND: &'static str = "group";

    fn name(&self) -> &str {
        &self.name
    }

    fn declared_dependencies(&self) -> &[String] {
        &self.depends_on
    }

    fn scope(&self) -> Scope {
        Scope::Global
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

// ---------------------------------------------------------------------------
// BuiltGraph
// ---------------------------------------------------------------------------

/// A populated graph plus the issues found while resolving names.
#[derive(Debug)]
pub struct BuiltGraph<T, P>
where
    P: IdentityPolicy<T>,
{
    pub graph: DirectedGraph<T, P>,
    pub issues: Vec<Issue>,
}

/// Build a dependency graph over `universe`, comparing nodes through `policy`.
///
/// Every element becomes a node, including elements with no dependencies.
///
/// # Errors
///
/// Returns [`OrderError::AmbiguousDependency`] as soon as a dependency name
/// matches more than one element in scope.
#[instrument(skip_all, fields(kind = T::KIND, universe = universe.len()))]
pub fn build_graph<T, P>(universe: &[T], policy: P) -> Result<BuiltGraph<T, P>, OrderError>
where
    T: Dependent,
    P: IdentityPolicy<T>,
{
    // (scope, name) → every element answering to that name in that scope.
    let mut by_name: HashMap<(Scope, &str), Vec<&T>> = HashMap::with_capacity(universe.len());
    for element in universe {
        by_name
            .entry((element.scope(), element.name()))
            .or_default()
            .push(element);
    }

    let mut graph = DirectedGraph::with_policy(policy);
    let mut issues = Vec::new();

    for element in universe {
        graph.add_node(element.clone());

        let scope = element.scope();
        for dependency in element.declared_dependencies() {
            let candidates = by_name
                .get(&(scope.clone(), dependency.as_str()))
                .map_or(&[][..], Vec::as_slice);

            match candidates {
                [] => {
                    let issue = Issue::missing_dependency(T::KIND, dependency, &element.label());
                    warn!(%issue, "unresolved dependency");
                    issues.push(issue);
                }
                [target] => {
                    debug!(from = %element.label(), to = %target.label(), "dependency edge");
                    graph.add_edge(element.clone(), (*target).clone());
                }
                many => {
                    return Err(OrderError::AmbiguousDependency {
                        name: dependency.clone(),
                        scope: scope.to_string(),
                        count: many.len(),
                    });
                }
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        issues = issues.len(),
        "graph built"
    );

    Ok(BuiltGraph { graph, issues })
}

/// Build the unit graph. Dependency names resolve within the unit's group.
///
/// # Errors
///
/// See [`build_graph`].
pub fn build_unit_graph(units: &[Unit]) -> Result<BuiltGraph<Unit, UnitIdentity>, OrderError> {
    build_graph(units, UnitIdentity)
}

/// Build the group graph and flag groups that take part in an edge without
/// being serialized.
///
/// # Errors
///
/// See [`build_graph`].
pub fn build_group_graph(
    groups: &[Group],
) -> Result<BuiltGraph<Group, GroupIdentity>, OrderError> {
    let mut built = build_graph(groups, GroupIdentity)?;

    let unserialized: BTreeSet<String> = built
        .graph
        .edges()
        .into_iter()
        .flat_map(|(from, to)| [from, to])
        .filter(|group| !group.serialized)
        .map(|group| group.name.clone())
        .collect();

    for name in unserialized {
        let issue = Issue::unserialized_group(&name);
        warn!(%issue, "unserialized group in dependency edge");
        built.issues.push(issue);
    }

    Ok(built)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
