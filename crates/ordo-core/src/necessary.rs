//! Minimal closure of a partial run request.
//!
//! When a host runs only some units, every prerequisite of those units has to
//! run too or the requested units would be skipped for lack of results. The
//! necessary set is the requested units plus everything they transitively
//! depend on, in first-seen order without duplicates.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::builder::Dependent;
use crate::graph::DirectedGraph;
use crate::identity::{GroupIdentity, IdentityPolicy, UnitIdentity};
use crate::issue::Issue;
use crate::model::{Group, Unit};

/// Requested elements plus their prerequisites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NecessarySet<T> {
    members: Vec<T>,
    requested: usize,
    /// Requests that could not be resolved against the graph.
    pub issues: Vec<Issue>,
}

impl<T> NecessarySet<T> {
    /// Members in first-seen order.
    #[must_use]
    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct elements that were requested.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Number of prerequisites pulled in beyond the request.
    #[must_use]
    pub fn extra(&self) -> usize {
        self.members.len().saturating_sub(self.requested)
    }

    #[must_use]
    pub fn into_members(self) -> Vec<T> {
        self.members
    }
}

impl<'a, T> IntoIterator for &'a NecessarySet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Accumulates members by identity key while preserving first-seen order.
struct Closure<'g, T, P>
where
    P: IdentityPolicy<T>,
{
    graph: &'g DirectedGraph<T, P>,
    seen: HashSet<P::Key>,
    members: Vec<T>,
    issues: Vec<Issue>,
}

impl<'g, T, P> Closure<'g, T, P>
where
    T: Dependent,
    P: IdentityPolicy<T>,
{
    fn new(graph: &'g DirectedGraph<T, P>) -> Self {
        Self {
            graph,
            seen: HashSet::new(),
            members: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn push(&mut self, node: T) {
        if self.seen.insert(self.graph.key_of(&node)) {
            self.members.push(node);
        }
    }

    /// Add `node` and its prerequisites, or `node` alone with an issue when
    /// the graph has never heard of it.
    fn extend_from(&mut self, node: &T) {
        if self.graph.contains_node(node) {
            for member in self.graph.sub_tree(node) {
                self.push(member);
            }
        } else {
            let issue = Issue::undiscovered(T::KIND, &node.label());
            warn!(%issue, "requested element not in graph");
            self.issues.push(issue);
            self.push(node.clone());
        }
    }

    fn finish(self, requested: usize) -> NecessarySet<T> {
        let set = NecessarySet {
            members: self.members,
            requested,
            issues: self.issues,
        };
        if set.extra() > 0 {
            info!(
                requested = set.requested(),
                scheduled = set.len(),
                "{} were requested, {} will be executed",
                set.requested(),
                set.len()
            );
        }
        set
    }
}

fn distinct<T, P>(graph: &DirectedGraph<T, P>, requested: &[T]) -> usize
where
    P: IdentityPolicy<T>,
{
    requested
        .iter()
        .map(|node| graph.key_of(node))
        .collect::<HashSet<_>>()
        .len()
}

/// Requested nodes plus every node they transitively depend on.
#[must_use]
pub fn resolve<T, P>(graph: &DirectedGraph<T, P>, requested: &[T]) -> NecessarySet<T>
where
    T: Dependent,
    P: IdentityPolicy<T>,
{
    let mut closure = Closure::new(graph);
    for node in requested {
        closure.extend_from(node);
    }
    closure.finish(distinct(graph, requested))
}

/// Like [`resolve`], but also bridges through the group graph.
///
/// For every requested unit, every unit of its own group and of the groups
/// its group transitively depends on is pulled in as well.
#[must_use]
pub fn resolve_with_groups(
    unit_graph: &DirectedGraph<Unit, UnitIdentity>,
    group_graph: &DirectedGraph<Group, GroupIdentity>,
    units: &[Unit],
    requested: &[Unit],
) -> NecessarySet<Unit> {
    let mut closure = Closure::new(unit_graph);
    let mut expanded: HashSet<String> = HashSet::new();

    for unit in requested {
        closure.extend_from(unit);

        let own = Group::new(unit.group());
        if !group_graph.contains_node(&own) {
            let issue = Issue::undiscovered(Group::KIND, unit.group());
            warn!(%issue, "requested unit's group not in group graph");
            closure.issues.push(issue);
            continue;
        }

        for group in group_graph.sub_tree(&own) {
            if !expanded.insert(group.name.clone()) {
                continue;
            }
            for member in units.iter().filter(|u| u.group() == group.name) {
                closure.extend_from(member);
            }
        }
    }

    closure.finish(distinct(unit_graph, requested))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
