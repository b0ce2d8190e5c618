//! Node and edge storage for [`DirectedGraph`].

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::identity::{ByValue, IdentityPolicy};

// ---------------------------------------------------------------------------
// DirectedGraph
// ---------------------------------------------------------------------------

/// A directed "depends on" graph with externally supplied node identity.
///
/// Nodes are stored once per identity key; adding a node whose key already
/// exists keeps the first occurrence. Isolated nodes are retained.
pub struct DirectedGraph<T, P = ByValue>
where
    P: IdentityPolicy<T>,
{
    /// Directed graph: nodes = host values, edges = "depends on".
    graph: DiGraph<T, ()>,
    /// Mapping from identity key to petgraph `NodeIndex`.
    node_map: HashMap<P::Key, NodeIndex>,
    policy: P,
}

impl<T, P> Default for DirectedGraph<T, P>
where
    P: IdentityPolicy<T> + Default,
{
    fn default() -> Self {
        Self::with_policy(P::default())
    }
}

impl<T, P> DirectedGraph<T, P>
where
    P: IdentityPolicy<T> + Default,
{
    /// Creates an empty graph using the policy's default value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T, P> DirectedGraph<T, P>
where
    P: IdentityPolicy<T>,
{
    /// Creates an empty graph that compares nodes through `policy`.
    pub fn with_policy(policy: P) -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            policy,
        }
    }

    /// Adds a node. Returns `false` if a node with the same identity exists.
    pub fn add_node(&mut self, node: T) -> bool {
        let key = self.policy.key(&node);
        if self.node_map.contains_key(&key) {
            return false;
        }
        self.insert_keyed(key, node);
        true
    }

    /// Adds the edge `from → to` ("`from` depends on `to`"), adding either
    /// endpoint that is not yet present.
    ///
    /// Returns `false` if the edge already existed; duplicate edges are not
    /// stored twice.
    pub fn add_edge(&mut self, from: T, to: T) -> bool {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    /// Direct dependencies of `node`, in the order the edges were added.
    ///
    /// Unknown nodes have no neighbors.
    pub fn neighbors(&self, node: &T) -> Vec<&T> {
        self.index_of(node)
            .map(|idx| {
                self.dependency_indices(idx)
                    .into_iter()
                    .map(|dep| self.node_at(dep))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if a node with the same identity as `node` is present.
    pub fn contains_node(&self, node: &T) -> bool {
        self.node_map.contains_key(&self.policy.key(node))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> + '_ {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// All edges as `(dependent, dependency)` pairs.
    pub fn edges(&self) -> Vec<(&T, &T)> {
        self.indices()
            .flat_map(|from| {
                self.dependency_indices(from)
                    .into_iter()
                    .map(move |to| (from, to))
            })
            .map(|(from, to)| (self.node_at(from), self.node_at(to)))
            .collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Identity key of `node` under this graph's policy.
    pub fn key_of(&self, node: &T) -> P::Key {
        self.policy.key(node)
    }

    pub const fn policy(&self) -> &P {
        &self.policy
    }

    // -----------------------------------------------------------------------
    // Index-level helpers shared by the traversal modules
    // -----------------------------------------------------------------------

    pub(crate) fn index_of(&self, node: &T) -> Option<NodeIndex> {
        self.node_map.get(&self.policy.key(node)).copied()
    }

    /// Node indices in insertion order.
    pub(crate) fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub(crate) fn node_at(&self, idx: NodeIndex) -> &T {
        &self.graph[idx]
    }

    /// Outgoing neighbors of `idx` in edge insertion order.
    ///
    /// petgraph walks a node's edge list newest-first, so the collected list
    /// is reversed.
    pub(crate) fn dependency_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        deps.reverse();
        deps
    }

    fn ensure_node(&mut self, node: T) -> NodeIndex {
        let key = self.policy.key(&node);
        match self.node_map.get(&key) {
            Some(idx) => *idx,
            None => self.insert_keyed(key, node),
        }
    }

    fn insert_keyed(&mut self, key: P::Key, node: T) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.node_map.insert(key, idx);
        idx
    }
}

impl<T, P> fmt::Debug for DirectedGraph<T, P>
where
    T: fmt::Debug,
    P: IdentityPolicy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectedGraph")
            .field("nodes", &self.nodes().collect::<Vec<_>>())
            .field("edge_count", &self.graph.edge_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
