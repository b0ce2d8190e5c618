//! Caller-supplied node identity.
//!
//! [`DirectedGraph`](crate::graph::DirectedGraph) never compares nodes
//! directly. It asks an [`IdentityPolicy`] for a key and compares keys, so two
//! structurally equal host objects (or two spellings of the same name) land on
//! the same node.

use std::hash::Hash;

use crate::model::{Group, Unit, UnitId};

/// Maps a node to the key that decides node equality.
pub trait IdentityPolicy<T> {
    type Key: Eq + Hash + Clone;

    fn key(&self, node: &T) -> Self::Key;
}

/// The node is its own key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByValue;

impl<T: Eq + Hash + Clone> IdentityPolicy<T> for ByValue {
    type Key = T;

    fn key(&self, node: &T) -> T {
        node.clone()
    }
}

/// String-like nodes compare ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitive;

impl<T: AsRef<str>> IdentityPolicy<T> for CaseInsensitive {
    type Key = String;

    fn key(&self, node: &T) -> String {
        node.as_ref().to_ascii_lowercase()
    }
}

/// Key derived by an arbitrary function, for host types ordo knows nothing about.
#[derive(Debug, Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<T, K, F> IdentityPolicy<T> for ByKey<F>
where
    F: Fn(&T) -> K,
    K: Eq + Hash + Clone,
{
    type Key = K;

    fn key(&self, node: &T) -> K {
        (self.0)(node)
    }
}

/// Units are equal when group and name match; declared dependencies are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitIdentity;

impl IdentityPolicy<Unit> for UnitIdentity {
    type Key = UnitId;

    fn key(&self, node: &Unit) -> UnitId {
        node.id.clone()
    }
}

/// Groups are equal when their names match.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupIdentity;

impl IdentityPolicy<Group> for GroupIdentity {
    type Key = String;

    fn key(&self, node: &Group) -> String {
        node.name.clone()
    }
}
