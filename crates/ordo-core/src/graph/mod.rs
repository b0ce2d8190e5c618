//! Generic directed graph used for both the unit graph and the group graph.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must run (and pass) before A.
//! This is the reverse of a "blocks" graph, so outgoing neighbors are
//! dependencies and reachability from a node is its prerequisite closure.
//!
//! ## Queries
//!
//! ```text
//! DirectedGraph<T, P>
//!   ├─ find_cycle()        first cycle path, [A, B, C, A]
//!   ├─ topological_sort()  dependencies before dependents
//!   └─ sub_tree(n)         n plus everything it transitively depends on
//! ```
//!
//! All queries are read-only and deterministic: traversal roots are visited
//! in node insertion order.

pub mod cycles;
pub mod directed;
pub mod traverse;

pub use directed::DirectedGraph;
