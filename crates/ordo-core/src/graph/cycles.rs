//! Cycle detection with exact path reporting.
//!
//! # Design
//!
//! - **Path, not just existence**: the DFS keeps the current path on an
//!   explicit stack. Meeting a node that is still on that stack closes a
//!   cycle, and the path slice from the node's first occurrence to the top
//!   (closed by repeating the node) is the cycle.
//! - **Query, not failure**: [`DirectedGraph::find_cycle`] only reports. The
//!   orderer decides that a cycle is fatal.
//! - **Deterministic**: roots are tried in insertion order and dependencies in
//!   edge order, so the same declarations always report the same cycle. When
//!   several cycles exist only the first one reached is returned.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use super::DirectedGraph;
use super::traverse::Frame;
use crate::identity::IdentityPolicy;

impl<T, P> DirectedGraph<T, P>
where
    T: Clone,
    P: IdentityPolicy<T>,
{
    /// First cycle found, as a closed path `[A, B, C, A]`.
    ///
    /// Consecutive pairs in the path are edges of the graph. A self-loop is
    /// reported as `[A, A]`. Returns `None` for acyclic graphs.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<T>> {
        self.cycle_indices().map(|path| {
            path.into_iter()
                .map(|idx| self.node_at(idx).clone())
                .collect()
        })
    }

    /// Returns `true` if the graph contains at least one cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.cycle_indices().is_some()
    }

    fn cycle_indices(&self) -> Option<Vec<NodeIndex>> {
        let mut visited: HashSet<NodeIndex> = HashSet::with_capacity(self.node_count());
        // Current DFS path plus each member's position in it for O(1) lookup.
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut on_path: HashMap<NodeIndex, usize> = HashMap::new();
        let mut stack: Vec<Frame> = Vec::new();

        for start in self.indices() {
            if !visited.insert(start) {
                continue;
            }
            on_path.insert(start, path.len());
            path.push(start);
            stack.push(Frame::enter(self, start));

            while let Some(frame) = stack.last_mut() {
                let current = frame.node;
                match frame.next_dependency() {
                    Some(next) => {
                        if let Some(&first) = on_path.get(&next) {
                            let mut cycle = path[first..].to_vec();
                            cycle.push(next);
                            return Some(cycle);
                        }
                        if visited.insert(next) {
                            on_path.insert(next, path.len());
                            path.push(next);
                            stack.push(Frame::enter(self, next));
                        }
                    }
                    None => {
                        stack.pop();
                        path.pop();
                        on_path.remove(&current);
                    }
                }
            }
        }

        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from_edges(edges: &[(&'static str, &'static str)]) -> DirectedGraph<&'static str> {
        let mut graph: DirectedGraph<&'static str> = DirectedGraph::new();
        for &(from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let graph = graph_from_edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        assert_eq!(graph.find_cycle(), None);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn three_node_cycle_reports_full_path() {
        let graph = graph_from_edges(&[("A", "B"), ("B", "C"), ("C", "A")]);
        assert_eq!(graph.find_cycle(), Some(vec!["A", "B", "C", "A"]));
    }

    #[test]
    fn self_loop_is_two_element_path() {
        let graph = graph_from_edges(&[("A", "A")]);
        assert_eq!(graph.find_cycle(), Some(vec!["A", "A"]));
    }

    #[test]
    fn cycle_path_excludes_prefix_outside_loop() {
        // Entry → A → B → C → A: the entry node is on the DFS path but not
        // part of the cycle.
        let graph = graph_from_edges(&[("Entry", "A"), ("A", "B"), ("B", "C"), ("C", "A")]);
        assert_eq!(graph.find_cycle(), Some(vec!["A", "B", "C", "A"]));
    }

    #[test]
    fn mutual_dependency() {
        let graph = graph_from_edges(&[("X", "Y"), ("Y", "X")]);
        assert_eq!(graph.find_cycle(), Some(vec!["X", "Y", "X"]));
    }

    #[test]
    fn first_cycle_in_insertion_order_wins() {
        let graph = graph_from_edges(&[("P", "Q"), ("Q", "P"), ("A", "B"), ("B", "A")]);
        assert_eq!(graph.find_cycle(), Some(vec!["P", "Q", "P"]));
    }

    #[test]
    fn diamond_revisit_is_not_a_cycle() {
        // D is reached twice but never while on the path.
        let graph = graph_from_edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn consecutive_pairs_are_edges() {
        let graph = graph_from_edges(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("D", "B"),
            ("A", "E"),
        ]);
        let cycle = graph.find_cycle().expect("cycle exists");
        assert_eq!(cycle.first(), cycle.last());
        for pair in cycle.windows(2) {
            assert!(
                graph.neighbors(&pair[0]).contains(&&pair[1]),
                "{} -> {} is not an edge",
                pair[0],
                pair[1]
            );
        }
    }
}
