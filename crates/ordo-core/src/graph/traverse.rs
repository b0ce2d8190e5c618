//! Topological ordering and prerequisite closure.
//!
//! Both traversals are iterative so deep dependency chains cannot overflow
//! the call stack.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use super::DirectedGraph;
use crate::identity::IdentityPolicy;

/// One level of an explicit DFS stack: a node and a cursor into its
/// dependency list.
#[derive(Debug)]
pub(super) struct Frame {
    pub node: NodeIndex,
    deps: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    pub fn enter<T, P: IdentityPolicy<T>>(graph: &DirectedGraph<T, P>, node: NodeIndex) -> Self {
        Self {
            node,
            deps: graph.dependency_indices(node),
            cursor: 0,
        }
    }

    /// Next unexplored dependency, advancing the cursor.
    pub fn next_dependency(&mut self) -> Option<NodeIndex> {
        let next = self.deps.get(self.cursor).copied();
        if next.is_some() {
            self.cursor += 1;
        }
        next
    }
}

impl<T, P> DirectedGraph<T, P>
where
    T: Clone,
    P: IdentityPolicy<T>,
{
    /// All nodes ordered so that every node follows everything it depends on.
    ///
    /// Post-order DFS from each unvisited node in insertion order; a node is
    /// emitted once all of its dependencies have been emitted. Only
    /// meaningful on acyclic graphs: call [`DirectedGraph::find_cycle`]
    /// first. On cyclic input it still terminates, with the back edge ignored.
    #[must_use]
    pub fn topological_sort(&self) -> Vec<T> {
        let mut visited: HashSet<NodeIndex> = HashSet::with_capacity(self.node_count());
        let mut order: Vec<NodeIndex> = Vec::with_capacity(self.node_count());
        let mut stack: Vec<Frame> = Vec::new();

        for start in self.indices() {
            if !visited.insert(start) {
                continue;
            }
            stack.push(Frame::enter(self, start));

            while let Some(frame) = stack.last_mut() {
                if let Some(next) = frame.next_dependency() {
                    if visited.insert(next) {
                        stack.push(Frame::enter(self, next));
                    }
                } else {
                    let done = frame.node;
                    stack.pop();
                    order.push(done);
                }
            }
        }

        order
            .into_iter()
            .map(|idx| self.node_at(idx).clone())
            .collect()
    }

    /// `node` plus everything it transitively depends on.
    ///
    /// Pre-order DFS following dependencies in declaration order, so the
    /// first element is `node` itself and each dependency's own closure
    /// comes before the next dependency. Returns an empty list if `node` is
    /// not in the graph.
    #[must_use]
    pub fn sub_tree(&self, node: &T) -> Vec<T> {
        let Some(start) = self.index_of(node) else {
            return Vec::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut reached = vec![start];
        let mut stack = vec![Frame::enter(self, start)];

        while let Some(frame) = stack.last_mut() {
            match frame.next_dependency() {
                Some(next) if visited.insert(next) => {
                    reached.push(next);
                    stack.push(Frame::enter(self, next));
                }
                Some(_) => {}
                None => {
                    stack.pop();
                }
            }
        }

        reached
            .into_iter()
            .map(|idx| self.node_at(idx).clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[&str], node: &str) -> usize {
        order
            .iter()
            .position(|n| *n == node)
            .unwrap_or_else(|| panic!("{node} missing from {order:?}"))
    }

    fn assert_in_order(order: &[&str], first: &str, second: &str) {
        assert!(
            position(order, first) < position(order, second),
            "'{first}' should appear before '{second}' in {order:?}"
        );
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph: DirectedGraph<&str> = DirectedGraph::new();
        graph.add_edge("D", "E");
        graph.add_edge("Y", "D");
        graph.add_edge("X", "D");
        graph.add_edge("Z", "Y");
        graph.add_edge("Z", "X");

        let order = graph.topological_sort();
        assert_eq!(order.len(), 5);

        assert_in_order(&order, "E", "D");
        assert_in_order(&order, "D", "Y");
        assert_in_order(&order, "D", "X");
        assert_in_order(&order, "Y", "Z");
        assert_in_order(&order, "X", "Z");
    }

    #[test]
    fn isolated_nodes_keep_insertion_order() {
        let mut graph: DirectedGraph<&str> = DirectedGraph::new();
        graph.add_node("c");
        graph.add_node("a");
        graph.add_node("b");

        assert_eq!(graph.topological_sort(), vec!["c", "a", "b"]);
    }

    #[test]
    fn sort_is_reproducible() {
        let build = || {
            let mut graph: DirectedGraph<&str> = DirectedGraph::new();
            graph.add_edge("A", "B");
            graph.add_edge("A", "C");
            graph.add_edge("B", "D");
            graph.add_edge("C", "D");
            graph
        };

        assert_eq!(build().topological_sort(), build().topological_sort());
        assert_eq!(build().topological_sort(), vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn sort_terminates_on_cycles() {
        let mut graph: DirectedGraph<&str> = DirectedGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "A");

        assert_eq!(graph.topological_sort().len(), 2);
    }

    #[test]
    fn sub_tree_is_prerequisite_closure() {
        let mut graph: DirectedGraph<&str> = DirectedGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("A", "C");
        graph.add_edge("B", "D");
        graph.add_edge("C", "D");
        graph.add_edge("D", "E");
        graph.add_node("F");

        let sub = graph.sub_tree(&"A");
        assert_eq!(sub[0], "A");
        let mut sorted = sub.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["A", "B", "C", "D", "E"]);

        let mut from_b = graph.sub_tree(&"B");
        from_b.sort_unstable();
        assert_eq!(from_b, vec!["B", "D", "E"]);

        assert_eq!(graph.sub_tree(&"F"), vec!["F"]);
        assert!(graph.sub_tree(&"missing").is_empty());
    }

    #[test]
    fn sub_tree_follows_declaration_order() {
        let mut graph: DirectedGraph<&str> = DirectedGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("A", "C");
        graph.add_edge("B", "D");
        graph.add_edge("C", "D");
        graph.add_edge("D", "E");

        assert_eq!(graph.sub_tree(&"A"), vec!["A", "B", "D", "E", "C"]);
        assert_eq!(graph.sub_tree(&"C"), vec!["C", "D", "E"]);
    }
}
