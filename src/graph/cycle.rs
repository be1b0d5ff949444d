//! Cycle detection.

use super::manager::LicenseGraph;
use super::types::NodeId;
use crate::error::{LicscopeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl LicenseGraph {
    /// Find a dependency cycle.
    ///
    /// Iterative depth-first search over nodes in insertion order. The
    /// returned path starts and ends with the same node, e.g. `[A, B, A]`.
    #[must_use]
    pub fn detect_cycle(&self) -> Option<Vec<NodeId>> {
        let count = self.node_count();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
        for edge in self.edges() {
            if let (Some(from), Some(to)) = (self.node_index(&edge.source), self.node_index(&edge.target)) {
                successors[from].push(to);
            }
        }

        let id_at = |index: usize| self.node_at(index).map(|node| node.id.clone());
        let mut marks = vec![Mark::Unvisited; count];

        for start in 0..count {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnStack;
            // (node, position of the next successor to visit)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let Some(&succ) = successors[node].get(next) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match marks[succ] {
                    Mark::Unvisited => {
                        marks[succ] = Mark::OnStack;
                        stack.push((succ, 0));
                    }
                    Mark::OnStack => {
                        let from = stack.iter().position(|&(n, _)| n == succ).unwrap_or(0);
                        let mut path: Vec<NodeId> =
                            stack[from..].iter().filter_map(|&(n, _)| id_at(n)).collect();
                        path.extend(id_at(succ));
                        return Some(path);
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }

    /// Fail with [`LicscopeError::GraphCycle`] when the graph has a cycle.
    ///
    /// # Errors
    ///
    /// Returns the cycle path as a `GraphCycle` error.
    pub fn ensure_acyclic(&self) -> Result<()> {
        match self.detect_cycle() {
            Some(path) => {
                tracing::error!(
                    "Dependency cycle: {}",
                    path.iter().map(NodeId::as_str).collect::<Vec<_>>().join(" -> ")
                );
                Err(LicscopeError::GraphCycle { path })
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> LicenseGraph {
        let mut graph = LicenseGraph::new();
        for id in nodes {
            graph.add_node(Node::new(*id, NodeKind::Module));
        }
        for (from, to) in edges {
            graph
                .add_edge(&NodeId::new(*from), &NodeId::new(*to), Relation::Depends, "test")
                .unwrap();
        }
        graph
    }

    fn ids(path: &[NodeId]) -> Vec<&str> {
        path.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        assert_eq!(ids(&g.detect_cycle().unwrap()), vec!["A", "B", "A"]);
        assert!(g.ensure_acyclic().unwrap_err().is_cycle());
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&["A"], &[("A", "A")]);
        assert_eq!(ids(&g.detect_cycle().unwrap()), vec!["A", "A"]);
    }

    #[test]
    fn test_cycle_behind_prefix() {
        let g = graph(
            &["root", "A", "B", "C"],
            &[("root", "A"), ("A", "B"), ("B", "C"), ("C", "A")],
        );
        assert_eq!(ids(&g.detect_cycle().unwrap()), vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert!(g.detect_cycle().is_none());
        assert!(g.ensure_acyclic().is_ok());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let names: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut g = LicenseGraph::new();
        for name in &names {
            g.add_node(Node::new(name.as_str(), NodeKind::Library));
        }
        for pair in names.windows(2) {
            g.add_edge(&NodeId::new(&pair[0]), &NodeId::new(&pair[1]), Relation::Depends, "t")
                .unwrap();
        }
        assert!(g.detect_cycle().is_none());
    }
}
