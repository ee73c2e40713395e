//! Cycle detection over the dependency model
//!
//! Iterative depth-first search with white/gray/black coloring. A gray node
//! is on the current DFS path; reaching one again closes a cycle, and the
//! path from that node to the top of the stack is reported. The search keeps
//! an explicit stack, so deep dependency chains cannot overflow the call
//! stack. Runs in O(V+E) and terminates on any finite input.

use petgraph::graph::NodeIndex;
use tracing::warn;

use super::graph::{GraphError, GraphModel};
use super::id::TaskId;

/// Outcome of a cycle check
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
    Acyclic,
    /// Tasks forming the cycle; each entry is a dependency of the next, and
    /// the last is a dependency of the first
    CycleFound(Vec<TaskId>),
}

impl CycleResult {
    pub fn is_acyclic(&self) -> bool {
        matches!(self, CycleResult::Acyclic)
    }

    pub fn cycle(&self) -> Option<&[TaskId]> {
        match self {
            CycleResult::Acyclic => None,
            CycleResult::CycleFound(path) => Some(path),
        }
    }

    /// Converts to a `Result`, mapping a found cycle to [`GraphError::CycleDetected`]
    pub fn into_result(self) -> Result<(), GraphError> {
        match self {
            CycleResult::Acyclic => Ok(()),
            CycleResult::CycleFound(cycle) => Err(GraphError::CycleDetected { cycle }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the current DFS path
    Gray,
    /// Finished; every path from here has been explored
    Black,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn new(graph: &GraphModel, node: NodeIndex) -> Self {
        Self {
            node,
            successors: graph.blocks(node),
            cursor: 0,
        }
    }
}

/// Checks that the model is a DAG
pub fn detect(graph: &GraphModel) -> CycleResult {
    match find_cycle(graph) {
        None => CycleResult::Acyclic,
        Some(path) => {
            let cycle = graph.ids(&path);
            warn!(cycle = ?cycle, "dependency cycle detected");
            CycleResult::CycleFound(cycle)
        }
    }
}

/// Returns the node indices of the first cycle found, if any
pub(crate) fn find_cycle(graph: &GraphModel) -> Option<Vec<NodeIndex>> {
    let mut color = vec![Color::White; graph.len()];
    let mut stack: Vec<Frame> = Vec::new();

    for start in graph.node_indices() {
        if color[start.index()] != Color::White {
            continue;
        }

        color[start.index()] = Color::Gray;
        stack.push(Frame::new(graph, start));

        while let Some(frame) = stack.last_mut() {
            let Some(&next) = frame.successors.get(frame.cursor) else {
                color[frame.node.index()] = Color::Black;
                stack.pop();
                continue;
            };
            frame.cursor += 1;

            match color[next.index()] {
                Color::White => {
                    color[next.index()] = Color::Gray;
                    stack.push(Frame::new(graph, next));
                }
                Color::Gray => {
                    let from = stack.iter().position(|f| f.node == next)?;
                    return Some(stack[from..].iter().map(|f| f.node).collect());
                }
                Color::Black => {}
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyEdge, Task};

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    fn build(ids: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        let tasks: Vec<_> = ids.iter().map(|s| Task::new(id(s))).collect();
        let edges: Vec<_> = edges
            .iter()
            .map(|(t, d)| DependencyEdge::new(id(t), id(d)))
            .collect();
        GraphModel::build(&tasks, &edges)
    }

    #[test]
    fn empty_graph_is_acyclic() {
        assert!(detect(&build(&[], &[])).is_acyclic());
    }

    #[test]
    fn diamond_is_acyclic() {
        let graph = build(
            &["a", "b", "c", "d"],
            &[("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")],
        );
        assert_eq!(detect(&graph), CycleResult::Acyclic);
    }

    #[test]
    fn two_node_cycle() {
        let graph = build(&["a", "b"], &[("b", "a"), ("a", "b")]);
        let result = detect(&graph);
        assert_eq!(result.cycle(), Some(&[id("a"), id("b")][..]));
    }

    #[test]
    fn three_node_cycle_path_follows_dependencies() {
        // b depends on a, c depends on b, a depends on c
        let graph = build(&["a", "b", "c"], &[("b", "a"), ("c", "b"), ("a", "c")]);

        match detect(&graph) {
            CycleResult::CycleFound(path) => {
                assert_eq!(path, vec![id("a"), id("b"), id("c")]);
            }
            CycleResult::Acyclic => panic!("cycle not found"),
        }
    }

    #[test]
    fn cycle_excludes_acyclic_prefix() {
        // root -> x -> y -> x
        let graph = build(
            &["root", "x", "y"],
            &[("x", "root"), ("y", "x"), ("x", "y")],
        );

        let cycle = detect(&graph).cycle().map(<[TaskId]>::to_vec).unwrap();
        assert_eq!(cycle, vec![id("x"), id("y")]);
    }

    #[test]
    fn cycle_in_second_component() {
        let graph = build(
            &["a", "b", "p", "q"],
            &[("b", "a"), ("q", "p"), ("p", "q")],
        );
        assert!(!detect(&graph).is_acyclic());
    }

    #[test]
    fn into_result_maps_error() {
        let graph = build(&["a", "b"], &[("b", "a"), ("a", "b")]);
        let err = detect(&graph).into_result().unwrap_err();
        assert_eq!(err.cycle().len(), 2);
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("t{}", i)).collect();
        let tasks: Vec<_> = ids.iter().map(|s| Task::new(id(s))).collect();
        let edges: Vec<_> = ids
            .windows(2)
            .map(|w| DependencyEdge::new(id(&w[1]), id(&w[0])))
            .collect();
        let graph = GraphModel::build(&tasks, &edges);

        assert!(detect(&graph).is_acyclic());
    }
}
