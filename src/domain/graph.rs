//! Dependency graph model for tasks
//!
//! Turns a flat task list and dependency edge list into an adjacency model.
//! Uses petgraph as the node arena: node indices follow the order in which
//! tasks are first seen, and an edge `d -> n` means "`n` depends on `d`".
//!
//! The builder is lenient. Edges naming unknown tasks, self-loops and
//! duplicates are dropped silently because the task store may be mid-edit.
//! Cycles are left in place; [`super::cycle::detect`] reports them.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use super::id::TaskId;
use super::task::{DependencyEdge, DependencyType, Task};

/// Failure of a graph query
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphError {
    #[error("Dependency cycle detected: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<TaskId> },
}

impl GraphError {
    /// Returns the offending cycle, in dependency order
    pub fn cycle(&self) -> &[TaskId] {
        match self {
            GraphError::CycleDetected { cycle } => cycle,
        }
    }
}

/// Rejection of a proposed dependency by the write path
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DependencyError {
    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Adding dependency would create a cycle: {}", format_cycle(.cycle))]
    WouldCreateCycle { cycle: Vec<TaskId> },
}

/// Formats a cycle as `a -> b -> c -> a`
pub(crate) fn format_cycle(cycle: &[TaskId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(TaskId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Adjacency model derived from one set of tasks and edges
#[derive(Debug, Default, Clone)]
pub struct GraphModel {
    /// Edges point from a dependency to the task that depends on it
    graph: DiGraph<TaskId, DependencyType>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,
}

impl GraphModel {
    /// Builds the model from tasks and edges
    ///
    /// Every task becomes a node, so isolated tasks are well formed. The
    /// first occurrence of a duplicated task ID wins.
    pub fn build(tasks: &[Task], edges: &[DependencyEdge]) -> Self {
        let mut model = Self {
            graph: DiGraph::with_capacity(tasks.len(), edges.len()),
            node_map: HashMap::with_capacity(tasks.len()),
        };

        for task in tasks {
            if !model.node_map.contains_key(&task.id) {
                let idx = model.graph.add_node(task.id.clone());
                model.node_map.insert(task.id.clone(), idx);
            }
        }

        let mut dropped = 0usize;
        for edge in edges {
            if !model.insert_edge(edge) {
                dropped += 1;
            }
        }

        debug!(
            tasks = model.graph.node_count(),
            edges = model.graph.edge_count(),
            dropped,
            "built dependency graph"
        );

        model
    }

    /// Adds one edge if both ends exist, differ, and the pair is new
    fn insert_edge(&mut self, edge: &DependencyEdge) -> bool {
        if edge.is_self_loop() {
            trace!(task = %edge.task_id, "dropping self-dependency");
            return false;
        }

        let (Some(&task_idx), Some(&dep_idx)) = (
            self.node_map.get(&edge.task_id),
            self.node_map.get(&edge.depends_on_task_id),
        ) else {
            trace!(
                task = %edge.task_id,
                depends_on = %edge.depends_on_task_id,
                "dropping edge with unknown task"
            );
            return false;
        };

        if self.graph.find_edge(dep_idx, task_idx).is_some() {
            return false;
        }

        self.graph.add_edge(dep_idx, task_idx, edge.dependency_type);
        true
    }

    /// Returns the node index of a task
    pub fn index_of(&self, task_id: &TaskId) -> Option<NodeIndex> {
        self.node_map.get(task_id).copied()
    }

    /// Returns the task ID stored at a node
    pub fn task_id(&self, idx: NodeIndex) -> &TaskId {
        &self.graph[idx]
    }

    /// Node indices in task input order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Tasks that `idx` depends on, in task input order
    pub fn depends_on(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(idx, Direction::Incoming)
    }

    /// Tasks that depend on `idx`, in task input order
    pub fn blocks(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(idx, Direction::Outgoing)
    }

    fn neighbors_sorted(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<_> = self.graph.neighbors_directed(idx, dir).collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Number of dependencies of `idx`
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors_directed(idx, Direction::Incoming).count()
    }

    /// Returns the direct dependencies of a task
    pub fn dependencies(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.index_of(task_id)
            .map(|idx| self.ids(&self.depends_on(idx)))
            .unwrap_or_default()
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.index_of(task_id)
            .map(|idx| self.ids(&self.blocks(idx)))
            .unwrap_or_default()
    }

    /// Maps node indices to task IDs
    pub fn ids(&self, indices: &[NodeIndex]) -> Vec<TaskId> {
        indices.iter().map(|&idx| self.graph[idx].clone()).collect()
    }

    /// Surviving edges as `(dependency, dependent, type)`, in first-seen order
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, DependencyType)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the number of surviving edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Underlying petgraph graph
    pub fn graph(&self) -> &DiGraph<TaskId, DependencyType> {
        &self.graph
    }
}

/// Checks whether `task` may start depending on `depends_on`
///
/// This is the strict counterpart of [`GraphModel::build`], used before an
/// edge is persisted. An edge that is already present is accepted.
pub fn validate_new_dependency(
    tasks: &[Task],
    edges: &[DependencyEdge],
    task: &TaskId,
    depends_on: &TaskId,
) -> Result<(), DependencyError> {
    if task == depends_on {
        return Err(DependencyError::SelfDependency(task.clone()));
    }

    for id in [task, depends_on] {
        if !tasks.iter().any(|t| &t.id == id) {
            return Err(DependencyError::TaskNotFound(id.clone()));
        }
    }

    let mut proposed = edges.to_vec();
    proposed.push(DependencyEdge::new(task.clone(), depends_on.clone()));

    let model = GraphModel::build(tasks, &proposed);
    match super::cycle::detect(&model).into_result() {
        Ok(()) => Ok(()),
        Err(GraphError::CycleDetected { cycle }) => Err(DependencyError::WouldCreateCycle { cycle }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter().map(|s| Task::new(id(s))).collect()
    }

    fn edge(task: &str, depends_on: &str) -> DependencyEdge {
        DependencyEdge::new(id(task), id(depends_on))
    }

    #[test]
    fn empty_graph() {
        let graph = GraphModel::build(&[], &[]);
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn isolated_tasks_are_nodes() {
        let graph = GraphModel::build(&tasks(&["a", "b"]), &[]);

        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&id("a")));
        assert!(graph.contains(&id("b")));
        assert!(graph.dependencies(&id("a")).is_empty());
        assert!(graph.dependents(&id("b")).is_empty());
    }

    #[test]
    fn add_dependency() {
        let graph = GraphModel::build(&tasks(&["a", "b"]), &[edge("b", "a")]);

        assert_eq!(graph.dependencies(&id("b")), vec![id("a")]);
        assert_eq!(graph.dependents(&id("a")), vec![id("b")]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn unknown_references_are_dropped() {
        let graph = GraphModel::build(
            &tasks(&["a", "b"]),
            &[edge("b", "a"), edge("b", "ghost"), edge("ghost", "a")],
        );

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies(&id("b")), vec![id("a")]);
        assert_eq!(graph.dependents(&id("a")), vec![id("b")]);
    }

    #[test]
    fn self_dependency_dropped() {
        let graph = GraphModel::build(&tasks(&["a"]), &[edge("a", "a")]);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.dependencies(&id("a")).is_empty());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let graph = GraphModel::build(
            &tasks(&["a", "b"]),
            &[
                edge("b", "a"),
                edge("b", "a").with_type(DependencyType::Related),
            ],
        );

        assert_eq!(graph.edge_count(), 1);
        let (_, _, kind) = graph.edges().next().unwrap();
        assert_eq!(kind, DependencyType::Blocks);
    }

    #[test]
    fn duplicate_task_ids_keep_first() {
        let graph = GraphModel::build(&tasks(&["a", "b", "a"]), &[]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.index_of(&id("a")).map(|i| i.index()), Some(0));
    }

    #[test]
    fn neighbors_follow_task_order() {
        let graph = GraphModel::build(
            &tasks(&["a", "b", "c", "d"]),
            &[edge("d", "c"), edge("d", "a"), edge("d", "b")],
        );

        assert_eq!(graph.dependencies(&id("d")), vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn edges_in_first_seen_order() {
        let graph = GraphModel::build(
            &tasks(&["a", "b", "c"]),
            &[edge("c", "b"), edge("b", "a")],
        );

        let pairs: Vec<_> = graph
            .edges()
            .map(|(from, to, _)| (graph.task_id(from).clone(), graph.task_id(to).clone()))
            .collect();
        assert_eq!(pairs, vec![(id("b"), id("c")), (id("a"), id("b"))]);
    }

    #[test]
    fn cycles_are_kept_for_detection() {
        let graph = GraphModel::build(
            &tasks(&["a", "b"]),
            &[edge("b", "a"), edge("a", "b")],
        );
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn validate_rejects_self_dependency() {
        let result = validate_new_dependency(&tasks(&["a"]), &[], &id("a"), &id("a"));
        assert_eq!(result, Err(DependencyError::SelfDependency(id("a"))));
    }

    #[test]
    fn validate_rejects_unknown_task() {
        let result = validate_new_dependency(&tasks(&["a"]), &[], &id("a"), &id("b"));
        assert_eq!(result, Err(DependencyError::TaskNotFound(id("b"))));
    }

    #[test]
    fn validate_rejects_cycle() {
        let result = validate_new_dependency(
            &tasks(&["a", "b", "c"]),
            &[edge("b", "a"), edge("c", "b")],
            &id("a"),
            &id("c"),
        );

        match result {
            Err(DependencyError::WouldCreateCycle { cycle }) => {
                assert_eq!(cycle.len(), 3);
                for t in ["a", "b", "c"] {
                    assert!(cycle.contains(&id(t)));
                }
            }
            other => panic!("expected cycle rejection, got {:?}", other),
        }
    }

    #[test]
    fn validate_accepts_new_edge() {
        let result = validate_new_dependency(
            &tasks(&["a", "b", "c"]),
            &[edge("b", "a")],
            &id("c"),
            &id("b"),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn format_cycle_closes_loop() {
        assert_eq!(format_cycle(&[id("a"), id("b")]), "a -> b -> a");
        assert_eq!(format_cycle(&[]), "");
    }
}
