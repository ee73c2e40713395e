//! Graph query facade
//!
//! The single entry point for renderers: takes tasks and edges, runs the
//! whole pipeline (build, cycle check, CPM, levels) and returns a fully
//! annotated graph or a [`GraphError`]. Every call is a pure function of its
//! inputs; no state is retained between calls. Callers that want to skip
//! recomputation can key their own cache on [`fingerprint`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::cycle;
use super::graph::{GraphError, GraphModel};
use super::id::TaskId;
use super::level::levels_in_order;
use super::schedule::{compute_in_order, topological_order, ScheduleOptions};
use super::task::{DependencyEdge, DependencyType, Task, TaskStatus};

/// A task with its schedule and layout annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub id: TaskId,
    pub status: TaskStatus,
    pub duration_hours: f64,
    pub level: usize,
    pub earliest_start: f64,
    pub latest_start: f64,
    pub slack: f64,
    pub is_critical: bool,
    /// Tasks this one depends on
    pub blocked_by: Vec<TaskId>,
    /// Tasks that depend on this one
    pub blocks: Vec<TaskId>,
}

/// A dependency edge, pointing from the dependency to the dependent task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedEdge {
    pub from: TaskId,
    pub to: TaskId,
    pub dependency_type: DependencyType,
    /// Both ends lie on the critical path
    pub is_critical: bool,
    /// The target is blocked and the source is not completed yet
    pub is_blocking: bool,
}

/// Output of [`annotate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedGraph {
    /// One node per task, in task input order
    pub nodes: Vec<AnnotatedNode>,
    /// One edge per distinct surviving dependency, in first-seen order
    pub edges: Vec<AnnotatedEdge>,
    pub project_end: f64,
    /// Critical tasks in topological order
    pub critical_path: Vec<TaskId>,
}

impl AnnotatedGraph {
    pub fn node(&self, id: &TaskId) -> Option<&AnnotatedNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn critical_set(&self) -> HashSet<&TaskId> {
        self.critical_path.iter().collect()
    }

    /// Task IDs grouped by level, one column per level
    pub fn columns(&self) -> Vec<Vec<&TaskId>> {
        let mut by_level: BTreeMap<usize, Vec<&TaskId>> = BTreeMap::new();
        for node in &self.nodes {
            by_level.entry(node.level).or_default().push(&node.id);
        }
        by_level.into_values().collect()
    }
}

/// A node of the degraded view rendered when scheduling is impossible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: TaskId,
    pub status: TaskStatus,
    pub blocked_by: Vec<TaskId>,
    pub blocks: Vec<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEdge {
    pub from: TaskId,
    pub to: TaskId,
    pub dependency_type: DependencyType,
    pub is_blocking: bool,
}

/// Graph structure without schedule or critical-path data
///
/// Always computable, including for cyclic input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOutline {
    pub nodes: Vec<OutlineNode>,
    pub edges: Vec<OutlineEdge>,
}

/// Annotates the graph using default [`ScheduleOptions`]
pub fn annotate(tasks: &[Task], edges: &[DependencyEdge]) -> Result<AnnotatedGraph, GraphError> {
    annotate_with(tasks, edges, &ScheduleOptions::default())
}

/// Annotates the graph
///
/// Unknown references and self-loops are dropped. A dependency cycle is the
/// only failure.
pub fn annotate_with(
    tasks: &[Task],
    edges: &[DependencyEdge],
    options: &ScheduleOptions,
) -> Result<AnnotatedGraph, GraphError> {
    let graph = GraphModel::build(tasks, edges);
    cycle::detect(&graph).into_result()?;

    let order = topological_order(&graph)?;
    let first = first_occurrences(&graph, tasks);

    let durations: HashMap<TaskId, f64> = first
        .iter()
        .map(|task| (task.id.clone(), task.duration_or(options.default_duration_hours)))
        .collect();

    let levels = levels_in_order(&graph, &order);
    let schedule = compute_in_order(&graph, &durations, options, order);

    let nodes: Vec<AnnotatedNode> = graph
        .node_indices()
        .map(|idx| {
            let entry = schedule.entry(idx);
            AnnotatedNode {
                id: graph.task_id(idx).clone(),
                status: first[idx.index()].status,
                duration_hours: entry.duration,
                level: levels.level(idx),
                earliest_start: entry.earliest_start,
                latest_start: entry.latest_start,
                slack: entry.slack,
                is_critical: entry.is_critical,
                blocked_by: graph.ids(&graph.depends_on(idx)),
                blocks: graph.ids(&graph.blocks(idx)),
            }
        })
        .collect();

    let edges: Vec<AnnotatedEdge> = graph
        .edges()
        .map(|(from, to, dependency_type)| AnnotatedEdge {
            from: graph.task_id(from).clone(),
            to: graph.task_id(to).clone(),
            dependency_type,
            is_critical: schedule.entry(from).is_critical && schedule.entry(to).is_critical,
            is_blocking: is_blocking(first[from.index()].status, first[to.index()].status),
        })
        .collect();

    let critical_path = schedule.critical_set(&graph);

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        critical = critical_path.len(),
        "annotated dependency graph"
    );

    Ok(AnnotatedGraph {
        nodes,
        edges,
        project_end: schedule.project_end(),
        critical_path,
    })
}

/// Builds the degraded view: structure and blocking flags only
pub fn outline(tasks: &[Task], edges: &[DependencyEdge]) -> GraphOutline {
    let graph = GraphModel::build(tasks, edges);
    let first = first_occurrences(&graph, tasks);

    let nodes = graph
        .node_indices()
        .map(|idx| OutlineNode {
            id: graph.task_id(idx).clone(),
            status: first[idx.index()].status,
            blocked_by: graph.ids(&graph.depends_on(idx)),
            blocks: graph.ids(&graph.blocks(idx)),
        })
        .collect();

    let edges = graph
        .edges()
        .map(|(from, to, dependency_type)| OutlineEdge {
            from: graph.task_id(from).clone(),
            to: graph.task_id(to).clone(),
            dependency_type,
            is_blocking: is_blocking(first[from.index()].status, first[to.index()].status),
        })
        .collect();

    GraphOutline { nodes, edges }
}

/// Content hash of the inputs, in input order
///
/// Input order decides node order, which duplicate wins and critical-path
/// ties, so reordered inputs hash differently. Two inputs with the same
/// fingerprint annotate identically and the hash is usable as a memoization
/// key.
pub fn fingerprint(tasks: &[Task], edges: &[DependencyEdge]) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(b"tasks\n");
    for t in tasks {
        let duration = t
            .duration_hours
            .map_or_else(|| "-".to_string(), |h| format!("{:016x}", h.to_bits()));
        let line = format!("{}\u{1f}{}\u{1f}{}\n", t.id, duration, t.status);
        hasher.update(line.as_bytes());
    }

    hasher.update(b"edges\n");
    for e in edges {
        let line = format!(
            "{}\u{1f}{}\u{1f}{}\n",
            e.task_id,
            e.depends_on_task_id,
            e.dependency_type.label()
        );
        hasher.update(line.as_bytes());
    }

    hasher.finalize().to_hex().to_string()
}

fn is_blocking(source: TaskStatus, target: TaskStatus) -> bool {
    target.is_blocked() && !source.is_complete()
}

/// The task backing each node, indexed by node
fn first_occurrences<'a>(graph: &GraphModel, tasks: &'a [Task]) -> Vec<&'a Task> {
    let mut slots: Vec<Option<&Task>> = vec![None; graph.len()];
    for task in tasks {
        if let Some(idx) = graph.index_of(&task.id) {
            slots[idx.index()].get_or_insert(task);
        }
    }
    // The graph was built from these tasks, so every slot is filled
    slots.into_iter().flatten().collect()
}
