//! Critical path computation
//!
//! Classic two-pass CPM over a topological order:
//!
//! 1. Forward pass: `earliest(n) = max(earliest(d) + duration(d))` over the
//!    tasks `n` depends on, or 0 for roots.
//! 2. `project_end = max(earliest(n) + duration(n))`.
//! 3. Backward pass: `latest(n) = project_end - duration(n)` for tasks that
//!    block nothing, else `min(latest(b)) - duration(n)` over the tasks `n`
//!    blocks.
//! 4. `slack(n) = latest(n) - earliest(n)`; tasks whose slack is within
//!    [`ScheduleOptions::critical_epsilon`] are critical.
//!
//! Both passes iterate over a precomputed order (Kahn's algorithm), never
//! recursing, so cyclic input is reported instead of looping.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::cycle;
use super::graph::{GraphError, GraphModel};
use super::id::TaskId;

/// Default tolerance for treating a slack as zero
pub const DEFAULT_CRITICAL_EPSILON: f64 = 1e-2;

/// Default duration, in hours, for tasks without a usable estimate
pub const DEFAULT_DURATION_HOURS: f64 = 1.0;

/// Tunables for the scheduling pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// A task is critical when `|slack| <= critical_epsilon`
    pub critical_epsilon: f64,

    /// Duration used for tasks with a missing or non-positive estimate
    pub default_duration_hours: f64,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            critical_epsilon: DEFAULT_CRITICAL_EPSILON,
            default_duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

/// Schedule data for one task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleEntry {
    pub duration: f64,
    pub earliest_start: f64,
    pub latest_start: f64,
    pub slack: f64,
    pub is_critical: bool,
}

/// Result of a CPM run, indexed by graph node
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
    order: Vec<NodeIndex>,
    project_end: f64,
}

impl Schedule {
    /// Schedule data for a node
    pub fn entry(&self, idx: NodeIndex) -> &ScheduleEntry {
        &self.entries[idx.index()]
    }

    /// Finish time of the last task
    pub fn project_end(&self) -> f64 {
        self.project_end
    }

    /// Critical nodes, in topological order
    pub fn critical(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|idx| self.entries[idx.index()].is_critical)
    }

    /// Critical task IDs, in topological order
    pub fn critical_set(&self, graph: &GraphModel) -> Vec<TaskId> {
        self.critical().map(|idx| graph.task_id(idx).clone()).collect()
    }
}

/// Orders nodes so every task comes after all the tasks it depends on
///
/// Kahn's algorithm; ties are broken by task input order. Fails with the
/// offending cycle if the model is not a DAG.
pub fn topological_order(graph: &GraphModel) -> Result<Vec<NodeIndex>, GraphError> {
    let mut in_degree: Vec<usize> = graph.node_indices().map(|idx| graph.in_degree(idx)).collect();

    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(idx) = queue.pop_front() {
        order.push(idx);

        for next in graph.blocks(idx) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != graph.len() {
        let cycle = cycle::find_cycle(graph).unwrap_or_default();
        return Err(GraphError::CycleDetected {
            cycle: graph.ids(&cycle),
        });
    }

    Ok(order)
}

/// Runs CPM over the model
///
/// `durations` maps task IDs to hours; tasks missing from it, or with a
/// non-positive or non-finite duration, use the default from `options`.
pub fn compute(
    graph: &GraphModel,
    durations: &HashMap<TaskId, f64>,
    options: &ScheduleOptions,
) -> Result<Schedule, GraphError> {
    let order = topological_order(graph)?;
    Ok(compute_in_order(graph, durations, options, order))
}

/// Runs both passes over an order produced by [`topological_order`]
pub(crate) fn compute_in_order(
    graph: &GraphModel,
    durations: &HashMap<TaskId, f64>,
    options: &ScheduleOptions,
    order: Vec<NodeIndex>,
) -> Schedule {
    let duration: Vec<f64> = graph
        .node_indices()
        .map(|idx| match durations.get(graph.task_id(idx)) {
            Some(&hours) if hours.is_finite() && hours > 0.0 => hours,
            _ => options.default_duration_hours,
        })
        .collect();

    let mut earliest = vec![0.0_f64; graph.len()];
    for &idx in &order {
        earliest[idx.index()] = graph
            .depends_on(idx)
            .iter()
            .map(|d| earliest[d.index()] + duration[d.index()])
            .fold(0.0, f64::max);
    }

    let project_end = graph
        .node_indices()
        .map(|idx| earliest[idx.index()] + duration[idx.index()])
        .fold(0.0, f64::max);

    let mut latest = vec![0.0_f64; graph.len()];
    for &idx in order.iter().rev() {
        let successors = graph.blocks(idx);
        let finish_by = if successors.is_empty() {
            project_end
        } else {
            successors
                .iter()
                .map(|b| latest[b.index()])
                .fold(f64::INFINITY, f64::min)
        };
        latest[idx.index()] = finish_by - duration[idx.index()];
    }

    let entries: Vec<ScheduleEntry> = graph
        .node_indices()
        .map(|idx| {
            let i = idx.index();
            // Rounding in the backward pass can leave a tiny negative difference
            let slack = (latest[i] - earliest[i]).max(0.0);
            ScheduleEntry {
                duration: duration[i],
                earliest_start: earliest[i],
                latest_start: latest[i],
                slack,
                is_critical: slack <= options.critical_epsilon,
            }
        })
        .collect();

    debug!(
        tasks = entries.len(),
        project_end,
        critical = entries.iter().filter(|e| e.is_critical).count(),
        "computed critical path"
    );

    Schedule {
        entries,
        order,
        project_end,
    }
}
