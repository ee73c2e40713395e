//! Task and dependency edge models
//!
//! Both are owned by the external task store and read immutably by the
//! scheduling pipeline. Tasks carry just enough to schedule them: an ID,
//! an optional duration estimate and a kanban status.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

use super::id::TaskId;

#[derive(Debug, Error, PartialEq)]
#[error("Unknown task status '{0}' (expected pending, in_progress, blocked, testing, completed or failed)")]
pub struct ParseStatusError(String);

/// Status of a task on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Testing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns true if the task is marked as blocked
    pub fn is_blocked(&self) -> bool {
        matches!(self, TaskStatus::Blocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Testing => "testing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "testing" => Ok(TaskStatus::Testing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A schedulable task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// Estimated duration in hours; missing or non-positive values fall back
    /// to the configured default when scheduling
    #[serde(default, alias = "estimated_hours", skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,

    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    /// Creates a pending task with no duration estimate
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            duration_hours: None,
            status: TaskStatus::Pending,
        }
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration_hours = Some(hours);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the duration to schedule with
    ///
    /// Missing, zero, negative and non-finite estimates are replaced by `default`.
    pub fn duration_or(&self, default: f64) -> f64 {
        match self.duration_hours {
            Some(hours) if hours.is_finite() && hours > 0.0 => hours,
            _ => default,
        }
    }
}

/// Kind of dependency between two tasks
///
/// Every kind constrains scheduling; the kind is carried through to the
/// annotated output for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    Blocks,
    Subtask,
    Related,
}

impl DependencyType {
    pub fn label(&self) -> &'static str {
        match self {
            DependencyType::Blocks => "blocks",
            DependencyType::Subtask => "subtask",
            DependencyType::Related => "related",
        }
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(DependencyType::Blocks),
            "subtask" => Ok(DependencyType::Subtask),
            "related" => Ok(DependencyType::Related),
            other => Err(format!(
                "Unknown dependency type '{}' (expected blocks, subtask or related)",
                other
            )),
        }
    }
}

/// Directed edge: `task_id` cannot start before `depends_on_task_id` finishes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub task_id: TaskId,
    pub depends_on_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: DependencyType,
}

impl DependencyEdge {
    /// Creates a blocking dependency: `task` depends on `depends_on`
    pub fn new(task: TaskId, depends_on: TaskId) -> Self {
        Self {
            task_id: task,
            depends_on_task_id: depends_on,
            dependency_type: DependencyType::Blocks,
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Returns true if this edge says `task` depends on `depends_on`
    pub fn same_pair(&self, task: &TaskId, depends_on: &TaskId) -> bool {
        &self.task_id == task && &self.depends_on_task_id == depends_on
    }

    pub fn is_self_loop(&self) -> bool {
        self.task_id == self.depends_on_task_id
    }
}

/// Edge as written by an external source, before ID validation
#[derive(Deserialize)]
struct RawDependencyEdge {
    task_id: String,
    depends_on_task_id: String,
    #[serde(default)]
    dependency_type: DependencyType,
}

/// Deserializes an edge list, dropping edges whose ends are blank IDs
///
/// A blank reference can never name a task, so it is treated like any
/// other unknown reference instead of failing the whole list. Use with
/// `#[serde(deserialize_with = "lenient_edges")]`.
pub fn lenient_edges<'de, D>(deserializer: D) -> Result<Vec<DependencyEdge>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawDependencyEdge>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .filter_map(|edge| {
            match (
                TaskId::new(&edge.task_id),
                TaskId::new(&edge.depends_on_task_id),
            ) {
                (Ok(task), Ok(depends_on)) => {
                    Some(DependencyEdge::new(task, depends_on).with_type(edge.dependency_type))
                }
                _ => {
                    trace!(
                        task = %edge.task_id,
                        depends_on = %edge.depends_on_task_id,
                        "dropping edge with blank task id"
                    );
                    None
                }
            }
        })
        .collect())
}
