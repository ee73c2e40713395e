//! Dependency edge mutation
//!
//! The scheduling core never changes edges. Adding or removing one is a
//! separate operation that completes (or fails) before the graph is
//! annotated again from the refreshed edge list.

use anyhow::Result;

use super::Project;
use crate::domain::{validate_new_dependency, DependencyEdge, DependencyType, TaskId};

/// Owner of the dependency edge list
pub trait DependencyRepository {
    /// Returns all edges
    fn dependencies(&self) -> Result<Vec<DependencyEdge>>;

    /// Records that `task` depends on `depends_on`, with the given type
    ///
    /// Returns false if the pair was already present. Fails with a
    /// [`crate::domain::DependencyError`] for self-loops, unknown tasks and
    /// edges that would close a cycle.
    fn add_typed_dependency(
        &self,
        task: &TaskId,
        depends_on: &TaskId,
        dependency_type: DependencyType,
    ) -> Result<bool>;

    /// Removes the edge; returns false if it did not exist
    fn remove_dependency(&self, task: &TaskId, depends_on: &TaskId) -> Result<bool>;

    /// Records a blocking dependency
    fn add_dependency(&self, task: &TaskId, depends_on: &TaskId) -> Result<bool> {
        self.add_typed_dependency(task, depends_on, DependencyType::Blocks)
    }
}

impl DependencyRepository for Project {
    fn dependencies(&self) -> Result<Vec<DependencyEdge>> {
        self.dependency_store().read_all()
    }

    fn add_typed_dependency(
        &self,
        task: &TaskId,
        depends_on: &TaskId,
        dependency_type: DependencyType,
    ) -> Result<bool> {
        self.dependency_store().update(|edges| {
            if edges.iter().any(|e| e.same_pair(task, depends_on)) {
                return Ok(false);
            }

            let tasks = self.task_store().read_all()?;
            validate_new_dependency(&tasks, edges, task, depends_on)?;

            edges.push(DependencyEdge::new(task.clone(), depends_on.clone()).with_type(dependency_type));
            Ok(true)
        })
    }

    fn remove_dependency(&self, task: &TaskId, depends_on: &TaskId) -> Result<bool> {
        self.dependency_store().update(|edges| {
            let before = edges.len();
            edges.retain(|e| !e.same_pair(task, depends_on));
            Ok(edges.len() != before)
        })
    }
}
