//! Dependency CLI commands
//!
//! Each mutation is written first and the graph is re-annotated from the
//! stored edge list afterwards.

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{DependencyType, TaskId};
use crate::storage::{DependencyRepository, Project};

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a dependency: TASK cannot start before DEPENDS_ON finishes
    Add {
        /// Task that will wait
        task: String,

        /// Task that must be completed first
        depends_on: String,

        /// Dependency type (blocks, subtask, related)
        #[arg(long = "type", default_value = "blocks")]
        dependency_type: DependencyType,
    },

    /// Remove a dependency
    Remove {
        /// Task that waits
        task: String,

        /// Dependency to remove
        depends_on: String,
    },

    /// List dependencies
    List,
}

pub fn run(cmd: DepCommands, output: &Output) -> Result<()> {
    match cmd {
        DepCommands::Add {
            task,
            depends_on,
            dependency_type,
        } => add_dependency(output, &task, &depends_on, dependency_type),
        DepCommands::Remove { task, depends_on } => remove_dependency(output, &task, &depends_on),
        DepCommands::List => list_dependencies(output),
    }
}

fn add_dependency(
    output: &Output,
    task: &str,
    depends_on: &str,
    dependency_type: DependencyType,
) -> Result<()> {
    let project = Project::open_current()?;
    let task: TaskId = task.parse()?;
    let depends_on: TaskId = depends_on.parse()?;

    let added = project.add_typed_dependency(&task, &depends_on, dependency_type)?;
    if added {
        output.success(&format!("{} now depends on {}", task, depends_on));
    } else {
        output.success(&format!("{} already depends on {}", task, depends_on));
    }

    report_project_end(output, &project)
}

fn remove_dependency(output: &Output, task: &str, depends_on: &str) -> Result<()> {
    let project = Project::open_current()?;
    let task: TaskId = task.parse()?;
    let depends_on: TaskId = depends_on.parse()?;

    if project.remove_dependency(&task, &depends_on)? {
        output.success(&format!("{} no longer depends on {}", task, depends_on));
    } else {
        output.success(&format!("{} did not depend on {}", task, depends_on));
    }

    report_project_end(output, &project)
}

/// Re-annotates after a mutation and reports the new project end
fn report_project_end(output: &Output, project: &Project) -> Result<()> {
    match project.annotated_graph(true)? {
        Ok(graph) => output.verbose_ctx(
            "dep",
            &format!(
                "Project end {}h, critical path: {}",
                graph.project_end,
                join_ids(&graph.critical_path)
            ),
        ),
        Err(e) => output.warn(&e.to_string()),
    }
    Ok(())
}

fn list_dependencies(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let edges = project.dependencies()?;

    if output.is_json() {
        output.data(&edges);
    } else if edges.is_empty() {
        println!("No dependencies.");
    } else {
        println!("{:<24} {:<24} TYPE", "TASK", "DEPENDS ON");
        println!("{}", "-".repeat(60));
        for edge in &edges {
            println!(
                "{:<24} {:<24} {}",
                edge.task_id,
                edge.depends_on_task_id,
                edge.dependency_type.label()
            );
        }
    }

    Ok(())
}

pub(crate) fn join_ids(ids: &[TaskId]) -> String {
    ids.iter().map(TaskId::as_str).collect::<Vec<_>>().join(" -> ")
}
