//! Task CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Task, TaskId, TaskStatus};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskgraph task add design --hours 4
    ///   taskgraph task add review --status blocked
    Add {
        /// Task ID
        id: String,

        /// Estimated duration in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Initial status
        #[arg(long, default_value = "pending")]
        status: TaskStatus,
    },

    /// Change a task's status
    Status {
        /// Task ID
        id: String,

        /// New status (pending, in_progress, blocked, testing, completed, failed)
        status: TaskStatus,
    },

    /// Change a task's duration estimate
    Estimate {
        /// Task ID
        id: String,

        /// Estimated duration in hours
        hours: f64,
    },

    /// List tasks
    List,
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add { id, hours, status } => add_task(output, &id, hours, status),
        TaskCommands::Status { id, status } => set_status(output, &id, status),
        TaskCommands::Estimate { id, hours } => set_estimate(output, &id, hours),
        TaskCommands::List => list_tasks(output),
    }
}

fn add_task(output: &Output, id: &str, hours: Option<f64>, status: TaskStatus) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();
    let id: TaskId = id.parse()?;

    if store.get(&id)?.is_some() {
        bail!("Task already exists: {}", id);
    }

    let mut task = Task::new(id).with_status(status);
    task.duration_hours = hours;

    output.verbose_ctx("task", &format!("Writing task to {}", store.path().display()));
    store.upsert(&task)?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Added task {}", task.id));
    }

    Ok(())
}

fn set_status(output: &Output, id: &str, status: TaskStatus) -> Result<()> {
    update_task(output, id, |task| task.status = status)?;
    output.success(&format!("Task {} is now {}", id.trim(), status));
    Ok(())
}

fn set_estimate(output: &Output, id: &str, hours: f64) -> Result<()> {
    if !hours.is_finite() || hours <= 0.0 {
        bail!("Duration must be a positive number of hours, got {}", hours);
    }
    update_task(output, id, |task| task.duration_hours = Some(hours))?;
    output.success(&format!("Task {} estimated at {}h", id.trim(), hours));
    Ok(())
}

fn update_task(output: &Output, id: &str, change: impl FnOnce(&mut Task)) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();
    let id: TaskId = id.parse()?;

    let Some(mut task) = store.get(&id)? else {
        bail!("Task not found: {}", id);
    };

    change(&mut task);
    output.verbose_ctx("task", &format!("Updating task {}", task.id));
    store.upsert(&task)?;
    Ok(())
}

fn list_tasks(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let options = project.schedule_options()?;
    let tasks = project.task_store().read_all()?;

    output.verbose_ctx("task", &format!("Found {} tasks", tasks.len()));

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        println!("{:<24} {:<12} HOURS", "ID", "STATUS");
        println!("{}", "-".repeat(50));
        for task in &tasks {
            let hours = match task.duration_hours {
                Some(h) if h.is_finite() && h > 0.0 => format!("{}", h),
                _ => format!("{} (default)", options.default_duration_hours),
            };
            println!("{:<24} {:<12} {}", task.id, task.status, hours);
        }
    }

    Ok(())
}
