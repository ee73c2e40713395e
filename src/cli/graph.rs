//! Graph commands (graph, critical, annotate)

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::dep::join_ids;
use super::output::Output;
use crate::domain::{
    annotate_with, lenient_edges, outline, AnnotatedGraph, DependencyEdge, GraphError, GraphOutline,
    ScheduleOptions, Task,
};
use crate::storage::{Project, ScheduleConfig};

/// Input document for `taskgraph annotate`
#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient_edges")]
    dependencies: Vec<DependencyEdge>,
}

/// Show the annotated graph for the current project
pub fn show(output: &Output, use_cache: bool) -> Result<()> {
    let project = Project::open_current()?;
    output.verbose_ctx(
        "graph",
        &format!("Opened project at: {}", project.root().display()),
    );

    match project.annotated_graph(use_cache)? {
        Ok(graph) => print_graph(output, &graph),
        Err(err) => {
            let (tasks, edges) = project.snapshot()?;
            print_degraded(output, &err, &outline(&tasks, &edges));
        }
    }

    Ok(())
}

/// Show only the critical path
pub fn critical(output: &Output) -> Result<()> {
    let project = Project::open_current()?;

    let graph = match project.annotated_graph(true)? {
        Ok(graph) => graph,
        Err(err) => {
            if output.is_json() {
                output.data(&serde_json::json!({ "error": err }));
            } else {
                output.warn(&format!("{}; no critical path available", err));
            }
            return Ok(());
        }
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "critical_path": graph.critical_path,
            "project_end": graph.project_end,
        }));
    } else if graph.critical_path.is_empty() {
        println!("No tasks.");
    } else {
        println!("Critical path: {}", join_ids(&graph.critical_path));
        println!("Project end:   {}h", graph.project_end);
    }

    Ok(())
}

/// Annotate a standalone JSON document
pub fn annotate_file(output: &Output, input: &str, epsilon: Option<f64>) -> Result<()> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read graph from stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    let document: GraphDocument =
        serde_json::from_str(&content).context("Failed to parse graph document")?;
    output.verbose_ctx(
        "annotate",
        &format!(
            "Read {} tasks and {} dependencies",
            document.tasks.len(),
            document.dependencies.len()
        ),
    );

    let options = match epsilon {
        Some(critical_epsilon) => ScheduleConfig {
            critical_epsilon,
            ..ScheduleConfig::default()
        }
        .to_options()?,
        None => ScheduleOptions::default(),
    };

    match annotate_with(&document.tasks, &document.dependencies, &options) {
        Ok(graph) => print_graph(output, &graph),
        Err(err) => print_degraded(
            output,
            &err,
            &outline(&document.tasks, &document.dependencies),
        ),
    }

    Ok(())
}

fn print_graph(output: &Output, graph: &AnnotatedGraph) {
    if output.is_json() {
        output.data(graph);
        return;
    }

    if graph.nodes.is_empty() {
        println!("No tasks.");
        return;
    }

    println!(
        "{:<20} {:>5} {:>8} {:>8} {:>8} {:>8}  CRIT",
        "ID", "LEVEL", "HOURS", "EARLY", "LATE", "SLACK"
    );
    println!("{}", "-".repeat(70));
    for node in &graph.nodes {
        println!(
            "{:<20} {:>5} {:>8.2} {:>8.2} {:>8.2} {:>8.2}  {}",
            node.id,
            node.level,
            node.duration_hours,
            node.earliest_start,
            node.latest_start,
            node.slack,
            if node.is_critical { "*" } else { "" }
        );
    }

    if !graph.edges.is_empty() {
        println!();
        println!("Dependencies:");
        for edge in &graph.edges {
            let mut flags = Vec::new();
            if edge.is_critical {
                flags.push("critical");
            }
            if edge.is_blocking {
                flags.push("BLOCKING");
            }
            let suffix = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!(
                "  {} -> {} ({}){}",
                edge.from,
                edge.to,
                edge.dependency_type.label(),
                suffix
            );
        }
    }

    println!();
    println!("Critical path: {}", join_ids(&graph.critical_path));
    println!("Project end:   {}h", graph.project_end);
}

/// Renders the outline after a cycle, without schedule data
fn print_degraded(output: &Output, err: &GraphError, outline: &GraphOutline) {
    output.warn(&format!("{}; showing graph without schedule", err));

    if output.is_json() {
        output.data(&serde_json::json!({
            "error": err,
            "outline": outline,
        }));
        return;
    }

    println!("{:<20} BLOCKED BY", "ID");
    println!("{}", "-".repeat(50));
    for node in &outline.nodes {
        println!("{:<20} {}", node.id, join_ids(&node.blocked_by));
    }
}
