//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, DependencyStore, GraphCache, TaskStore, PROJECT_DIR};
use crate::domain::{
    annotate_with, fingerprint, AnnotatedGraph, DependencyEdge, GraphError, ScheduleOptions, Task,
};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskgraph project. Run 'taskgraph init' first.")]
    NotInProject,
}

/// A taskgraph project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left untouched, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&project_dir).with_context(|| {
            format!("Failed to create {} directory: {}", PROJECT_DIR, project_dir.display())
        })?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# taskgraph configuration

[schedule]
# Tasks whose slack is within this many hours are on the critical path
critical_epsilon = 0.01

# Duration assumed for tasks without an estimate
default_duration_hours = 1.0

[cache]
enabled = true
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = project_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = "# Regenerated from tasks and dependencies\ncache/\n\n# Update locks\n*.lock\n";
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.taskgraph` directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schedule_options(&self) -> Result<ScheduleOptions> {
        self.config.schedule_options()
    }

    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }

    pub fn dependency_store(&self) -> DependencyStore {
        DependencyStore::for_project(&self.root)
    }

    pub fn graph_cache(&self) -> GraphCache {
        GraphCache::for_project(&self.root)
    }

    /// Loads the current tasks and edges
    pub fn snapshot(&self) -> Result<(Vec<Task>, Vec<DependencyEdge>)> {
        let tasks = self.task_store().read_all()?;
        let edges = self.dependency_store().read_all()?;
        Ok((tasks, edges))
    }

    /// Annotates the current graph, consulting the cache when enabled
    ///
    /// The outer error covers I/O; the inner one is a cycle in the data.
    pub fn annotated_graph(&self, use_cache: bool) -> Result<Result<AnnotatedGraph, GraphError>> {
        let options = self.schedule_options()?;
        let (tasks, edges) = self.snapshot()?;

        let use_cache = use_cache && self.config.project.cache.enabled;
        let cache = self.graph_cache();
        let key = fingerprint(&tasks, &edges);

        if use_cache {
            if let Some(graph) = cache.get(&key, &options) {
                return Ok(Ok(graph));
            }
        }

        let result = annotate_with(&tasks, &edges, &options);

        if use_cache {
            if let Ok(graph) = &result {
                cache.put(&key, &options, graph)?;
            }
        }

        Ok(result)
    }
}
