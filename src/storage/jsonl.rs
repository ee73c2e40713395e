//! JSONL storage for tasks and dependencies
//!
//! Tasks live in `.taskgraph/tasks.jsonl` and dependency edges in
//! `.taskgraph/dependencies.jsonl`, one JSON object per line. File order is
//! preserved because it determines node order in the annotated graph.
//! Uses file locking for concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PROJECT_DIR;
use crate::domain::{DependencyEdge, Task, TaskId};

/// Reads every record from a JSONL file under a shared lock
fn read_records<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {} store: {}", what, path.display()))?;

    // Acquire shared lock for reading
    file.lock_shared()
        .with_context(|| format!("Failed to acquire read lock on {} store", what))?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse {} at line {}", what, line_num + 1))?;

        records.push(record);
    }

    // Lock is released when file is dropped
    Ok(records)
}

/// Rewrites a JSONL file atomically (temp file + rename)
fn write_records<T: Serialize>(path: &Path, records: &[T], what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("jsonl.tmp");

    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock on {} store", what))?;

        let mut writer = BufWriter::new(&file);

        for record in records {
            let line = serde_json::to_string(record)
                .with_context(|| format!("Failed to serialize {}", what))?;
            writeln!(writer, "{}", line).with_context(|| format!("Failed to write {}", what))?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush {} store", what))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Store for task data in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(PROJECT_DIR).join("tasks.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all tasks in file order
    pub fn read_all(&self) -> Result<Vec<Task>> {
        read_records(&self.path, "task")
    }

    /// Writes all tasks to the store (full rewrite)
    pub fn write_all(&self, tasks: &[Task]) -> Result<()> {
        write_records(&self.path, tasks, "task")
    }

    /// Finds a task by ID
    pub fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.read_all()?.into_iter().find(|t| &t.id == id))
    }

    /// Inserts a task, or replaces the task with the same ID in place
    ///
    /// Returns true if the task was new.
    pub fn upsert(&self, task: &Task) -> Result<bool> {
        let mut tasks = self.read_all()?;
        let inserted = match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task.clone();
                false
            }
            None => {
                tasks.push(task.clone());
                true
            }
        };
        self.write_all(&tasks)?;
        Ok(inserted)
    }
}

/// Store for dependency edges in JSONL format
pub struct DependencyStore {
    path: PathBuf,
}

impl DependencyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(PROJECT_DIR).join("dependencies.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all edges in file order
    pub fn read_all(&self) -> Result<Vec<DependencyEdge>> {
        read_records(&self.path, "dependency")
    }

    /// Writes all edges to the store (full rewrite)
    pub fn write_all(&self, edges: &[DependencyEdge]) -> Result<()> {
        write_records(&self.path, edges, "dependency")
    }

    /// Read-modify-write of the edge list under an exclusive lock
    ///
    /// `change` edits the edges and returns true if they should be written.
    /// The lock is taken on a sibling `.lock` file, since writes replace the
    /// data file by rename. Concurrent updates run one after another, so a
    /// check made inside `change` still holds when its result is written.
    pub fn update(
        &self,
        change: impl FnOnce(&mut Vec<DependencyEdge>) -> Result<bool>,
    ) -> Result<bool> {
        let lock_path = self.path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        lock.lock_exclusive()
            .context("Failed to acquire update lock on dependency store")?;

        let mut edges = self.read_all()?;
        let changed = change(&mut edges)?;
        if changed {
            self.write_all(&edges)?;
        }

        // Lock is released when `lock` is dropped
        Ok(changed)
    }
}
