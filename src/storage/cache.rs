//! Annotated graph cache
//!
//! The scheduling core keeps no state between calls, so memoization is the
//! caller's job. This cache stores the last annotation in
//! `.taskgraph/cache/graph.json`, keyed by the content fingerprint of the
//! tasks and edges plus the schedule options it was computed with. Any
//! mismatch, or an unreadable file, is a miss.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PROJECT_DIR;
use crate::domain::{AnnotatedGraph, ScheduleOptions};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fingerprint: String,
    options: ScheduleOptions,
    computed_at: DateTime<Utc>,
    graph: AnnotatedGraph,
}

/// File-backed cache for the most recent annotation
pub struct GraphCache {
    path: PathBuf,
}

impl GraphCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default cache for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(PROJECT_DIR).join("cache").join("graph.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached graph if it was computed from the same inputs
    pub fn get(&self, fingerprint: &str, options: &ScheduleOptions) -> Option<AnnotatedGraph> {
        let content = fs::read_to_string(&self.path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable graph cache");
                return None;
            }
        };

        if entry.fingerprint != fingerprint || &entry.options != options {
            debug!("graph cache miss");
            return None;
        }

        debug!(computed_at = %entry.computed_at, "graph cache hit");
        Some(entry.graph)
    }

    /// Stores a graph under the given key, replacing any previous entry
    pub fn put(
        &self,
        fingerprint: &str,
        options: &ScheduleOptions,
        graph: &AnnotatedGraph,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            options: *options,
            computed_at: Utc::now(),
            graph: graph.clone(),
        };

        let content = serde_json::to_string(&entry).context("Failed to serialize graph cache")?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write graph cache: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace graph cache: {}", self.path.display()))?;

        Ok(())
    }

    /// Removes the cache file; returns true if one existed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove graph cache: {}", self.path.display()))?;
        Ok(true)
    }
}
