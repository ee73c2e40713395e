//! # Storage Layer
//!
//! File-backed collaborators around the scheduling core. The core only ever
//! sees task and edge lists; everything here is about where those lists live.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.taskgraph/tasks.jsonl` |
//! | Dependencies | JSONL | `.taskgraph/dependencies.jsonl` |
//! | Config | TOML | `.taskgraph/config.toml` |
//! | Graph cache | JSON (auto-regenerated) | `.taskgraph/cache/graph.json` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] and [`DependencyStore`] use file locking (`fs2`)
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a taskgraph project
//! - [`DependencyRepository`] - Add/remove edges, validated before writing
//! - [`GraphCache`] - Memoizes the last annotation by content fingerprint
//! - [`Config`] - Project and global configuration

mod jsonl;
mod config;
mod project;
mod repository;
mod cache;

/// Name of the per-project data directory
pub const PROJECT_DIR: &str = ".taskgraph";

pub use jsonl::{DependencyStore, TaskStore};
pub use config::{
    parse_project_config, CacheConfig, Config, ConfigError, GlobalConfig, OutputFormat,
    ProjectConfig, ScheduleConfig,
};
pub use project::{Project, ProjectError};
pub use repository::DependencyRepository;
pub use cache::GraphCache;
