//! Configuration handling for taskgraph
//!
//! Configuration is stored in `.taskgraph/config.toml` (project) and
//! `~/.config/taskgraph/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PROJECT_DIR;
use crate::domain::{ScheduleOptions, DEFAULT_CRITICAL_EPSILON, DEFAULT_DURATION_HOURS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Tolerance under which a task's slack counts as zero
    pub critical_epsilon: f64,

    /// Hours assumed for tasks without an estimate
    pub default_duration_hours: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            critical_epsilon: DEFAULT_CRITICAL_EPSILON,
            default_duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

impl ScheduleConfig {
    /// Validates the settings and converts them for the scheduler
    pub fn to_options(&self) -> Result<ScheduleOptions, ConfigError> {
        if !self.critical_epsilon.is_finite() || self.critical_epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "schedule.critical_epsilon must be a finite number >= 0, got {}",
                self.critical_epsilon
            )));
        }

        if !self.default_duration_hours.is_finite() || self.default_duration_hours <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "schedule.default_duration_hours must be a finite number > 0, got {}",
                self.default_duration_hours
            )));
        }

        Ok(ScheduleOptions {
            critical_epsilon: self.critical_epsilon,
            default_duration_hours: self.default_duration_hours,
        })
    }
}

/// Settings for the annotated-graph cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub schedule: ScheduleConfig,
    pub cache: CacheConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Output format used when `--format` is not given
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskgraph", "taskgraph")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        parse_project_config(&content).context("Failed to parse project config")
    }

    /// Finds the project root by looking for a `.taskgraph/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` looking for a `.taskgraph/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Validated scheduling options for this project
    pub fn schedule_options(&self) -> Result<ScheduleOptions> {
        Ok(self.project.schedule.to_options()?)
    }
}

/// Parses and validates a project config file
pub fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.schedule.to_options()?;
    Ok(config)
}
