//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{cache_cmd, dep, graph, task};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(author, version, about = "Task dependency graphs and critical-path scheduling")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskgraph project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Manage dependencies between tasks
    #[command(subcommand)]
    Dep(dep::DepCommands),

    /// Show the annotated dependency graph
    Graph {
        /// Recompute even if a cached result matches
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the critical path and project end
    Critical,

    /// Manage the cached annotation
    #[command(subcommand)]
    Cache(cache_cmd::CacheCommands),

    /// Annotate a JSON document of tasks and dependencies (no project needed)
    ///
    /// The document has the shape {"tasks": [...], "dependencies": [...]}.
    /// Use "-" to read from stdin.
    Annotate {
        /// Input file, or "-" for stdin
        input: String,

        /// Override the critical slack tolerance
        #[arg(long)]
        epsilon: Option<f64>,
    },
}

/// Installs the tracing subscriber; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // A subscriber may already be installed when embedded; keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()
            .map(|config| config.global.default_format.into())
            .unwrap_or_default(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("taskgraph starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created project directory at: {}", project.project_dir().display()),
            );
            output.success(&format!(
                "Initialized taskgraph project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, &output)?,
        Commands::Dep(cmd) => dep::run(cmd, &output)?,

        Commands::Graph { no_cache } => {
            output.verbose_ctx("graph", &format!("Annotating graph, cache={}", !no_cache));
            graph::show(&output, !no_cache)?
        }
        Commands::Critical => graph::critical(&output)?,
        Commands::Cache(cmd) => cache_cmd::run(cmd, &output)?,
        Commands::Annotate { input, epsilon } => graph::annotate_file(&output, &input, epsilon)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
