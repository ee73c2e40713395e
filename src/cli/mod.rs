//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Task records | `task add`, `task status`, `task list` |
//! | Dependency | Edge management | `dep add`, `dep remove`, `dep list` |
//! | Graph | Scheduling queries | `graph`, `critical`, `annotate` |
//! | Cache | Cached annotation | `cache clear` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output; it also raises the tracing
//! level to `debug` unless `RUST_LOG` says otherwise:
//! ```bash
//! taskgraph --verbose graph
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod task;
mod dep;
mod graph;
mod cache_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
