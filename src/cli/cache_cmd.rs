//! Graph cache commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Delete the cached annotation; the next query recomputes it
    Clear,
}

pub fn run(cmd: CacheCommands, output: &Output) -> Result<()> {
    match cmd {
        CacheCommands::Clear => clear(output),
    }
}

fn clear(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let cache = project.graph_cache();
    output.verbose_ctx("cache", &format!("Clearing {}", cache.path().display()));

    let removed = cache.clear()?;

    if output.is_json() {
        output.data(&serde_json::json!({ "cleared": removed }));
    } else if removed {
        output.success("Graph cache cleared");
    } else {
        output.success("Graph cache was already empty");
    }

    Ok(())
}
