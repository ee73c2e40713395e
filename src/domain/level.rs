//! Level assignment for graph layout
//!
//! A task's level is the length of the longest dependency chain leading to
//! it: roots sit at level 0 and every task sits one past its deepest
//! dependency. Renderers use levels to group tasks into columns.

use petgraph::graph::NodeIndex;

use super::graph::{GraphError, GraphModel};
use super::schedule::topological_order;

/// Level per graph node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels(Vec<usize>);

impl Levels {
    pub fn level(&self, idx: NodeIndex) -> usize {
        self.0[idx.index()]
    }

    /// Number of distinct columns (highest level + 1), 0 for an empty graph
    pub fn depth(&self) -> usize {
        self.0.iter().max().map_or(0, |max| max + 1)
    }
}

/// Computes levels for every task
pub fn assign_levels(graph: &GraphModel) -> Result<Levels, GraphError> {
    let order = topological_order(graph)?;
    Ok(levels_in_order(graph, &order))
}

pub(crate) fn levels_in_order(graph: &GraphModel, order: &[NodeIndex]) -> Levels {
    let mut levels = vec![0usize; graph.len()];
    for &idx in order {
        levels[idx.index()] = graph
            .depends_on(idx)
            .iter()
            .map(|d| levels[d.index()] + 1)
            .max()
            .unwrap_or(0);
    }
    Levels(levels)
}
