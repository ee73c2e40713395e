//! Domain models for taskgraph
//!
//! Contains the scheduling pipeline without any I/O concerns:
//! graph building, cycle detection, critical path and level assignment,
//! and the [`annotate`] facade that runs them in order.

mod id;
mod task;
mod graph;
mod cycle;
mod schedule;
mod level;
mod annotate;

pub use id::{IdError, TaskId};
pub use task::{lenient_edges, DependencyEdge, DependencyType, ParseStatusError, Task, TaskStatus};
pub use graph::{validate_new_dependency, DependencyError, GraphError, GraphModel};
pub use cycle::{detect, CycleResult};
pub use schedule::{
    compute, topological_order, Schedule, ScheduleEntry, ScheduleOptions,
    DEFAULT_CRITICAL_EPSILON, DEFAULT_DURATION_HOURS,
};
pub use level::{assign_levels, Levels};
pub use annotate::{
    annotate, annotate_with, fingerprint, outline, AnnotatedEdge, AnnotatedGraph, AnnotatedNode,
    GraphOutline, OutlineEdge, OutlineNode,
};
