//! taskgraph - task dependency graphs and critical-path scheduling
//!
//! Given a kanban board's tasks and their "depends-on" edges, taskgraph
//! computes earliest/latest start times, slack, the critical path and a
//! layout level for every task. The [`domain`] layer is a pure library;
//! [`storage`] and [`cli`] wrap it in a small file-backed tool.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    annotate, annotate_with, AnnotatedGraph, DependencyEdge, GraphError, ScheduleOptions, Task,
    TaskId, TaskStatus,
};
